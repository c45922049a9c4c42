use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::InvalidInputError;
use crate::types::MarketCategory;

/// Already-resolved attributes of one wallet on one market.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WalletSignal {
    /// `None` when the wallet's first on-chain activity could not be found.
    pub wallet_age_days: Option<u32>,
    pub transaction_count: u32,
    pub polymarket_trade_count: u32,
    /// `None` for uncategorized markets.
    pub market_category: Option<MarketCategory>,
    /// `None` when the wallet is not being evaluated near a market close.
    pub hours_until_close: Option<f64>,
}

/// Wire form of a wallet signal, as produced by the data-acquisition side.
///
/// Counts are signed so that upstream bugs producing negative values are
/// reported instead of failing deserialization or being clamped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawWalletSignal {
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub wallet_age_days: Option<i64>,
    pub transaction_count: i64,
    pub polymarket_trade_count: i64,
    #[serde(default)]
    pub market_category: Option<String>,
    #[serde(default)]
    pub hours_until_close: Option<f64>,
    #[serde(default)]
    pub market_end_date: Option<DateTime<Utc>>,
}

impl RawWalletSignal {
    /// Converts to a [`WalletSignal`], deriving `hours_until_close` from
    /// `market_end_date` relative to `now` when no explicit value is given.
    /// A market that has already ended resolves to zero hours.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<WalletSignal, InvalidInputError> {
        let mut signal = WalletSignal::try_from(self)?;
        if signal.hours_until_close.is_none() {
            signal.hours_until_close = self
                .market_end_date
                .map(|end| hours_between(now, end).max(0.0));
        }
        Ok(signal)
    }
}

impl TryFrom<&RawWalletSignal> for WalletSignal {
    type Error = InvalidInputError;

    fn try_from(raw: &RawWalletSignal) -> Result<Self, Self::Error> {
        let wallet_age_days = raw
            .wallet_age_days
            .map(|days| non_negative_u32("wallet_age_days", days))
            .transpose()?;
        let market_category = match raw.market_category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(
                MarketCategory::from_label(label)
                    .ok_or_else(|| InvalidInputError::UnknownCategory(label.to_string()))?,
            ),
        };
        if let Some(hours) = raw.hours_until_close {
            check_hours_until_close(hours)?;
        }
        Ok(Self {
            wallet_age_days,
            transaction_count: non_negative_u32("transaction_count", raw.transaction_count)?,
            polymarket_trade_count: non_negative_u32(
                "polymarket_trade_count",
                raw.polymarket_trade_count,
            )?,
            market_category,
            hours_until_close: raw.hours_until_close,
        })
    }
}

impl TryFrom<RawWalletSignal> for WalletSignal {
    type Error = InvalidInputError;

    fn try_from(raw: RawWalletSignal) -> Result<Self, Self::Error> {
        Self::try_from(&raw)
    }
}

pub(crate) fn check_hours_until_close(hours: f64) -> Result<(), InvalidInputError> {
    if hours.is_finite() && hours >= 0.0 {
        Ok(())
    } else {
        Err(InvalidInputError::InvalidHoursUntilClose(hours))
    }
}

fn non_negative_u32(field: &'static str, value: i64) -> Result<u32, InvalidInputError> {
    if value < 0 {
        return Err(InvalidInputError::NegativeValue { field, value });
    }
    u32::try_from(value)
        .ok()
        .ok_or(InvalidInputError::ValueOutOfRange {
            field,
            value,
            max: u32::MAX,
        })
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}
