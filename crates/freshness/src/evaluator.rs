use crate::age::classify_age;
use crate::error::InvalidInputError;
use crate::signal::{check_hours_until_close, WalletSignal};
use crate::thresholds::ThresholdCatalog;
use crate::types::{EvaluationResult, Severity, ThresholdSet};

/// Classifies one wallet signal against `catalog`.
///
/// Deterministic and side-effect free: the only time input is the signal's
/// `hours_until_close`. The only failure is a malformed signal.
pub fn evaluate(
    catalog: &ThresholdCatalog,
    signal: &WalletSignal,
) -> Result<EvaluationResult, InvalidInputError> {
    if let Some(hours) = signal.hours_until_close {
        check_hours_until_close(hours)?;
    }

    let age_category = classify_age(signal.wallet_age_days);
    let applied_thresholds =
        catalog.applied_thresholds(signal.market_category, signal.hours_until_close);

    // Unknown age cannot be proven safe, so it is always fresh.
    let is_fresh = match signal.wallet_age_days {
        None => true,
        Some(days) => days <= applied_thresholds.max_age_days,
    };

    Ok(EvaluationResult {
        is_fresh,
        severity: grade_severity(signal, &applied_thresholds, is_fresh),
        age_category,
        applied_thresholds,
    })
}

/// Severity ladder:
/// - not fresh: `Low` (downstream alerting keys off `is_fresh`)
/// - unknown age: `Critical`
/// - known age within threshold: `High` when neither activity floor is met,
///   `Medium` when exactly one is met, `Low` when both are met
fn grade_severity(signal: &WalletSignal, thresholds: &ThresholdSet, is_fresh: bool) -> Severity {
    if !is_fresh {
        return Severity::Low;
    }
    if signal.wallet_age_days.is_none() {
        return Severity::Critical;
    }
    let floors_met = u8::from(signal.transaction_count >= thresholds.min_transactions)
        + u8::from(signal.polymarket_trade_count >= thresholds.min_trades);
    match floors_met {
        0 => Severity::High,
        1 => Severity::Medium,
        _ => Severity::Low,
    }
}
