use std::collections::HashMap;

use common::config::{Freshness, ThresholdEntry};

use crate::error::ConfigurationError;
use crate::types::{MarketCategory, ThresholdSet};

/// Relative slack applied before flooring a scaled threshold.
const RATIO_EPSILON: f64 = 1e-12;

/// Step tightening applied when a market is close to resolving: at or below
/// `cutoff_hours`, `max_age_days` is scaled by `ratio`, rounded down, never
/// below 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearClosePolicy {
    cutoff_hours: f64,
    ratio: f64,
}

impl NearClosePolicy {
    pub const DEFAULT: Self = Self {
        cutoff_hours: 24.0,
        ratio: 0.5,
    };

    pub fn new(cutoff_hours: f64, ratio: f64) -> Result<Self, ConfigurationError> {
        if !cutoff_hours.is_finite() || cutoff_hours < 0.0 {
            return Err(ConfigurationError::InvalidNearCloseCutoff(cutoff_hours));
        }
        // Written so that NaN fails the check.
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigurationError::InvalidNearCloseRatio(ratio));
        }
        Ok(Self {
            cutoff_hours,
            ratio,
        })
    }

    pub fn cutoff_hours(&self) -> f64 {
        self.cutoff_hours
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// True when `hours_until_close` is present and at or below the cutoff.
    pub fn applies(&self, hours_until_close: Option<f64>) -> bool {
        matches!(hours_until_close, Some(hours) if hours <= self.cutoff_hours)
    }

    /// Derives the tightened set. Activity floors are carried over unchanged.
    pub fn tighten(&self, base: ThresholdSet) -> ThresholdSet {
        // ratio is in (0, 1], so the scaled value fits back into u32.
        // 100 * 0.29 is 28.999999999999996 in f64.
        let product = f64::from(base.max_age_days) * self.ratio;
        let scaled = (product * (1.0 + RATIO_EPSILON)).floor() as u32;
        ThresholdSet {
            max_age_days: scaled.max(1),
            ..base
        }
    }
}

impl Default for NearClosePolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Immutable category → thresholds table with a mandatory default entry.
///
/// Built once from configuration and shared behind an `Arc`; a reload builds a
/// new catalog instead of mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCatalog {
    default: ThresholdSet,
    by_category: HashMap<MarketCategory, ThresholdSet>,
    near_close: NearClosePolicy,
}

impl ThresholdCatalog {
    pub fn new(
        default: ThresholdSet,
        by_category: HashMap<MarketCategory, ThresholdSet>,
        near_close: NearClosePolicy,
    ) -> Result<Self, ConfigurationError> {
        check_max_age("freshness.default", default.max_age_days)?;
        for (category, set) in &by_category {
            check_max_age(&category_scope(*category), set.max_age_days)?;
        }
        Ok(Self {
            default,
            by_category,
            near_close,
        })
    }

    /// Builds the catalog from the `[freshness]` config section.
    pub fn from_config(cfg: &Freshness) -> Result<Self, ConfigurationError> {
        let near_close = NearClosePolicy::new(cfg.near_close_cutoff_hours, cfg.near_close_ratio)?;
        let default_entry = cfg.default.ok_or(ConfigurationError::MissingDefault)?;
        let default = threshold_set_from_entry("freshness.default", &default_entry)?;

        let mut by_category = HashMap::with_capacity(cfg.categories.len());
        for (label, entry) in &cfg.categories {
            let category = MarketCategory::from_label(label)
                .ok_or_else(|| ConfigurationError::UnknownCategory(label.clone()))?;
            let scope = format!("freshness.categories.{label}");
            let set = threshold_set_from_entry(&scope, entry)?;
            if by_category.insert(category, set).is_some() {
                return Err(ConfigurationError::DuplicateCategory(
                    category.as_str().to_string(),
                ));
            }
        }

        let catalog = Self::new(default, by_category, near_close)?;
        tracing::info!(
            categories = catalog.by_category.len(),
            default_max_age_days = catalog.default.max_age_days,
            near_close_cutoff_hours = near_close.cutoff_hours,
            near_close_ratio = near_close.ratio,
            "threshold catalog built"
        );
        Ok(catalog)
    }

    /// Base thresholds for a category; unspecified or unconfigured categories
    /// get the default entry.
    pub fn thresholds_for(&self, category: Option<MarketCategory>) -> ThresholdSet {
        category
            .and_then(|c| self.by_category.get(&c).copied())
            .unwrap_or(self.default)
    }

    /// Base thresholds with near-close tightening applied.
    pub fn applied_thresholds(
        &self,
        category: Option<MarketCategory>,
        hours_until_close: Option<f64>,
    ) -> ThresholdSet {
        let base = self.thresholds_for(category);
        if self.near_close.applies(hours_until_close) {
            self.near_close.tighten(base)
        } else {
            base
        }
    }

    pub fn default_thresholds(&self) -> ThresholdSet {
        self.default
    }

    pub fn near_close(&self) -> NearClosePolicy {
        self.near_close
    }

    /// Whether the category has its own entry rather than falling back.
    pub fn is_configured(&self, category: MarketCategory) -> bool {
        self.by_category.contains_key(&category)
    }
}

fn category_scope(category: MarketCategory) -> String {
    format!(
        "freshness.categories.{}",
        category.as_str().to_ascii_lowercase()
    )
}

fn check_max_age(scope: &str, max_age_days: u32) -> Result<(), ConfigurationError> {
    if max_age_days == 0 {
        return Err(ConfigurationError::NonPositiveMaxAge {
            scope: scope.to_string(),
            value: 0,
        });
    }
    Ok(())
}

fn threshold_set_from_entry(
    scope: &str,
    entry: &ThresholdEntry,
) -> Result<ThresholdSet, ConfigurationError> {
    if entry.max_age_days <= 0 {
        return Err(ConfigurationError::NonPositiveMaxAge {
            scope: scope.to_string(),
            value: entry.max_age_days,
        });
    }
    Ok(ThresholdSet {
        max_age_days: config_u32(scope, "max_age_days", entry.max_age_days)?,
        min_transactions: config_u32(scope, "min_transactions", entry.min_transactions)?,
        min_trades: config_u32(scope, "min_trades", entry.min_trades)?,
    })
}

fn config_u32(scope: &str, field: &'static str, value: i64) -> Result<u32, ConfigurationError> {
    if value < 0 {
        return Err(ConfigurationError::NegativeActivityFloor {
            scope: scope.to_string(),
            field,
            value,
        });
    }
    u32::try_from(value)
        .ok()
        .ok_or_else(|| ConfigurationError::OutOfRange {
            scope: scope.to_string(),
            field,
            value,
            max: u32::MAX,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::Config;

    fn default_freshness() -> Freshness {
        Config::from_toml_str(include_str!("../../../config/default.toml"))
            .unwrap()
            .freshness
    }

    fn default_catalog() -> ThresholdCatalog {
        ThresholdCatalog::from_config(&default_freshness()).unwrap()
    }

    fn set(max_age_days: u32) -> ThresholdSet {
        ThresholdSet {
            max_age_days,
            min_transactions: 5,
            min_trades: 3,
        }
    }

    #[test]
    fn test_category_lookups() {
        let catalog = default_catalog();
        assert_eq!(
            catalog
                .thresholds_for(Some(MarketCategory::Politics))
                .max_age_days,
            60
        );
        assert_eq!(
            catalog
                .thresholds_for(Some(MarketCategory::Crypto))
                .max_age_days,
            14
        );
        assert_eq!(catalog.thresholds_for(None).max_age_days, 30);
    }

    #[test]
    fn test_unconfigured_category_falls_back_to_default() {
        let catalog = default_catalog();
        assert!(!catalog.is_configured(MarketCategory::Science));
        assert_eq!(
            catalog.thresholds_for(Some(MarketCategory::Science)),
            catalog.default_thresholds()
        );
    }

    #[test]
    fn test_category_floors_come_from_config() {
        let crypto = default_catalog().thresholds_for(Some(MarketCategory::Crypto));
        assert_eq!(crypto.min_transactions, 10);
        assert_eq!(crypto.min_trades, 5);
    }

    #[test]
    fn test_far_from_close_is_unmodified() {
        let catalog = default_catalog();
        assert_eq!(catalog.applied_thresholds(None, Some(48.0)).max_age_days, 30);
    }

    #[test]
    fn test_no_close_time_is_unmodified() {
        let catalog = default_catalog();
        assert_eq!(catalog.applied_thresholds(None, None).max_age_days, 30);
    }

    #[test]
    fn test_near_close_halves_max_age() {
        let catalog = default_catalog();
        assert_eq!(catalog.applied_thresholds(None, Some(12.0)).max_age_days, 15);
        assert_eq!(
            catalog
                .applied_thresholds(Some(MarketCategory::Politics), Some(12.0))
                .max_age_days,
            30
        );
    }

    #[test]
    fn test_near_close_cutoff_is_inclusive() {
        let catalog = default_catalog();
        assert_eq!(catalog.applied_thresholds(None, Some(24.0)).max_age_days, 15);
        assert_eq!(
            catalog.applied_thresholds(None, Some(24.001)).max_age_days,
            30
        );
    }

    #[test]
    fn test_already_closed_market_is_tightened() {
        let catalog = default_catalog();
        assert_eq!(catalog.applied_thresholds(None, Some(0.0)).max_age_days, 15);
    }

    #[test]
    fn test_tighten_rounds_down() {
        let policy = NearClosePolicy::DEFAULT;
        assert_eq!(policy.tighten(set(15)).max_age_days, 7);
        assert_eq!(policy.tighten(set(3)).max_age_days, 1);
    }

    #[test]
    fn test_tighten_inexact_ratio_rounds_down_exactly() {
        let policy = NearClosePolicy::new(24.0, 0.29).unwrap();
        assert_eq!(policy.tighten(set(100)).max_age_days, 29);
        assert_eq!(policy.tighten(set(99)).max_age_days, 28);

        let policy = NearClosePolicy::new(24.0, 0.7).unwrap();
        assert_eq!(policy.tighten(set(10)).max_age_days, 7);
        assert_eq!(policy.tighten(set(9)).max_age_days, 6);

        let policy = NearClosePolicy::new(24.0, 0.57).unwrap();
        assert_eq!(policy.tighten(set(100)).max_age_days, 57);
    }

    #[test]
    fn test_tighten_never_goes_below_one() {
        let policy = NearClosePolicy::new(24.0, 0.1).unwrap();
        assert_eq!(policy.tighten(set(1)).max_age_days, 1);
        assert_eq!(policy.tighten(set(5)).max_age_days, 1);
    }

    #[test]
    fn test_tighten_keeps_activity_floors() {
        let tightened = NearClosePolicy::DEFAULT.tighten(set(30));
        assert_eq!(tightened.min_transactions, 5);
        assert_eq!(tightened.min_trades, 3);
    }

    #[test]
    fn test_ratio_one_is_identity() {
        let policy = NearClosePolicy::new(24.0, 1.0).unwrap();
        assert_eq!(policy.tighten(set(30)), set(30));
    }

    #[test]
    fn test_applied_max_age_is_monotonic_in_hours() {
        let catalog = default_catalog();
        let hours = [0.0, 1.0, 12.0, 23.9, 24.0, 24.1, 48.0, 720.0];
        for category in MarketCategory::ALL {
            for pair in hours.windows(2) {
                let nearer = catalog.applied_thresholds(Some(category), Some(pair[0]));
                let farther = catalog.applied_thresholds(Some(category), Some(pair[1]));
                assert!(nearer.max_age_days <= farther.max_age_days, "{category:?} {pair:?}");
            }
        }
    }

    #[test]
    fn test_missing_default_is_configuration_error() {
        let mut cfg = default_freshness();
        cfg.default = None;
        assert_eq!(
            ThresholdCatalog::from_config(&cfg),
            Err(ConfigurationError::MissingDefault)
        );
    }

    #[test]
    fn test_zero_max_age_is_configuration_error() {
        let mut cfg = default_freshness();
        cfg.categories.get_mut("crypto").unwrap().max_age_days = 0;
        let err = ThresholdCatalog::from_config(&cfg).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NonPositiveMaxAge {
                scope: "freshness.categories.crypto".to_string(),
                value: 0,
            }
        );
    }

    #[test]
    fn test_negative_default_max_age_is_configuration_error() {
        let mut cfg = default_freshness();
        if let Some(default) = cfg.default.as_mut() {
            default.max_age_days = -30;
        }
        let err = ThresholdCatalog::from_config(&cfg).unwrap_err();
        assert!(err
            .to_string()
            .contains("freshness.default.max_age_days must be > 0"));
    }

    #[test]
    fn test_negative_floor_is_configuration_error() {
        let mut cfg = default_freshness();
        cfg.categories.get_mut("politics").unwrap().min_trades = -1;
        let err = ThresholdCatalog::from_config(&cfg).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::NegativeActivityFloor {
                field: "min_trades",
                value: -1,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_max_age_is_configuration_error() {
        let mut cfg = default_freshness();
        cfg.categories.get_mut("sports").unwrap().max_age_days = i64::from(u32::MAX) + 1;
        let err = ThresholdCatalog::from_config(&cfg).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::OutOfRange {
                field: "max_age_days",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_category_label_is_configuration_error() {
        let mut cfg = default_freshness();
        let entry = cfg.categories["politics"];
        cfg.categories.insert("weather".to_string(), entry);
        assert_eq!(
            ThresholdCatalog::from_config(&cfg),
            Err(ConfigurationError::UnknownCategory("weather".to_string()))
        );
    }

    #[test]
    fn test_duplicate_category_label_is_configuration_error() {
        let mut cfg = default_freshness();
        let entry = cfg.categories["politics"];
        cfg.categories.insert("Politics".to_string(), entry);
        assert_eq!(
            ThresholdCatalog::from_config(&cfg),
            Err(ConfigurationError::DuplicateCategory("POLITICS".to_string()))
        );
    }

    #[test]
    fn test_new_rejects_zero_max_age() {
        let mut by_category = HashMap::new();
        by_category.insert(MarketCategory::Sports, set(0));
        let err =
            ThresholdCatalog::new(set(30), by_category, NearClosePolicy::DEFAULT).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NonPositiveMaxAge {
                scope: "freshness.categories.sports".to_string(),
                value: 0,
            }
        );
    }

    #[test]
    fn test_near_close_policy_validation() {
        assert!(NearClosePolicy::new(-1.0, 0.5).is_err());
        assert!(NearClosePolicy::new(f64::INFINITY, 0.5).is_err());
        assert!(NearClosePolicy::new(24.0, 0.0).is_err());
        assert!(NearClosePolicy::new(24.0, 1.5).is_err());
        assert!(NearClosePolicy::new(24.0, f64::NAN).is_err());
        assert!(NearClosePolicy::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn test_invalid_ratio_in_config_is_configuration_error() {
        let mut cfg = default_freshness();
        cfg.near_close_ratio = 2.0;
        assert!(matches!(
            ThresholdCatalog::from_config(&cfg),
            Err(ConfigurationError::InvalidNearCloseRatio(_))
        ));
    }
}
