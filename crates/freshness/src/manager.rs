use std::sync::{Arc, PoisonError, RwLock};

use crate::error::InvalidInputError;
use crate::evaluator::evaluate;
use crate::signal::WalletSignal;
use crate::thresholds::ThresholdCatalog;
use crate::types::EvaluationResult;

/// Entry point for callers: holds the active catalog and evaluates against it.
///
/// The lock only guards the `Arc` pointer. Evaluations clone the pointer and
/// run without the lock, so a replace never tears an in-flight evaluation.
#[derive(Debug)]
pub struct ConfigManager {
    catalog: RwLock<Arc<ThresholdCatalog>>,
}

impl ConfigManager {
    pub fn new(catalog: impl Into<Arc<ThresholdCatalog>>) -> Self {
        Self {
            catalog: RwLock::new(catalog.into()),
        }
    }

    /// Snapshot of the catalog currently in force.
    pub fn catalog(&self) -> Arc<ThresholdCatalog> {
        // The guarded value is a plain pointer, so a poisoned lock still holds a
        // valid catalog.
        Arc::clone(&self.catalog.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn evaluate_wallet(
        &self,
        signal: &WalletSignal,
    ) -> Result<EvaluationResult, InvalidInputError> {
        let catalog = self.catalog();
        evaluate(&catalog, signal)
    }

    /// Swaps in `catalog` and returns the one it replaced.
    pub fn replace_catalog(
        &self,
        catalog: impl Into<Arc<ThresholdCatalog>>,
    ) -> Arc<ThresholdCatalog> {
        let next = catalog.into();
        let default_max_age_days = next.default_thresholds().max_age_days;
        let previous = {
            let mut guard = self
                .catalog
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        tracing::info!(default_max_age_days, "threshold catalog replaced");
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::NearClosePolicy;
    use crate::types::{MarketCategory, ThresholdSet};
    use std::collections::HashMap;

    fn catalog_with_default(max_age_days: u32) -> ThresholdCatalog {
        let default = ThresholdSet {
            max_age_days,
            min_transactions: 5,
            min_trades: 3,
        };
        let mut by_category = HashMap::new();
        by_category.insert(
            MarketCategory::Crypto,
            ThresholdSet {
                max_age_days: 14,
                ..default
            },
        );
        ThresholdCatalog::new(default, by_category, NearClosePolicy::DEFAULT).unwrap()
    }

    fn signal(age: u32) -> WalletSignal {
        WalletSignal {
            wallet_age_days: Some(age),
            ..WalletSignal::default()
        }
    }

    #[test]
    fn test_evaluate_wallet_uses_held_catalog() {
        let manager = ConfigManager::new(catalog_with_default(30));
        let result = manager.evaluate_wallet(&signal(25)).unwrap();
        assert!(result.is_fresh);
        assert_eq!(result.applied_thresholds.max_age_days, 30);
    }

    #[test]
    fn test_replace_catalog_changes_subsequent_verdicts() {
        let manager = ConfigManager::new(catalog_with_default(30));
        assert!(manager.evaluate_wallet(&signal(25)).unwrap().is_fresh);

        let previous = manager.replace_catalog(catalog_with_default(20));
        assert_eq!(previous.default_thresholds().max_age_days, 30);
        assert!(!manager.evaluate_wallet(&signal(25)).unwrap().is_fresh);
    }

    #[test]
    fn test_captured_snapshot_survives_replace() {
        let manager = ConfigManager::new(catalog_with_default(30));
        let snapshot = manager.catalog();
        manager.replace_catalog(catalog_with_default(10));

        let old = evaluate(&snapshot, &signal(25)).unwrap();
        assert!(old.is_fresh);
        assert_eq!(old.applied_thresholds.max_age_days, 30);
        assert_eq!(manager.catalog().default_thresholds().max_age_days, 10);
    }

    #[test]
    fn test_replace_accepts_shared_catalog() {
        let manager = ConfigManager::new(catalog_with_default(30));
        let shared = Arc::new(catalog_with_default(45));
        manager.replace_catalog(Arc::clone(&shared));
        assert!(Arc::ptr_eq(&manager.catalog(), &shared));
    }

    #[test]
    fn test_no_result_caching_between_calls() {
        let manager = ConfigManager::new(catalog_with_default(30));
        let s = signal(25);
        let first = manager.evaluate_wallet(&s).unwrap();
        manager.replace_catalog(catalog_with_default(40));
        let second = manager.evaluate_wallet(&s).unwrap();
        assert_ne!(first, second);
        assert_eq!(second.applied_thresholds.max_age_days, 40);
    }

    #[test]
    fn test_invalid_signal_surfaces_error() {
        let manager = ConfigManager::new(catalog_with_default(30));
        let mut s = signal(5);
        s.hours_until_close = Some(-3.0);
        assert!(manager.evaluate_wallet(&s).is_err());
    }

    #[test]
    fn test_manager_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigManager>();
    }
}
