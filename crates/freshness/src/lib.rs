//! Fresh-wallet risk classification.
//!
//! Decides whether a wallet's activity on a market looks freshly created and
//! how severe that is, using per-category thresholds that tighten as the
//! market approaches close. Everything here is pure except [`ConfigManager`],
//! which only holds the swappable catalog reference.

pub mod age;
pub mod error;
pub mod evaluator;
pub mod manager;
pub mod signal;
pub mod thresholds;
pub mod types;

pub use age::classify_age;
pub use error::{ConfigurationError, InvalidInputError};
pub use evaluator::evaluate;
pub use manager::ConfigManager;
pub use signal::{RawWalletSignal, WalletSignal};
pub use thresholds::{NearClosePolicy, ThresholdCatalog};
pub use types::{AgeCategory, EvaluationResult, MarketCategory, Severity, ThresholdSet};
