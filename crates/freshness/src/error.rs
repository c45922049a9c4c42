use thiserror::Error;

/// Raised while building a [`crate::ThresholdCatalog`]. Fatal: the engine must
/// not start with a catalog that failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("freshness.default entry is missing")]
    MissingDefault,

    #[error("{scope}.max_age_days must be > 0 (got {value})")]
    NonPositiveMaxAge { scope: String, value: i64 },

    #[error("{scope}.{field} must be >= 0 (got {value})")]
    NegativeActivityFloor {
        scope: String,
        field: &'static str,
        value: i64,
    },

    #[error("{scope}.{field} exceeds {max} (got {value})")]
    OutOfRange {
        scope: String,
        field: &'static str,
        value: i64,
        max: u32,
    },

    #[error("unknown market category: {0}")]
    UnknownCategory(String),

    #[error("market category {0} is configured more than once")]
    DuplicateCategory(String),

    #[error("near_close_cutoff_hours must be finite and >= 0 (got {0})")]
    InvalidNearCloseCutoff(f64),

    #[error("near_close_ratio must be in (0, 1] (got {0})")]
    InvalidNearCloseRatio(f64),
}

/// A malformed wallet signal. The caller must fix the signal; nothing is
/// clamped or coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("{field} must be >= 0 (got {value})")]
    NegativeValue { field: &'static str, value: i64 },

    #[error("{field} exceeds {max} (got {value})")]
    ValueOutOfRange {
        field: &'static str,
        value: i64,
        max: u32,
    },

    #[error("unknown market category: {0}")]
    UnknownCategory(String),

    #[error("hours_until_close must be finite and >= 0 (got {0})")]
    InvalidHoursUntilClose(f64),
}
