use serde::{Deserialize, Serialize};

/// Prediction-market category driving category-specific risk tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketCategory {
    Politics,
    Crypto,
    Sports,
    Business,
    Science,
    Entertainment,
    World,
    Other,
}

impl MarketCategory {
    pub const ALL: [Self; 8] = [
        Self::Politics,
        Self::Crypto,
        Self::Sports,
        Self::Business,
        Self::Science,
        Self::Entertainment,
        Self::World,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Politics => "POLITICS",
            Self::Crypto => "CRYPTO",
            Self::Sports => "SPORTS",
            Self::Business => "BUSINESS",
            Self::Science => "SCIENCE",
            Self::Entertainment => "ENTERTAINMENT",
            Self::World => "WORLD",
            Self::Other => "OTHER",
        }
    }

    /// Parses a category label as it appears in config keys or Gamma market
    /// metadata. Case, surrounding whitespace and `-`/`_`/space separators are
    /// ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "politics" | "elections" => Some(Self::Politics),
            "crypto" | "cryptocurrency" => Some(Self::Crypto),
            "sports" => Some(Self::Sports),
            "business" | "economics" | "finance" => Some(Self::Business),
            "science" | "tech" | "technology" => Some(Self::Science),
            "entertainment" | "popculture" | "culture" => Some(Self::Entertainment),
            "world" | "geopolitics" => Some(Self::World),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Wallet age bucket. Ordered from most to least suspicious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgeCategory {
    New,
    Recent,
    Established,
}

impl AgeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Recent => "RECENT",
            Self::Established => "ESTABLISHED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Risk thresholds for one market category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ThresholdSet {
    /// A wallet at or below this age is a freshness candidate. Always > 0.
    pub max_age_days: u32,
    /// On-chain transaction floor; meeting it grades severity down.
    pub min_transactions: u32,
    /// Platform trade floor; meeting it grades severity down.
    pub min_trades: u32,
}

/// Verdict for one wallet signal. `applied_thresholds` is the set actually
/// compared against, after near-close tightening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EvaluationResult {
    pub is_fresh: bool,
    pub severity: Severity,
    pub age_category: AgeCategory,
    pub applied_thresholds: ThresholdSet,
}
