use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub freshness: Freshness,
    #[serde(default)]
    pub reload: Reload,
    #[serde(default)]
    pub observability: Observability,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
}

/// Raw fresh-wallet policy as written in TOML.
///
/// Integers are signed and the default entry is optional so that bad values
/// reach the catalog builder, which reports them with the offending key.
#[derive(Debug, Clone, Deserialize)]
pub struct Freshness {
    pub near_close_cutoff_hours: f64,
    pub near_close_ratio: f64,
    pub default: Option<ThresholdEntry>,
    #[serde(default)]
    pub categories: BTreeMap<String, ThresholdEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ThresholdEntry {
    pub max_age_days: i64,
    #[serde(default)]
    pub min_transactions: i64,
    #[serde(default)]
    pub min_trades: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reload {
    pub interval_secs: u64,
}

impl Default for Reload {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Observability {
    pub prometheus_port: Option<u16>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the sections that have no dedicated builder. Threshold values are
    /// validated when the catalog is constructed from `freshness`.
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.general.log_level.trim().is_empty(),
            "general.log_level must not be empty"
        );
        if let Some(port) = self.observability.prometheus_port {
            anyhow::ensure!(port > 0, "observability.prometheus_port must be > 0");
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
