use anyhow::{Context, Result};
use freshness::{ConfigManager, ThresholdCatalog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Reads the config file off the runtime's worker threads and builds a catalog.
pub async fn load_catalog(path: &Path) -> Result<ThresholdCatalog> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config = common::config::Config::from_toml_str(&contents)?;
    ThresholdCatalog::from_config(&config.freshness)
        .with_context(|| format!("invalid freshness config in {}", path.display()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Replaced,
    Unchanged,
}

/// Re-reads the config file and swaps the catalog if it changed. On error the
/// catalog in force is left untouched.
pub async fn reload_once(manager: &ConfigManager, path: &Path) -> Result<ReloadOutcome> {
    let next = load_catalog(path).await?;
    if *manager.catalog() == next {
        return Ok(ReloadOutcome::Unchanged);
    }
    manager.replace_catalog(next);
    Ok(ReloadOutcome::Replaced)
}

pub fn spawn_reload_loop(
    manager: Arc<ConfigManager>,
    path: PathBuf,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start_at = Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start_at, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match reload_once(&manager, &path).await {
                Ok(ReloadOutcome::Replaced) => {
                    metrics::counter!("freshness_catalog_reloads_total").increment(1);
                    tracing::info!(path = %path.display(), "config reloaded");
                }
                Ok(ReloadOutcome::Unchanged) => {
                    tracing::debug!(path = %path.display(), "config unchanged");
                }
                Err(e) => {
                    metrics::counter!("freshness_catalog_reload_failures_total").increment(1);
                    let detail = format!("{e:#}");
                    tracing::error!(
                        path = %path.display(),
                        error = %detail,
                        "config reload failed; keeping previous catalog"
                    );
                }
            }
        }
    })
}
