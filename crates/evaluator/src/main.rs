use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod metrics;
mod reload;
mod stream;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = cli::parse_args(std::env::args()).map_err(anyhow::Error::msg)?;

    let config_path = PathBuf::from(
        std::env::var("FRESHNESS_CONFIG")
            .unwrap_or_else(|_| common::config::DEFAULT_CONFIG_PATH.to_string()),
    );
    let config = common::config::Config::load_from(&config_path)?;

    let dispatch = common::observability::build_dispatch(&config.general.log_level);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    // A catalog that fails validation must never become usable.
    let catalog = freshness::ThresholdCatalog::from_config(&config.freshness)
        .with_context(|| format!("invalid freshness config in {}", config_path.display()))?;
    let manager = Arc::new(freshness::ConfigManager::new(catalog));

    if cmd != cli::Command::Run {
        let stdout = std::io::stdout();
        return cli::run_command(&manager, cmd, chrono::Utc::now(), &mut stdout.lock());
    }

    if let Some(port) = config.observability.prometheus_port {
        metrics::install_prometheus(port)?;
        tracing::info!(port, "prometheus exporter listening");
    }
    metrics::describe();

    let reload_handle = (config.reload.interval_secs > 0).then(|| {
        reload::spawn_reload_loop(
            Arc::clone(&manager),
            config_path.clone(),
            std::time::Duration::from_secs(config.reload.interval_secs),
        )
    });

    tracing::info!(
        config = %config_path.display(),
        reload_interval_secs = config.reload.interval_secs,
        "fresh-wallet evaluator reading signals from stdin"
    );

    let stats = stream::process_stream(
        &manager,
        tokio::io::BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        chrono::Utc::now,
    )
    .await?;

    tracing::info!(
        evaluated = stats.evaluated,
        fresh = stats.fresh,
        rejected = stats.rejected,
        "input exhausted"
    );

    if let Some(handle) = reload_handle {
        handle.abort();
    }
    Ok(())
}
