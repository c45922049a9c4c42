use anyhow::Result;
use chrono::{DateTime, Utc};
use freshness::{ConfigManager, MarketCategory, ThresholdCatalog, ThresholdSet};
use std::fmt::Write as _;
use std::io::Write;

use crate::stream::evaluate_line;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Evaluate { signal_json: String },
    Thresholds,
    CheckConfig,
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Command, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let Some(cmd) = args.next() else {
        return Ok(Command::Run);
    };

    match cmd.as_str() {
        "run" => Ok(Command::Run),
        "evaluate" => {
            let signal_json = args
                .next()
                .ok_or_else(|| "usage: evaluator evaluate '<signal json>'".to_string())?;
            Ok(Command::Evaluate { signal_json })
        }
        "thresholds" => Ok(Command::Thresholds),
        "check-config" => Ok(Command::CheckConfig),
        other => Err(format!("unknown command: {other}")),
    }
}

/// Runs a one-shot command. `Run` is handled by the caller.
pub fn run_command<W: Write>(
    manager: &ConfigManager,
    cmd: Command,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<()> {
    match cmd {
        Command::Run => Ok(()),
        Command::Evaluate { signal_json } => {
            let verdict = evaluate_line(manager, &signal_json, now);
            writeln!(out, "{}", serde_json::to_string_pretty(&verdict)?)?;
            match verdict.error {
                Some(error) => anyhow::bail!(error),
                None => Ok(()),
            }
        }
        Command::Thresholds => {
            write!(out, "{}", render_thresholds(&manager.catalog()))?;
            Ok(())
        }
        Command::CheckConfig => {
            let catalog = manager.catalog();
            let configured = MarketCategory::ALL
                .into_iter()
                .filter(|c| catalog.is_configured(*c))
                .count();
            writeln!(out, "config ok: {configured} categories configured")?;
            Ok(())
        }
    }
}

pub fn render_thresholds(catalog: &ThresholdCatalog) -> String {
    let near_close = catalog.near_close();
    let mut s = String::new();
    let _ = writeln!(
        s,
        "{:<15} {:>12} {:>10} {:>16} {:>10}  source",
        "category", "max_age_days", "near_close", "min_transactions", "min_trades"
    );

    let mut row = |label: &str, set: ThresholdSet, source: &str| {
        let _ = writeln!(
            s,
            "{label:<15} {:>12} {:>10} {:>16} {:>10}  {source}",
            set.max_age_days,
            near_close.tighten(set).max_age_days,
            set.min_transactions,
            set.min_trades,
        );
    };

    for category in MarketCategory::ALL {
        let source = if catalog.is_configured(category) {
            "configured"
        } else {
            "default"
        };
        row(category.as_str(), catalog.thresholds_for(Some(category)), source);
    }
    row("(unspecified)", catalog.default_thresholds(), "default");

    let _ = writeln!(
        s,
        "near_close_cutoff_hours={} near_close_ratio={}",
        near_close.cutoff_hours(),
        near_close.ratio()
    );
    s
}
