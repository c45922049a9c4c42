use anyhow::Result;
use chrono::{DateTime, Utc};
use freshness::{ConfigManager, EvaluationResult, RawWalletSignal};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Longest accepted input record, newline excluded. Longer lines are skipped
/// with an error verdict.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// One output line. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub wallet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub evaluated: u64,
    pub fresh: u64,
    pub rejected: u64,
}

fn rejected_line(error: String) -> Verdict {
    metrics::counter!("freshness_invalid_signals_total").increment(1);
    tracing::warn!(error = %error, "unreadable input line");
    Verdict {
        wallet: None,
        result: None,
        error: Some(error),
    }
}

/// Parses and evaluates one JSON wallet signal. Never fails: bad input becomes
/// an error verdict so that one malformed record cannot stop a stream.
pub fn evaluate_line(manager: &ConfigManager, line: &str, now: DateTime<Utc>) -> Verdict {
    let raw: RawWalletSignal = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => {
            metrics::counter!("freshness_invalid_signals_total").increment(1);
            tracing::warn!(error = %e, "unparseable wallet signal");
            return Verdict {
                wallet: None,
                result: None,
                error: Some(format!("invalid json: {e}")),
            };
        }
    };

    let outcome = raw
        .resolve(now)
        .and_then(|signal| manager.evaluate_wallet(&signal));
    match outcome {
        Ok(result) => {
            metrics::counter!("freshness_evaluations_total", "severity" => result.severity.as_str())
                .increment(1);
            if result.is_fresh {
                metrics::counter!("freshness_fresh_wallets_total").increment(1);
                tracing::debug!(
                    wallet = raw.wallet.as_deref().unwrap_or("-"),
                    severity = result.severity.as_str(),
                    age_category = result.age_category.as_str(),
                    max_age_days = result.applied_thresholds.max_age_days,
                    "fresh wallet"
                );
            }
            Verdict {
                wallet: raw.wallet,
                result: Some(result),
                error: None,
            }
        }
        Err(e) => {
            metrics::counter!("freshness_invalid_signals_total").increment(1);
            tracing::warn!(
                wallet = raw.wallet.as_deref().unwrap_or("-"),
                error = %e,
                "rejected wallet signal"
            );
            Verdict {
                wallet: raw.wallet,
                result: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Consumes input up to and including the next newline, or to EOF.
async fn discard_rest_of_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (consumed, found_newline) = {
            let buf = reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (buf.len(), false),
            }
        };
        reader.consume(consumed);
        if found_newline {
            return Ok(());
        }
    }
}

/// Reads newline-delimited JSON signals from `reader` and writes one JSON
/// verdict per non-blank input line to `writer`. Memory per line is bounded by
/// [`MAX_LINE_BYTES`].
pub async fn process_stream<R, W, C>(
    manager: &ConfigManager,
    mut reader: R,
    mut writer: W,
    clock: C,
) -> Result<StreamStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Fn() -> DateTime<Utc>,
{
    let mut stats = StreamStats::default();
    let mut buf = Vec::with_capacity(1024);
    let limit = u64::try_from(MAX_LINE_BYTES + 1)?;

    loop {
        buf.clear();
        let read = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
        if read == 0 {
            break;
        }
        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        let verdict = if buf.len() > MAX_LINE_BYTES {
            if !terminated {
                discard_rest_of_line(&mut reader).await?;
            }
            rejected_line(format!("input line exceeds {MAX_LINE_BYTES} bytes"))
        } else {
            match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => evaluate_line(manager, line, clock()),
                Err(e) => rejected_line(format!("invalid utf-8: {e}")),
            }
        };
        match &verdict.result {
            Some(result) => {
                stats.evaluated += 1;
                if result.is_fresh {
                    stats.fresh += 1;
                }
            }
            None => stats.rejected += 1,
        }

        let mut encoded = serde_json::to_vec(&verdict)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
    }

    writer.flush().await?;
    Ok(stats)
}
