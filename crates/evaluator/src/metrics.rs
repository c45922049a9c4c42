use anyhow::Result;
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!(
        "freshness_evaluations_total",
        "Wallet signals evaluated, labelled by severity."
    );
    describe_counter!(
        "freshness_fresh_wallets_total",
        "Evaluations that judged the wallet fresh."
    );
    describe_counter!(
        "freshness_invalid_signals_total",
        "Wallet signals rejected as malformed."
    );
    describe_counter!(
        "freshness_catalog_reloads_total",
        "Threshold catalog replacements from config reload."
    );
    describe_counter!(
        "freshness_catalog_reload_failures_total",
        "Config reloads rejected by validation."
    );
    describe_counter!(
        common::observability::ERROR_EVENTS_COUNTER,
        "ERROR-level tracing events."
    );
}

pub fn install_prometheus(port: u16) -> Result<PrometheusHandle> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    Ok(PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()?)
}
