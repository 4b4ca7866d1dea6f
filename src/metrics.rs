// src/metrics.rs
use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

/// Install the Prometheus recorder with its own HTTP listener serving the
/// exposition format on `addr`.
pub fn install_exporter(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install recorder")
}

/// One-time metrics registration (so series show up on the exporter).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("poll_runs_total", "Poll cycles started, per feed.");
        describe_counter!(
            "poll_events_total",
            "Event records returned by the admin API, per feed."
        );
        describe_counter!(
            "poll_errors_total",
            "Poll cycles skipped due to a classified error, per feed and kind."
        );
        describe_counter!("digests_sent_total", "Digests delivered to chat, per feed.");
        describe_counter!(
            "dispatch_errors_total",
            "Chat deliveries that failed, per feed."
        );
        describe_gauge!("poll_last_run_ts", "Unix ts when a feed loop last ran.");
    });
}
