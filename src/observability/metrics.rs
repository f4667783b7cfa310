//! Metrics collection and exposition.
//!
//! # Metrics
//! - `upload_transfers_started_total` (counter): transfers by framing
//! - `upload_transfers_finished_total` (counter): transfers by outcome
//! - `upload_body_bytes_total` (counter): body bytes flushed to transports
//! - `upload_transfer_duration_seconds` (histogram): head-to-terminal latency
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_transfer_started(framing: &'static str) {
    metrics::counter!("upload_transfers_started_total", "framing" => framing).increment(1);
}

pub fn record_bytes_written(bytes: u64) {
    metrics::counter!("upload_body_bytes_total").increment(bytes);
}

/// `error_kind` is `None` for a completed transfer.
pub fn record_transfer_finished(error_kind: Option<&'static str>, elapsed: Duration) {
    let outcome = error_kind.unwrap_or("completed");
    metrics::counter!("upload_transfers_finished_total", "outcome" => outcome).increment(1);
    metrics::histogram!("upload_transfer_duration_seconds").record(elapsed.as_secs_f64());
}
