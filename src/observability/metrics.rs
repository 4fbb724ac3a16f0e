//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (request counts, latency, outcomes)
//! - Expose a Prometheus-compatible scrape endpoint
//! - Track per-format and per-outcome request totals
//!
//! # Metrics
//! - `subweave_requests_total` (counter): requests by format, outcome
//! - `subweave_request_duration_seconds` (histogram): latency by format
//!
//! # Design Decisions
//! - Outcome labels are a closed set (`converted`, `bypass`, `sentinel`,
//!   `rejected`, `bad_request`, `upstream_failed`) to keep cardinality
//!   bounded
//! - Recording is a no-op until the exporter is installed, so handlers
//!   never need to know whether metrics are enabled

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener. Failure is
/// logged, not fatal; the service runs without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(err) => {
            tracing::error!(address = %addr, error = %err, "Failed to install metrics exporter");
        }
    }
}

/// Record one finished request.
pub fn record_request(format: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "subweave_requests_total",
        "format" => format,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("subweave_request_duration_seconds", "format" => format)
        .record(start.elapsed().as_secs_f64());
}
