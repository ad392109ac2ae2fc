//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method and status
//! - `router_request_duration_seconds` (histogram): latency distribution
//! - `router_decisions_total` (counter): routing decisions by kind
//! - `router_health_checks_total` (counter): health check outcomes
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("router_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_decision(kind: &'static str) {
    ::metrics::counter!("router_decisions_total", "kind" => kind).increment(1);
}

pub fn record_health_check(check: &'static str, ok: bool) {
    ::metrics::counter!(
        "router_health_checks_total",
        "check" => check,
        "ok" => if ok { "true" } else { "false" }
    )
    .increment(1);
}
