//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): requests by method, status, backend
//! - `balancer_request_duration_seconds` (histogram): end-to-end latency
//! - `balancer_backend_health` (gauge): 1=healthy, 0=unhealthy
//! - `balancer_rate_limited_total` (counter): rejected requests
//! - `balancer_rate_windows` (gauge): tracked client windows
//! - `balancer_sticky_sessions_total` (counter): affinity outcomes
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("backend", backend.to_string()),
    ];
    counter!("balancer_requests_total", &labels).increment(1);
    histogram!("balancer_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("balancer_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_rate_limited() {
    counter!("balancer_rate_limited_total").increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("balancer_rate_windows").set(count as f64);
}

pub fn record_sticky(outcome: &'static str) {
    counter!("balancer_sticky_sessions_total", "outcome" => outcome).increment(1);
}
