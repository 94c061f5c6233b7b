//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): proxied requests by outcome and status
//! - `lb_request_duration_seconds` (histogram): proxy latency
//! - `lb_registrations_total` (counter): registration attempts by outcome
//! - `lb_health_probes_total` (counter): probes by outcome
//! - `lb_backend_health` (gauge): 1=alive, 0=dead or evicted, per backend url
//! - `lb_backends_registered` (gauge): current registry size
//! - `lb_evictions_total` (counter): backends removed by the health monitor
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!("lb_requests_total", "outcome" => outcome, "status" => status.to_string()).increment(1);
    histogram!("lb_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_registration(outcome: &'static str) {
    counter!("lb_registrations_total", "outcome" => outcome).increment(1);
}

pub fn record_probe(outcome: &'static str) {
    counter!("lb_health_probes_total", "outcome" => outcome).increment(1);
}

pub fn record_backend_health(url: &str, alive: bool) {
    gauge!("lb_backend_health", "backend" => url.to_string()).set(if alive { 1.0 } else { 0.0 });
}

pub fn record_registry_size(len: usize) {
    gauge!("lb_backends_registered").set(len as f64);
}

/// Count an eviction and zero the backend's health series.
pub fn record_eviction(url: &str) {
    counter!("lb_evictions_total").increment(1);
    record_backend_health(url, false);
}
