//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_loads_total` (counter): load attempts by outcome
//! - `config_saves_total` (counter): save attempts by outcome
//! - `client_disconnects_total` (counter): UI disconnects requested
//! - `alerts_total` (counter): operator alerts queued

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_load(outcome: &'static str) {
    metrics::counter!("config_loads_total", "outcome" => outcome).increment(1);
}

pub fn record_save(outcome: &'static str) {
    metrics::counter!("config_saves_total", "outcome" => outcome).increment(1);
}
