//! Metrics collection and exposition.
//!
//! # Metrics
//! - `front_requests_total` (counter): page requests by plugin_page
//! - `front_request_duration_seconds` (histogram): lifecycle latency
//! - `front_route_resolutions_total` (counter): routes claimed, by module
//! - `front_routing_failures_total` (counter): handler failures, by module
//! - `front_asset_gate_total` (counter): positive gate decisions, by reason
//! - `front_notices_total` (counter): queued notices, by kind
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which keeps unit tests free of setup
//! - Prometheus exporter only when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(plugin_page: bool, start: Instant) {
    let label = if plugin_page { "true" } else { "false" };
    counter!("front_requests_total", "plugin_page" => label).increment(1);
    histogram!("front_request_duration_seconds", "plugin_page" => label)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_route_resolution(module: &str) {
    counter!("front_route_resolutions_total", "module" => module.to_string()).increment(1);
}

pub fn record_routing_failure(module: &str) {
    counter!("front_routing_failures_total", "module" => module.to_string()).increment(1);
}

pub fn record_asset_gate(reason: &'static str) {
    counter!("front_asset_gate_total", "reason" => reason).increment(1);
}

pub fn record_notice(kind: &'static str) {
    counter!("front_notices_total", "kind" => kind).increment(1);
}
