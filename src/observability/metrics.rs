//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): decisions by kind and rule
//! - `gate_decision_duration_seconds` (histogram): engine latency
//! - `gate_cookie_writes_total` (counter): language cookie writes by language
//! - `gate_fail_closed_total` (counter): paths categorized Protected after an error
//! - `gate_upstream_requests_total` (counter): forwarded requests by status
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, CLI)
//! - Prometheus exporter binds its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(kind: &'static str, rule: &'static str, started: Instant) {
    counter!("gate_decisions_total", "decision" => kind, "rule" => rule).increment(1);
    histogram!("gate_decision_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_cookie_write(language: &str) {
    counter!("gate_cookie_writes_total", "language" => language.to_string()).increment(1);
}

pub fn record_fail_closed() {
    counter!("gate_fail_closed_total").increment(1);
}

pub fn record_upstream(status: u16) {
    counter!("gate_upstream_requests_total", "status" => status.to_string()).increment(1);
}
