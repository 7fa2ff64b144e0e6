//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fleet_requests_total` (counter): requests by command, status
//! - `fleet_request_duration_seconds` (histogram): dispatch latency by command
//! - `fleet_active_connections` (gauge): open protocol connections
//! - `fleet_connections_total` (counter): accepted protocol connections
//! - `fleet_decode_failures_total` (counter): malformed or oversized requests
//! - `fleet_http_requests_total` (counter): façade requests by route, status
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library code
//!   and tests never need to set one up
//! - The Prometheus exporter serves its own scrape endpoint

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::protocol::Status;

/// Install the Prometheus recorder and start its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_request(command: &'static str, status: Status, started: Instant) {
    counter!("fleet_requests_total", "command" => command, "status" => status.as_str()).increment(1);
    histogram!("fleet_request_duration_seconds", "command" => command)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_connection_opened() {
    gauge!("fleet_active_connections").increment(1.0);
    counter!("fleet_connections_total").increment(1);
}

pub fn record_connection_closed() {
    gauge!("fleet_active_connections").decrement(1.0);
}

/// Record a request that never reached the dispatcher.
pub fn record_decode_failure(reason: &'static str) {
    counter!("fleet_decode_failures_total", "reason" => reason).increment(1);
}

pub fn record_http_request(route: String, status: u16) {
    counter!("fleet_http_requests_total", "route" => route, "status" => status.to_string()).increment(1);
}
