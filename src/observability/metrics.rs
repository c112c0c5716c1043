//! Metrics exposition.
//!
//! # Metrics
//! - `process_units_started_total` (counter)
//! - `process_units_completing_total` (counter)
//! - `process_units_completed_total` (counter)
//! - `process_units_aborted_total` (counter)
//! - `process_units_in_progress` (gauge)
//! - `process_pause_requests_total` (counter)

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}
