//! Business metrics for the dispatch backend.
//!
//! # Exported metrics
//!
//! - `despacho_tickets_created_total`: tickets created (and numbers issued)
//! - `despacho_login_attempts_total`: login attempts, successful or not
//!
//! The Prometheus exporter listens on its own port (see `METRICS_PORT`).

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Register metric descriptions. Call once at startup, before anything is
/// recorded.
pub fn register_metrics() {
    describe_counter!(
        "despacho_tickets_created_total",
        "Total dispatch tickets created (one display number issued each)"
    );
    describe_counter!(
        "despacho_login_attempts_total",
        "Total login attempts, successful or not"
    );
}

/// Install the Prometheus exporter on the given address.
///
/// # Errors
///
/// Returns an error when the exporter cannot bind or a recorder is already
/// installed.
pub fn install_exporter(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install metrics exporter: {e}"))?;
    register_metrics();
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}
