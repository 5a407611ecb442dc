use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: HTTP requests served. Labels: method, status.
pub const HTTP_REQUESTS_TOTAL: &str = "slotbook_http_requests_total";

/// Counter: slot submissions. Labels: outcome (created, merged, invalid, conflict).
pub const SUBMISSIONS_TOTAL: &str = "slotbook_submissions_total";

/// Histogram: submit latency in seconds, lock wait included.
pub const SUBMIT_DURATION_SECONDS: &str = "slotbook_submit_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: slots currently held by the store.
pub const SLOTS_ACTIVE: &str = "slotbook_slots_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
