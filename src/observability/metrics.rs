//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (request count, latency)
//! - Expose Prometheus-compatible metrics endpoint
//! - Label by method, status and matched route
//!
//! # Metrics
//! - `snippets_requests_total` (counter): total requests by method, status, route
//! - `snippets_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Low-overhead metric updates (recorder handles atomics)
//! - Without an installed recorder, recording is a no-op
//! - Unmatched requests are labelled `route="none"`

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "snippets_requests_total";
pub const REQUEST_DURATION: &str = "snippets_request_duration_seconds";

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, route: &str, started: Instant) {
    let (method, status, route) = (method.to_string(), status.to_string(), route.to_string());
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.clone(),
        "status" => status.clone(),
        "route" => route.clone()
    )
    .increment(1);
    metrics::histogram!(
        REQUEST_DURATION,
        "method" => method,
        "status" => status,
        "route" => route
    )
    .record(started.elapsed().as_secs_f64());
}
