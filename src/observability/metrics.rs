//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_redirects_total` (counter): redirects served, by code and kind
//! - `gateway_requests_total` (counter): forwarded requests, by method and status
//! - `gateway_request_duration_seconds` (histogram): forward latency distribution

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and bind its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a redirect served by the filter.
pub fn record_redirect(code: u16, meta: bool) {
    let kind = if meta { "meta" } else { "status" };
    metrics::counter!(
        "gateway_redirects_total",
        "code" => code.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record a request forwarded to the upstream.
pub fn record_forward(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
