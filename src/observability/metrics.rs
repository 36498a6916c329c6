//! Request outcome counters.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `http_response_bytes` (histogram): response body sizes
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade only; installing a recorder is up to the host
//! - Without a recorder every call is a no-op

use std::time::Duration;

/// Record the outcome of one request.
pub fn record_request(method: &str, status: u16, duration: Duration, bytes: u64) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method.to_string())
        .record(duration.as_secs_f64());
    metrics::histogram!("http_response_bytes").record(bytes as f64);
}
