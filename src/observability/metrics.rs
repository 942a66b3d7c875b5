//! Metrics collection.
//!
//! Recorded through the `metrics` facade; the embedding application decides
//! which recorder (if any) to install.
//!
//! # Metrics
//! - `console_http_requests_total` (counter): settled calls by method, outcome
//! - `console_http_request_duration_seconds` (histogram): latency incl. retries
//! - `console_http_retries_total` (counter): retry attempts by method
//! - `console_http_unauthorized_total` (counter): 401s by handled/suppressed

use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "console_http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "console_http_request_duration_seconds";
pub const RETRIES_TOTAL: &str = "console_http_retries_total";
pub const UNAUTHORIZED_TOTAL: &str = "console_http_unauthorized_total";

/// Record a settled call.
pub fn record_request(method: &str, outcome: &'static str, start: Instant) {
    let method = method.to_string();
    metrics::counter!(REQUESTS_TOTAL, "method" => method.clone(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(method: &str) {
    metrics::counter!(RETRIES_TOTAL, "method" => method.to_string()).increment(1);
}

pub fn record_unauthorized(suppressed: bool) {
    let state = if suppressed { "suppressed" } else { "handled" };
    metrics::counter!(UNAUTHORIZED_TOTAL, "state" => state).increment(1);
}
