//! Request metrics emitted through the `metrics` facade.
//!
//! Nothing is exported unless the application installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Counter of handled requests.
pub const REQUESTS_TOTAL: &str = "archrest_http_requests_total";

/// Histogram of request latency in seconds.
pub const REQUEST_DURATION_SECONDS: &str = "archrest_http_request_duration_seconds";

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests processed");
    describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
}

/// Records a completed request.
///
/// `route` is the mounted route template, or `"unmatched"` for fallthrough.
pub fn record_request(method: &str, route: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}
