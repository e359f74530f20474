// Metric name constants
pub const COMMIT_REQUESTS_TOTAL: &str = "commitd_commit_requests_total";
pub const COMMIT_REQUEST_DURATION_SECONDS: &str = "commitd_commit_request_duration_seconds";
pub const COMMIT_FAILURES_TOTAL: &str = "commitd_commit_failures_total";
pub const ASKPASS_REQUESTS_TOTAL: &str = "commitd_askpass_requests_total";

/// Adds one finished commit request with its terminal status.
pub fn add_commit_request(status: &'static str) {
    metrics::counter!(COMMIT_REQUESTS_TOTAL, "status" => status).increment(1);
}

/// Observes the wall time of one commit request.
pub fn observe_commit_duration(seconds: f64) {
    metrics::histogram!(COMMIT_REQUEST_DURATION_SECONDS).record(seconds);
}

/// Adds one failed commit request.
pub fn add_commit_failure() {
    metrics::counter!(COMMIT_FAILURES_TOTAL).increment(1);
}

/// Adds one credential lookup served over the askpass socket.
pub fn add_askpass_request() {
    metrics::counter!(ASKPASS_REQUESTS_TOTAL).increment(1);
}
