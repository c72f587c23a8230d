//! Prometheus metrics for sketch-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use sketch_core::ServiceMode;

// Metric names as constants for consistency
const GUESSES_TOTAL: &str = "sketch_guesses_total";
const GUESS_DURATION: &str = "sketch_guess_duration_seconds";
const FEEDBACK_TOTAL: &str = "sketch_feedback_total";
const SERVICE_MODE: &str = "sketch_service_mode";
const VALIDATION_FAILURES_TOTAL: &str = "sketch_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a completed guess.
///
/// # Arguments
///
/// * `path` - "remote" or "fallback"
/// * `reason` - Fallback reason label, or "none" for remote answers
/// * `elapsed` - Wall-clock time spent producing the result
pub fn record_guess(path: &'static str, reason: &'static str, elapsed: Duration) {
    counter!(GUESSES_TOTAL, "path" => path, "reason" => reason).increment(1);
    histogram!(GUESS_DURATION, "path" => path).record(elapsed.as_secs_f64());
}

/// Record a feedback submission and whether it reached the sink.
pub fn record_feedback(delivered: bool) {
    counter!(FEEDBACK_TOTAL, "delivered" => delivered.to_string()).increment(1);
}

/// Publish the current service mode as a one-hot gauge.
pub fn set_service_mode(mode: ServiceMode) {
    for candidate in [ServiceMode::Online, ServiceMode::Offline] {
        let value = if candidate == mode { 1.0 } else { 0.0 };
        gauge!(SERVICE_MODE, "mode" => candidate.as_str()).set(value);
    }
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (image, mime_type, guess_id, etc.)
pub fn record_validation_failure(validation_type: &'static str) {
    counter!(VALIDATION_FAILURES_TOTAL, "type" => validation_type).increment(1);
}
