//! Prometheus metrics for the scheduler.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use sentinel_models::DetectionClass;

use crate::error::{SchedulerError, SchedulerResult};

/// Install the Prometheus recorder with an HTTP listener on `port`.
///
/// Must be called from within a tokio runtime.
pub fn install_exporter(port: u16) -> SchedulerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| SchedulerError::config(format!("metrics exporter: {e}")))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const TURNS_TOTAL: &str = "sentinel_turns_total";
    pub const TURN_DURATION_SECONDS: &str = "sentinel_turn_duration_seconds";
    pub const CAPTURE_FAILURES_TOTAL: &str = "sentinel_capture_failures_total";
    pub const INFERENCE_FAILURES_TOTAL: &str = "sentinel_inference_failures_total";
    pub const ALERTS_CONFIRMED_TOTAL: &str = "sentinel_alerts_confirmed_total";
    pub const ALERTS_SUPPRESSED_TOTAL: &str = "sentinel_alerts_suppressed_total";
    pub const DISPATCH_FAILURES_TOTAL: &str = "sentinel_dispatch_failures_total";
    pub const ACTIVE_CAMERAS: &str = "sentinel_active_cameras";
}

/// Record a finished turn.
pub fn record_turn(class: DetectionClass, outcome: &str, duration_secs: f64) {
    let labels = [
        ("class", class.as_str().to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::TURNS_TOTAL, &labels).increment(1);
    histogram!(names::TURN_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_capture_failure(class: DetectionClass) {
    let labels = [("class", class.as_str().to_string())];
    counter!(names::CAPTURE_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_inference_failure(class: DetectionClass) {
    let labels = [("class", class.as_str().to_string())];
    counter!(names::INFERENCE_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_alert_confirmed(class: DetectionClass) {
    let labels = [("class", class.as_str().to_string())];
    counter!(names::ALERTS_CONFIRMED_TOTAL, &labels).increment(1);
}

/// Record a detection dropped by a verification stage (`static` or `not_live`).
pub fn record_alert_suppressed(class: DetectionClass, stage: &str) {
    let labels = [
        ("class", class.as_str().to_string()),
        ("stage", stage.to_string()),
    ];
    counter!(names::ALERTS_SUPPRESSED_TOTAL, &labels).increment(1);
}

pub fn record_dispatch_failure() {
    counter!(names::DISPATCH_FAILURES_TOTAL).increment(1);
}

pub fn set_active_cameras(count: usize) {
    gauge!(names::ACTIVE_CAMERAS).set(count as f64);
}
