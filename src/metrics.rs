//! Process metrics
//!
//! Recorded through the `metrics` facade; they are no-ops until a recorder
//! is installed. `install_exporter` installs the Prometheus recorder with
//! its own HTTP listener, separate from the screenshot gateway.

use crate::ConfigError;
use metrics::{
    decrement_gauge, describe_counter, describe_gauge, describe_histogram, histogram,
    increment_counter, increment_gauge, Unit,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

pub const REQUESTS_TOTAL: &str = "screenshot_requests_total";
pub const CAPTURE_DURATION: &str = "screenshot_capture_duration_seconds";
pub const ACTIVE_SESSIONS: &str = "screenshot_browser_sessions_active";

pub fn install_exporter(port: u16) -> Result<(), ConfigError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ConfigError::Metrics(e.to_string()))?;

    info!("Prometheus exporter listening on {}", addr);
    Ok(())
}

pub fn describe() {
    describe_counter!(
        REQUESTS_TOTAL,
        "Screenshot requests by outcome (success or failure kind)"
    );
    describe_histogram!(
        CAPTURE_DURATION,
        Unit::Seconds,
        "Time from browser launch to encoded PNG for successful captures"
    );
    describe_gauge!(ACTIVE_SESSIONS, "Chrome processes currently running");
}

pub fn record_request(outcome: &'static str) {
    increment_counter!(REQUESTS_TOTAL, "outcome" => outcome);
}

pub fn record_capture(duration: Duration) {
    histogram!(CAPTURE_DURATION, duration.as_secs_f64());
}

pub fn session_opened() {
    increment_gauge!(ACTIVE_SESSIONS, 1.0);
}

pub fn session_closed() {
    decrement_gauge!(ACTIVE_SESSIONS, 1.0);
}
