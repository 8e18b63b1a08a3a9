//! Prometheus metrics for the worker.

use std::net::{Ipv4Addr, SocketAddr};

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use vpub_models::PublishRole;

/// Metric names as constants for consistency.
pub mod names {
    pub const FILES_PROCESSED_TOTAL: &str = "vpub_files_processed_total";
    pub const FILES_FAILED_TOTAL: &str = "vpub_files_failed_total";
    pub const ATTEMPTS_TOTAL: &str = "vpub_attempts_total";
    pub const PUBLISH_TOTAL: &str = "vpub_publish_total";
    pub const DISCOVERY_ERRORS_TOTAL: &str = "vpub_discovery_errors_total";
    pub const FILE_DURATION_SECONDS: &str = "vpub_file_duration_seconds";
}

/// Install the Prometheus recorder and serve `/metrics` on `port`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(port: u16) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .install()
}

pub fn record_attempt() {
    counter!(names::ATTEMPTS_TOTAL).increment(1);
}

/// Record a fully processed file and its wall-clock duration.
pub fn record_file_processed(duration_secs: f64) {
    counter!(names::FILES_PROCESSED_TOTAL).increment(1);
    histogram!(names::FILE_DURATION_SECONDS, "status" => "processed").record(duration_secs);
}

/// Record a file that exhausted its attempts.
pub fn record_file_failed(duration_secs: f64) {
    counter!(names::FILES_FAILED_TOTAL).increment(1);
    histogram!(names::FILE_DURATION_SECONDS, "status" => "failed").record(duration_secs);
}

/// Record one account's publish result.
pub fn record_publish(role: PublishRole, status: &'static str) {
    counter!(names::PUBLISH_TOTAL, "role" => role.as_str(), "status" => status).increment(1);
}

pub fn record_discovery_error() {
    counter!(names::DISCOVERY_ERRORS_TOTAL).increment(1);
}
