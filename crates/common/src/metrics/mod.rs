//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all SpaceBio metrics
pub const METRICS_PREFIX: &str = "spacebio";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Buckets for a full import (fetch, insert, derive)
pub const IMPORT_BUCKETS: &[f64] = &[
    0.5,
    1.0,
    2.5,
    5.0,
    10.0,
    30.0,
    60.0,
    120.0,
    300.0,
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Import metrics
    describe_counter!(
        format!("{}_imports_total", METRICS_PREFIX),
        Unit::Count,
        "Total import runs by outcome"
    );

    describe_counter!(
        format!("{}_publications_imported_total", METRICS_PREFIX),
        Unit::Count,
        "Total publications written by imports"
    );

    describe_gauge!(
        format!("{}_connections_derived", METRICS_PREFIX),
        Unit::Count,
        "Connections produced by the most recent import"
    );

    describe_histogram!(
        format!("{}_import_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Import latency in seconds"
    );

    // Assistant metrics
    describe_counter!(
        format!("{}_assistant_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total assistant relay requests by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a completed import
pub fn record_import(duration_secs: f64, publications: usize, connections: usize) {
    counter!(
        format!("{}_imports_total", METRICS_PREFIX),
        "status" => "success"
    )
    .increment(1);

    counter!(format!("{}_publications_imported_total", METRICS_PREFIX))
        .increment(publications as u64);

    gauge!(format!("{}_connections_derived", METRICS_PREFIX)).set(connections as f64);

    histogram!(format!("{}_import_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record a failed import
pub fn record_import_failure() {
    counter!(
        format!("{}_imports_total", METRICS_PREFIX),
        "status" => "error"
    )
    .increment(1);
}

/// Helper to record an assistant relay outcome (`streamed`, `rate_limited`, ...)
pub fn record_assistant(outcome: &'static str) {
    counter!(
        format!("{}_assistant_requests_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}
