//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the service metrics (requests, latency, errors)
//! - Render them in Prometheus text format for the scrape endpoint
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, endpoint, status
//! - `http_request_duration_seconds` (histogram): latency distribution, unlabelled
//! - `http_errors_total` (counter): unhandled failures by error type
//!
//! # Design Decisions
//! - The registry is an owned value; no global recorder is installed
//! - Low-overhead metric updates (atomic operations)
//! - Scrapes never reset state

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{
    Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const ERRORS_TOTAL: &str = "http_errors_total";

/// Endpoint label used when the route cannot be resolved.
pub const UNKNOWN_ENDPOINT: &str = "unknown";

/// Errors that can occur while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("invalid latency buckets: {0}")]
    InvalidBuckets(String),
}

/// Process-wide metrics store.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Build a registry whose latency histogram uses `buckets` (seconds).
    pub fn new(buckets: &[f64]) -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                buckets,
            )
            .map_err(|e| MetricsError::InvalidBuckets(e.to_string()))?
            .build_recorder();
        let handle = recorder.handle();

        let registry = Self { recorder, handle };
        registry.with_recorder(|| {
            describe_counter!(REQUESTS_TOTAL, "Total HTTP requests");
            describe_histogram!(
                REQUEST_DURATION_SECONDS,
                Unit::Seconds,
                "HTTP request duration"
            );
            describe_counter!(ERRORS_TOTAL, "Total HTTP errors");
        });
        Ok(registry)
    }

    /// Count one completed request.
    pub fn record_request(&self, method: &str, endpoint: &str, status: u16) {
        self.with_recorder(|| {
            counter!(
                REQUESTS_TOTAL,
                "method" => method.to_string(),
                "endpoint" => endpoint.to_string(),
                "status" => status.to_string()
            )
            .increment(1)
        });
    }

    /// Observe one request latency.
    pub fn record_latency(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        self.with_recorder(|| histogram!(REQUEST_DURATION_SECONDS).record(secs));
    }

    /// Count one unhandled failure of the given kind.
    pub fn record_error(&self, kind: &str) {
        self.with_recorder(|| {
            counter!(ERRORS_TOTAL, "error_type" => kind.to_string()).increment(1)
        });
    }

    /// Render every series in Prometheus text exposition format.
    pub fn scrape(&self) -> String {
        self.handle.render()
    }

    fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.recorder, f)
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry").finish_non_exhaustive()
    }
}

/// Read back a sample value from scrape output.
///
/// `series` is a series name with optional labels, e.g.
/// `http_errors_total{error_type="TestError"}`. Label order does not matter.
/// Missing series read as zero.
pub fn sample_value(scrape: &str, series: &str) -> f64 {
    let wanted = parse_series(series);
    scrape
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (name, value) = line.rsplit_once(' ')?;
            (parse_series(name) == wanted)
                .then(|| value.parse().ok())
                .flatten()
        })
        .unwrap_or(0.0)
}

fn parse_series(series: &str) -> (String, Vec<(String, String)>) {
    let Some((name, rest)) = series.split_once('{') else {
        return (series.to_string(), Vec::new());
    };
    let mut labels: Vec<(String, String)> = rest
        .trim_end_matches('}')
        .split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_string(), value.trim_matches('"').to_string()))
        })
        .collect();
    labels.sort();
    (name.to_string(), labels)
}
