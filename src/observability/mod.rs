//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request lifecycle middleware produces:
//!     → logging.rs (one JSON record per event, stdout)
//!     → metrics.rs (counters, histogram)
//!
//! Process produces:
//!     → tracing.rs (startup/shutdown diagnostics, stderr)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape of /metrics)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Correlation ID flows into every request record
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use logging::{Level, LogSink, Logger, MemorySink, StdoutSink};
pub use metrics::{MetricsError, MetricsRegistry};
