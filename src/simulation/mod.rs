//! Simulated degradation.
//!
//! # Responsibilities
//! - Occasional degraded health checks
//! - Occasional slow queries on the user listing
//! - Bounded delays for the timeout endpoint
//!
//! # Design Decisions
//! - Probabilities and delay ranges come from `FaultConfig`
//! - Delays are awaited with `tokio::time::sleep`, never blocking a worker

pub mod faults;

pub use faults::FaultInjector;
