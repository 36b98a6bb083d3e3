//! Enhanced sample app library.
//!
//! The request-lifecycle observability pipeline (correlation ids, structured
//! logs, metrics, failure boundary) and the demonstration API it wraps.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Sample domain
pub mod resources;
pub mod simulation;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
