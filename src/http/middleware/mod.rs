//! Request middleware.

pub mod lifecycle;

pub use lifecycle::{install_panic_trace_hook, request_lifecycle};
