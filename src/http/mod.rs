//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info)
//!     → middleware/lifecycle.rs (START: correlation context, timer, log)
//!     → routing handlers
//!     → response.rs (AppError → status + JSON, failure details)
//!     → middleware/lifecycle.rs (failure boundary, END: log, metrics, header)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{CorrelationContext, X_CORRELATION_ID};
pub use response::AppError;
pub use server::{instrument, AppState, HttpServer};
