//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → axum router (router.rs table)
//!     → handlers.rs
//!     → Return: JSON body or AppError
//!
//! Endpoint naming (lifecycle middleware):
//!     (method, MatchedPath) → router.rs endpoint_name → metric label
//! ```
//!
//! # Design Decisions
//! - Routes declared once, immutable at runtime
//! - Unmatched paths go to a fallback that answers 404 like any lookup miss

pub mod handlers;
pub mod router;

pub use router::{api_routes, endpoint_name, Endpoint, ENDPOINTS};
