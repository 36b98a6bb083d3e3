//! Sample resources served by the API.
//!
//! # Design Decisions
//! - Process-lifetime only; state resets on restart
//! - Owned by `AppState`, never a module-level global
//! - Identifiers are unique within each collection

pub mod store;
pub mod types;

pub use store::ResourceStore;
pub use types::{NewOrder, Order, User};
