//! Route table and endpoint resolution.
//!
//! # Responsibilities
//! - Declare every API route and the endpoint name it reports
//! - Resolve (method, matched path) to an endpoint name for logs and metrics
//!
//! # Design Decisions
//! - One table drives both the axum router and endpoint names
//! - HEAD resolves like GET, since axum serves HEAD from GET routes
//! - No match means the caller falls back to the `unknown` label

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;
use crate::routing::handlers;

/// A declared API route.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
    pub name: &'static str,
}

const fn endpoint(method: Method, path: &'static str, name: &'static str) -> Endpoint {
    Endpoint { method, path, name }
}

/// Every route served by the API.
pub static ENDPOINTS: [Endpoint; 11] = [
    endpoint(Method::GET, "/", "home"),
    endpoint(Method::GET, "/health", "health"),
    endpoint(Method::GET, "/ready", "ready"),
    endpoint(Method::GET, "/users", "get_users"),
    endpoint(Method::GET, "/users/{user_id}", "get_user"),
    endpoint(Method::GET, "/orders", "get_orders"),
    endpoint(Method::POST, "/orders", "create_order"),
    endpoint(Method::GET, "/error", "trigger_error"),
    endpoint(Method::GET, "/timeout", "trigger_timeout"),
    endpoint(Method::GET, "/metrics", "metrics"),
    endpoint(Method::GET, "/info", "info"),
];

/// Endpoint name for a request that matched `matched_path`.
pub fn endpoint_name(method: &Method, matched_path: &str) -> Option<&'static str> {
    let method = if *method == Method::HEAD {
        Method::GET
    } else {
        method.clone()
    };
    ENDPOINTS
        .iter()
        .find(|e| e.method == method && e.path == matched_path)
        .map(|e| e.name)
}

/// API routes, without middleware or state.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/users", get(handlers::get_users))
        .route("/users/{user_id}", get(handlers::get_user))
        .route(
            "/orders",
            get(handlers::get_orders).post(handlers::create_order),
        )
        .route("/error", get(handlers::trigger_error))
        .route("/timeout", get(handlers::trigger_timeout))
        .route("/metrics", get(handlers::metrics))
        .route("/info", get(handlers::info))
}
