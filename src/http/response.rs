//! Error taxonomy and response envelopes.
//!
//! # Responsibilities
//! - Map handler failures to HTTP status codes and JSON bodies
//! - Hand failure details to the lifecycle middleware via response
//!   extensions, so logging and metrics happen in one place
//! - Build the fixed 500 envelope of the failure boundary
//!
//! # Design Decisions
//! - Client failures (validation, not found, degraded) render their own body
//! - Unhandled failures render nothing themselves; the boundary owns the
//!   500 envelope so handler errors and panics look identical to clients

use std::backtrace::Backtrace;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::http::request;
use crate::observability::logging::utc_timestamp;

/// Failure category names, used in logs and the error counter.
pub mod kind {
    pub const VALIDATION: &str = "ValidationError";
    pub const NOT_FOUND: &str = "NotFoundError";
    pub const DEGRADED: &str = "TransientDegradation";
    pub const PANIC: &str = "panic";
}

/// Details of a failure no route handled.
#[derive(Debug, Clone)]
pub struct UnhandledFailure {
    /// Category name, e.g. `TestError`.
    pub kind: String,
    pub message: String,
    /// Diagnostic trace captured where the failure was raised.
    pub trace: String,
}

impl UnhandledFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: Backtrace::force_capture().to_string(),
        }
    }
}

/// A client failure that was answered directly (4xx/503).
#[derive(Debug, Clone)]
pub struct Rejection {
    pub kind: &'static str,
    pub message: String,
    pub context: Value,
}

/// Handler error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or incomplete caller input.
    #[error("{message}")]
    Validation {
        message: String,
        missing_fields: Vec<String>,
        invalid_fields: Vec<String>,
    },
    /// Lookup miss on an identifier.
    #[error("{resource} not found")]
    NotFound { resource: &'static str, id: String },
    /// Simulated transient failure.
    #[error("{reason}")]
    Degraded { reason: String },
    /// Anything else; handled by the failure boundary.
    #[error("{}: {}", .0.kind, .0.message)]
    Unhandled(Box<UnhandledFailure>),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            missing_fields: Vec::new(),
            invalid_fields: Vec::new(),
        }
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        AppError::Validation {
            message: format!("Missing required fields: {}", fields.join(", ")),
            missing_fields: fields,
            invalid_fields: Vec::new(),
        }
    }

    pub fn invalid_fields(fields: Vec<String>) -> Self {
        AppError::Validation {
            message: format!("Invalid field types: {}", fields.join(", ")),
            missing_fields: Vec::new(),
            invalid_fields: fields,
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        AppError::Degraded {
            reason: reason.into(),
        }
    }

    pub fn unhandled(kind: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Unhandled(Box::new(UnhandledFailure::new(kind, message)))
    }

    /// Category name of this failure.
    pub fn kind(&self) -> &str {
        match self {
            AppError::Validation { .. } => kind::VALIDATION,
            AppError::NotFound { .. } => kind::NOT_FOUND,
            AppError::Degraded { .. } => kind::DEGRADED,
            AppError::Unhandled(failure) => failure.kind.as_str(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Degraded { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let correlation_id = request::current_correlation_id();

        let (kind, body, context) = match self {
            AppError::Unhandled(failure) => {
                let mut response = status.into_response();
                response.extensions_mut().insert(*failure);
                return response;
            }
            AppError::Validation {
                missing_fields,
                invalid_fields,
                ..
            } => {
                let mut body = Map::new();
                body.insert("error".into(), message.clone().into());
                let mut context = Map::new();
                if !missing_fields.is_empty() {
                    body.insert("missing_fields".into(), json!(missing_fields));
                    context.insert("missing_fields".into(), json!(missing_fields));
                }
                if !invalid_fields.is_empty() {
                    body.insert("invalid_fields".into(), json!(invalid_fields));
                    context.insert("invalid_fields".into(), json!(invalid_fields));
                }
                (kind::VALIDATION, body, Value::Object(context))
            }
            AppError::NotFound { resource, id } => {
                let mut body = Map::new();
                body.insert("error".into(), message.clone().into());
                (
                    kind::NOT_FOUND,
                    body,
                    json!({"resource": resource, "id": id}),
                )
            }
            AppError::Degraded { .. } => {
                let mut body = Map::new();
                body.insert("status".into(), "degraded".into());
                body.insert("error".into(), message.clone().into());
                (kind::DEGRADED, body, json!({}))
            }
        };

        let mut body = body;
        body.insert("correlation_id".into(), json!(correlation_id));

        let mut response = (status, Json(Value::Object(body))).into_response();
        response.extensions_mut().insert(Rejection {
            kind,
            message,
            context,
        });
        response
    }
}

/// The fixed response of the failure boundary.
pub fn internal_error_envelope(correlation_id: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "correlation_id": correlation_id,
            "timestamp": utc_timestamp(),
        })),
    )
        .into_response()
}
