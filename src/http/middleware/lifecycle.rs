//! Request lifecycle middleware and failure boundary.
//!
//! # Flow
//! ```text
//! START      correlation context, start instant, "Request started"
//!   │
//! IN_HANDLER handler runs inside the correlation scope; panics caught
//!   │
//! settle     Rejection      → WARN "Request rejected"
//!            UnhandledFailure / panic → failure boundary (count, ERROR, 500 envelope)
//!   │
//! END        "Request completed", request counter, latency, X-Correlation-ID
//! ```
//!
//! END runs exactly once on every path, including the ones through the
//! failure boundary.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use serde_json::{json, Map, Value};

use crate::http::request::{self, query_args, CorrelationContext, X_CORRELATION_ID};
use crate::http::response::{internal_error_envelope, kind, Rejection, UnhandledFailure};
use crate::http::server::AppState;
use crate::observability::metrics::UNKNOWN_ENDPOINT;
use crate::routing::endpoint_name;

thread_local! {
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Keep the backtrace of the most recent panic on this thread, so the
/// boundary can log where the panic happened rather than where it was caught.
///
/// The previously installed hook still runs.
pub fn install_panic_trace_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture().to_string();
            PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// What the lifecycle logs about the inbound request.
#[derive(Debug, Clone)]
struct RequestInfo {
    method: String,
    path: String,
    endpoint: &'static str,
    remote_addr: Option<String>,
    user_agent: String,
    content_length: Option<u64>,
    args: Map<String, Value>,
}

impl RequestInfo {
    fn from_request(req: &Request) -> Self {
        let endpoint = req
            .extensions()
            .get::<MatchedPath>()
            .and_then(|matched| endpoint_name(req.method(), matched.as_str()))
            .unwrap_or(UNKNOWN_ENDPOINT);
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let content_length = req
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            endpoint,
            remote_addr,
            user_agent,
            content_length,
            args: query_args(req.uri().query()),
        }
    }
}

/// Axum middleware wrapping every route and the fallback.
pub async fn request_lifecycle(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = CorrelationContext::from_headers(req.headers());
    let info = RequestInfo::from_request(&req);
    req.extensions_mut().insert(ctx.clone());

    request::scope(ctx.clone(), async move {
        state.logger.info(
            "Request started",
            json!({
                "request": {
                    "method": info.method,
                    "path": info.path,
                    "remote_addr": info.remote_addr,
                    "user_agent": info.user_agent,
                    "content_length": info.content_length,
                    "args": info.args,
                }
            }),
        );

        let response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
            Ok(response) => settle(&state, &info, &ctx, response),
            Err(payload) => {
                let failure = UnhandledFailure {
                    kind: kind::PANIC.to_string(),
                    message: panic_message(payload.as_ref()),
                    trace: PANIC_TRACE
                        .with(|slot| slot.borrow_mut().take())
                        .unwrap_or_else(|| Backtrace::force_capture().to_string()),
                };
                failure_boundary(&state, &info, &ctx, failure)
            }
        };

        finish(&state, &info, &ctx, response)
    })
    .await
}

/// Route a handler's response through the right failure path.
fn settle(
    state: &AppState,
    info: &RequestInfo,
    ctx: &CorrelationContext,
    mut response: Response,
) -> Response {
    if let Some(failure) = response.extensions_mut().remove::<UnhandledFailure>() {
        return failure_boundary(state, info, ctx, failure);
    }

    if let Some(rejection) = response.extensions().get::<Rejection>() {
        state.logger.warn(
            "Request rejected",
            json!({
                "error": {
                    "type": rejection.kind,
                    "message": rejection.message,
                    "context": rejection.context,
                },
                "request": {
                    "method": info.method,
                    "path": info.path,
                }
            }),
        );
    }
    response
}

/// Count, log and mask a failure no route handled.
fn failure_boundary(
    state: &AppState,
    info: &RequestInfo,
    ctx: &CorrelationContext,
    failure: UnhandledFailure,
) -> Response {
    state.metrics.record_error(&failure.kind);
    state.logger.error(
        "Unhandled exception",
        json!({
            "error": {
                "type": failure.kind,
                "message": failure.message,
                "traceback": failure.trace,
            },
            "request": {
                "method": info.method,
                "path": info.path,
                "remote_addr": info.remote_addr,
            }
        }),
    );
    internal_error_envelope(ctx.id())
}

/// END hook.
fn finish(
    state: &AppState,
    info: &RequestInfo,
    ctx: &CorrelationContext,
    mut response: Response,
) -> Response {
    let elapsed = ctx.start().elapsed();
    let status = response.status().as_u16();
    let duration_ms = (elapsed.as_secs_f64() * 100_000.0).round() / 100.0;

    state.logger.info(
        "Request completed",
        json!({
            "request": {
                "method": info.method,
                "path": info.path,
                "endpoint": info.endpoint,
            },
            "response": {
                "status_code": status,
                "duration_ms": duration_ms,
                "content_length": response.body().size_hint().exact(),
            }
        }),
    );

    state.metrics.record_request(&info.method, info.endpoint, status);
    state.metrics.record_latency(elapsed);

    match ctx.header_value() {
        Some(value) => {
            response.headers_mut().insert(X_CORRELATION_ID, value);
        }
        None => {
            tracing::warn!(
                correlation_id = %ctx.id(),
                "Correlation id is not a valid header value"
            );
        }
    }
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_messages() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "handler panicked");
    }
}
