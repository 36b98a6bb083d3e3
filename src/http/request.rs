//! Request correlation context.
//!
//! # Responsibilities
//! - Adopt the inbound `X-Correlation-ID` or generate a UUID v4
//! - Record when the request started
//! - Parse query parameters the same way for logs and handlers
//! - Make the context reachable by handlers (request extension) and by the
//!   logger (task-local scope)
//!
//! # Design Decisions
//! - Context created as early as possible, before the START log line
//! - Inbound ids are passed through verbatim, without format validation
//! - One context per request; it is never stored anywhere shared

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Header carrying the correlation id, inbound and outbound.
pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

tokio::task_local! {
    static CURRENT: CorrelationContext;
}

/// Per-request correlation state.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    id: Arc<str>,
    /// Inbound header value, echoed back byte for byte.
    inbound: Option<HeaderValue>,
    start: Instant,
}

impl CorrelationContext {
    /// Start a context, adopting `inbound` when it is non-empty.
    pub fn begin(inbound: Option<&str>) -> Self {
        match inbound.filter(|v| !v.is_empty()) {
            Some(value) => Self::with_id(Arc::from(value), HeaderValue::from_str(value).ok()),
            None => Self::generated(),
        }
    }

    /// Start a context from request headers.
    ///
    /// Any non-empty header value is adopted. Bytes outside ASCII are decoded
    /// as Latin-1 for logs and bodies; the response header repeats the
    /// original bytes.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(&X_CORRELATION_ID).filter(|v| !v.is_empty()) {
            Some(value) => {
                let id: String = value.as_bytes().iter().map(|&b| char::from(b)).collect();
                Self::with_id(Arc::from(id), Some(value.clone()))
            }
            None => Self::generated(),
        }
    }

    fn generated() -> Self {
        Self::with_id(Arc::from(Uuid::new_v4().to_string()), None)
    }

    fn with_id(id: Arc<str>, inbound: Option<HeaderValue>) -> Self {
        Self {
            id,
            inbound,
            start: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Value for the outbound `X-Correlation-ID` header.
    pub fn header_value(&self) -> Option<HeaderValue> {
        match &self.inbound {
            Some(value) => Some(value.clone()),
            None => HeaderValue::from_str(&self.id).ok(),
        }
    }

    /// Monotonic start instant, used for latency.
    pub fn start(&self) -> Instant {
        self.start
    }
}

/// Query parameters as a flat object. The first value of a repeated key wins.
pub fn query_args(query: Option<&str>) -> Map<String, Value> {
    let mut args = Map::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            args.entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }
    }
    args
}

/// Run `fut` with `ctx` as the current correlation context.
pub async fn scope<F>(ctx: CorrelationContext, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, fut).await
}

/// Correlation context of the executing request, if any.
pub fn current() -> Option<CorrelationContext> {
    CURRENT.try_with(|ctx| ctx.clone()).ok()
}

/// Correlation id of the executing request, if any.
pub fn current_correlation_id() -> Option<String> {
    CURRENT.try_with(|ctx| ctx.id().to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adopts_inbound_value_verbatim() {
        let ctx = CorrelationContext::begin(Some("not a uuid at all"));
        assert_eq!(ctx.id(), "not a uuid at all");
    }

    #[test]
    fn generates_when_missing_or_empty() {
        let a = CorrelationContext::begin(None);
        let b = CorrelationContext::begin(Some(""));
        assert_eq!(a.id().len(), 36);
        assert_eq!(b.id().len(), 36);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn reads_header_case_insensitively() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Correlation-ID", HeaderValue::from_static("abc-123"));
        assert_eq!(CorrelationContext::from_headers(&headers).id(), "abc-123");
    }

    #[test]
    fn non_ascii_header_is_adopted_and_echoed() {
        let mut headers = HeaderMap::new();
        let raw = HeaderValue::from_bytes(b"caf\xe9-1").unwrap();
        headers.insert(X_CORRELATION_ID, raw.clone());

        let ctx = CorrelationContext::from_headers(&headers);
        assert_eq!(ctx.id(), "caf\u{e9}-1");
        assert_eq!(ctx.header_value(), Some(raw));
    }

    #[test]
    fn generated_id_is_a_valid_header() {
        let ctx = CorrelationContext::from_headers(&HeaderMap::new());
        let header = ctx.header_value().unwrap();
        assert_eq!(header.to_str().unwrap(), ctx.id());
    }

    #[test]
    fn query_args_keep_first_value() {
        let args = query_args(Some("user_id=1&user_id=2&q=a%20b"));
        assert_eq!(args["user_id"], "1");
        assert_eq!(args["q"], "a b");
        assert!(query_args(None).is_empty());
    }

    #[test]
    fn no_context_outside_scope() {
        assert!(current().is_none());
        assert!(current_correlation_id().is_none());
    }

    #[tokio::test]
    async fn scope_exposes_context_and_ends_with_future() {
        let ctx = CorrelationContext::begin(Some("req-1"));
        let seen = scope(ctx, async { current_correlation_id() }).await;
        assert_eq!(seen.as_deref(), Some("req-1"));
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn concurrent_scopes_do_not_mix() {
        let a = tokio::spawn(scope(CorrelationContext::begin(Some("a")), async {
            tokio::task::yield_now().await;
            current_correlation_id()
        }));
        let b = tokio::spawn(scope(CorrelationContext::begin(Some("b")), async {
            tokio::task::yield_now().await;
            current_correlation_id()
        }));
        assert_eq!(a.await.unwrap().as_deref(), Some("a"));
        assert_eq!(b.await.unwrap().as_deref(), Some("b"));
    }
}
