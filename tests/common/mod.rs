//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use enhanced_sample_app::config::{FaultConfig, ServiceConfig};
use enhanced_sample_app::http::{instrument, AppState};
use enhanced_sample_app::observability::{Logger, MemorySink};
use enhanced_sample_app::routing::api_routes;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// An instrumented app whose request records land in memory.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sink: Arc<MemorySink>,
}

/// Response parts a test usually asserts on.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }

    pub fn correlation_id(&self) -> String {
        self.headers
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

/// Config with faults off and a recognisable environment label.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.service.environment = "test".into();
    config.faults = FaultConfig::disabled();
    config
}

pub fn test_state(config: &ServiceConfig) -> (AppState, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::new(config.service.clone(), sink.clone());
    let state = AppState::new(config, logger).expect("valid metrics config");
    (state, sink)
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        Self::with_routes(config, api_routes())
    }

    /// Instrument custom routes, e.g. the API plus a test-only route.
    pub fn with_routes(config: ServiceConfig, routes: Router<AppState>) -> Self {
        let (state, sink) = test_state(&config);
        let router = instrument(routes, state.clone());
        Self {
            router,
            state,
            sink,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> TestResponse {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub fn scrape(&self) -> String {
        self.state.metrics.scrape()
    }

    /// Records emitted for one correlation id, in order.
    pub fn records_for(&self, correlation_id: &str) -> Vec<Value> {
        self.sink
            .records()
            .into_iter()
            .filter(|r| r["correlation_id"] == correlation_id)
            .collect()
    }
}

/// Sum of every series of a counter family in a scrape.
pub fn family_total(scrape: &str, family: &str) -> f64 {
    scrape
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(family)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .filter_map(|line| line.rsplit_once(' ')?.1.parse::<f64>().ok())
        .sum()
}
