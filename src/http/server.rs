//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the process-wide stores (logger, metrics, resources, faults)
//! - Create Axum Router with all handlers
//! - Wire up middleware (request lifecycle, tracing)
//! - Serve on a listener until shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::middleware::{install_panic_trace_hook, request_lifecycle};
use crate::observability::{Logger, MetricsError, MetricsRegistry};
use crate::resources::ResourceStore;
use crate::routing::{api_routes, handlers};
use crate::simulation::FaultInjector;

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub logger: Logger,
    pub metrics: Arc<MetricsRegistry>,
    pub store: Arc<ResourceStore>,
    pub faults: Arc<FaultInjector>,
}

impl AppState {
    /// Fresh state: seeded resources, empty metrics.
    ///
    /// `config` is expected to have passed `validate_config`. The fault
    /// injector still treats a NaN probability or delay as disabled.
    pub fn new(config: &ServiceConfig, logger: Logger) -> Result<Self, MetricsError> {
        Ok(Self {
            logger,
            metrics: Arc::new(MetricsRegistry::new(&config.observability.latency_buckets)?),
            store: Arc::new(ResourceStore::seeded()),
            faults: Arc::new(FaultInjector::new(config.faults.clone())),
        })
    }
}

/// Wrap `routes` in the observability pipeline.
///
/// Every route, and the 404 fallback, runs inside the request lifecycle.
pub fn instrument(routes: Router<AppState>, state: AppState) -> Router {
    install_panic_trace_hook();
    routes
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), request_lifecycle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server writing request records to stdout.
    pub fn new(config: ServiceConfig) -> Result<Self, MetricsError> {
        let logger = Logger::stdout(config.service.clone());
        Self::with_logger(config, logger)
    }

    /// Create a new HTTP server with the given request logger.
    pub fn with_logger(config: ServiceConfig, logger: Logger) -> Result<Self, MetricsError> {
        let state = AppState::new(&config, logger)?;
        let router = instrument(api_routes(), state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.service.environment,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}
