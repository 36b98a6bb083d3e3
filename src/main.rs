//! Enhanced sample app.
//!
//! A demonstration HTTP service with structured request logging,
//! correlation ids and Prometheus metrics.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────────┐
//!                      ▼
//!              ┌──────────────┐   START: correlation id, timer, "Request started"
//!              │  lifecycle   │──────────────────────────────────────────────┐
//!              │  middleware  │                                              │
//!              └──────┬───────┘                                              ▼
//!                     │                                             ┌────────────────┐
//!                     ▼                                             │ logger (stdout)│
//!              ┌──────────────┐   AppError / panic                  └────────────────┘
//!              │   handlers   │──────────────┐                               ▲
//!              │ users/orders │              ▼                               │
//!              └──────┬───────┘      ┌────────────────┐  ERROR, error counter │
//!                     │              │failure boundary│──────────────────────┤
//!                     ▼              └───────┬────────┘                      │
//!              ┌──────────────┐              │ 500 envelope                  │
//!              │  lifecycle   │◀─────────────┘                               │
//!              │  END hook    │── "Request completed", counters, latency ────┘
//!              └──────┬───────┘
//!                     │ X-Correlation-ID
//!     ◀───────────────┘
//!     Client Response
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use enhanced_sample_app::config::load_config;
use enhanced_sample_app::http::HttpServer;
use enhanced_sample_app::lifecycle::Shutdown;
use enhanced_sample_app::observability::tracing::init_diagnostics;
use serde_json::json;

#[derive(Parser)]
#[command(name = "enhanced-sample-app")]
#[command(about = "Demonstration HTTP service with structured logging and metrics", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "APP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    init_diagnostics(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %config.service.environment,
        health_degradation_probability = config.faults.health_degradation_probability,
        slow_query_probability = config.faults.slow_query_probability,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    let server = HttpServer::new(config)?;
    server.state().logger.info(
        "Application starting",
        json!({"extra": {"port": local_addr.port(), "debug": false}}),
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
