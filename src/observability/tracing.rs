//! Process diagnostics via `tracing`.
//!
//! # Responsibilities
//! - Install the `tracing` subscriber for startup, shutdown and server events
//! - Honour `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - Diagnostics go to stderr; stdout carries only request records
//! - Text format for development, JSON when configured

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::{LogFormat, ObservabilityConfig};

/// Default directive when neither `RUST_LOG` nor the config says otherwise.
fn default_directive(level: &str) -> String {
    format!("enhanced_sample_app={level},tower_http={level}")
}

/// Install the global diagnostic subscriber.
///
/// Later calls are ignored, so tests and binaries may both call it.
pub fn init_diagnostics(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init();
}
