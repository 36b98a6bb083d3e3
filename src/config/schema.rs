//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default environment label when `ENVIRONMENT` is not set.
pub const DEFAULT_ENVIRONMENT: &str = "workshop";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Identity embedded in every log record.
    pub service: ServiceIdentity,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Injected-fault settings for the demonstration endpoints.
    pub faults: FaultConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Service identity: the fixed metadata of every log record.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceIdentity {
    /// Service name (`service` field).
    pub name: String,

    /// Service version (`version` field).
    pub version: String,

    /// Deployment environment label (`environment` field).
    pub environment: String,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self {
            name: "enhanced-sample-app".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

/// Diagnostic log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per diagnostic event.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Diagnostic log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Diagnostic log format. Request records are always JSON.
    pub log_format: LogFormat,

    /// Upper bounds of the latency histogram buckets, in seconds.
    pub latency_buckets: Vec<f64>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            latency_buckets: vec![
                0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
            ],
        }
    }
}

/// Injected-fault configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaultConfig {
    /// Probability that `/health` reports degraded (503).
    pub health_degradation_probability: f64,

    /// Probability that `/users` simulates a slow query.
    pub slow_query_probability: f64,

    /// Slow-query delay range `[min, max]` in seconds.
    pub slow_query_delay_secs: [f64; 2],

    /// `/timeout` delay range `[min, max]` in seconds.
    pub timeout_delay_secs: [f64; 2],

    /// Upper bound for any simulated delay, in seconds.
    pub max_delay_secs: f64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            health_degradation_probability: 0.02,
            slow_query_probability: 0.10,
            slow_query_delay_secs: [0.5, 2.0],
            timeout_delay_secs: [2.0, 5.0],
            max_delay_secs: 5.0,
        }
    }
}

impl FaultConfig {
    /// Faults that never fire and delays that never wait. Used by tests.
    pub fn disabled() -> Self {
        Self {
            health_degradation_probability: 0.0,
            slow_query_probability: 0.0,
            slow_query_delay_secs: [0.0, 0.0],
            timeout_delay_secs: [0.0, 0.0],
            max_delay_secs: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [service]
            environment = "staging"

            [faults]
            slow_query_probability = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.service.environment, "staging");
        assert_eq!(config.service.name, "enhanced-sample-app");
        assert_eq!(config.faults.slow_query_probability, 0.5);
        assert_eq!(config.faults.health_degradation_probability, 0.02);
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
    }

    #[test]
    fn log_format_is_lowercase() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
