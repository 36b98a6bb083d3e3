//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (probabilities, delays, buckets)
//! - Validate the bind address before the listener is created
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description of the problem.
    pub reason: String,
}

impl ValidationError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::new("service.name", "must not be empty"));
    }

    let faults = &config.faults;
    check_probability(
        &mut errors,
        "faults.health_degradation_probability",
        faults.health_degradation_probability,
    );
    check_probability(
        &mut errors,
        "faults.slow_query_probability",
        faults.slow_query_probability,
    );

    if !faults.max_delay_secs.is_finite() || faults.max_delay_secs < 0.0 {
        errors.push(ValidationError::new(
            "faults.max_delay_secs",
            "must be a non-negative number",
        ));
    }
    check_delay_range(
        &mut errors,
        "faults.slow_query_delay_secs",
        faults.slow_query_delay_secs,
        faults.max_delay_secs,
    );
    check_delay_range(
        &mut errors,
        "faults.timeout_delay_secs",
        faults.timeout_delay_secs,
        faults.max_delay_secs,
    );

    let buckets = &config.observability.latency_buckets;
    if buckets.is_empty() {
        errors.push(ValidationError::new(
            "observability.latency_buckets",
            "must contain at least one bucket",
        ));
    } else if buckets.iter().any(|b| !b.is_finite()) {
        errors.push(ValidationError::new(
            "observability.latency_buckets",
            "buckets must be finite",
        ));
    } else if buckets.windows(2).any(|w| w[0] >= w[1]) {
        errors.push(ValidationError::new(
            "observability.latency_buckets",
            "buckets must be strictly increasing",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_probability(errors: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ValidationError::new(field, format!("{value} is not within [0, 1]")));
    }
}

fn check_delay_range(
    errors: &mut Vec<ValidationError>,
    field: &str,
    range: [f64; 2],
    max: f64,
) {
    let [lo, hi] = range;
    if !lo.is_finite() || !hi.is_finite() || lo < 0.0 {
        errors.push(ValidationError::new(field, "bounds must be non-negative numbers"));
    } else if lo > hi {
        errors.push(ValidationError::new(
            field,
            format!("lower bound {lo} exceeds upper bound {hi}"),
        ));
    } else if hi > max {
        errors.push(ValidationError::new(
            field,
            format!("upper bound {hi} exceeds faults.max_delay_secs ({max})"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.faults.health_degradation_probability = 1.5;
        config.faults.timeout_delay_secs = [3.0, 1.0];
        config.observability.latency_buckets = vec![0.5, 0.1];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "faults.health_degradation_probability",
                "faults.timeout_delay_secs",
                "observability.latency_buckets",
            ]
        );
    }

    #[test]
    fn delay_above_cap_is_rejected() {
        let mut config = ServiceConfig::default();
        config.faults.max_delay_secs = 1.0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "faults.slow_query_delay_secs"));
        assert!(errors.iter().any(|e| e.field == "faults.timeout_delay_secs"));
    }
}
