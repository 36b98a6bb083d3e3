//! Injected faults for the demonstration endpoints.

use std::time::Duration;

use rand::Rng;

use crate::config::FaultConfig;

/// Decides when simulated faults fire and how long simulated delays last.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    config: FaultConfig,
}

impl FaultInjector {
    pub fn new(config: FaultConfig) -> Self {
        Self { config }
    }

    /// Whether this health check should report degraded.
    pub fn health_degraded(&self) -> bool {
        roll(self.config.health_degradation_probability)
    }

    /// Delay for a simulated slow query, if one fires.
    pub fn slow_query_delay(&self) -> Option<Duration> {
        roll(self.config.slow_query_probability)
            .then(|| self.delay_in(self.config.slow_query_delay_secs))
    }

    /// Delay for the `/timeout` endpoint.
    pub fn timeout_delay(&self) -> Duration {
        self.delay_in(self.config.timeout_delay_secs)
    }

    /// Uniform delay within `[lo, hi]`, never above `max_delay_secs`.
    fn delay_in(&self, [lo, hi]: [f64; 2]) -> Duration {
        let secs = if lo.is_finite() && hi.is_finite() && hi > lo {
            rand::thread_rng().gen_range(lo..=hi)
        } else if lo.is_finite() {
            lo
        } else {
            0.0
        };
        Duration::from_secs_f64(secs.clamp(0.0, self.config.max_delay_secs.max(0.0)))
    }
}

fn roll(probability: f64) -> bool {
    if probability.is_nan() || probability <= 0.0 {
        false
    } else if probability >= 1.0 {
        true
    } else {
        rand::thread_rng().gen_bool(probability)
    }
}
