use std::time::Duration;

/// Runtime parameters for a single circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerSettings {
    /// The breaker opens once consecutive failures exceed this value
    pub failure_threshold: u32,

    /// Consecutive half-open successes required to close
    pub success_threshold: u32,

    /// How long the breaker stays open before `allow_request` starts probing
    pub open_timeout: Duration,
}

impl CircuitBreakerSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be greater than 0".to_string());
        }
        if self.success_threshold == 0 {
            return Err("success_threshold must be greater than 0".to_string());
        }
        if self.open_timeout.is_zero() {
            return Err("open timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        use crate::constants::defaults;
        Self {
            failure_threshold: defaults::FAILURE_THRESHOLD,
            success_threshold: defaults::SUCCESS_THRESHOLD,
            open_timeout: Duration::from_secs(defaults::OPEN_TIMEOUT_SECONDS),
        }
    }
}
