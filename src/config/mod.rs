//! # Dispatch Core Configuration
//!
//! Typed configuration for every tunable component of the core. Each section
//! deserializes independently with `#[serde(default)]`, so an environment
//! overlay only needs to name the values it changes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dispatch_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let hard_limit = manager.config().admission.hard_limit;
//! let breaker = manager
//!     .config()
//!     .circuit_breakers
//!     .config_for_component("berth_allocator");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::defaults;
use crate::resilience::CircuitBreakerSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/dispatch-core.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Order planning and pricing
    pub dispatch: DispatchConfig,

    /// Queue bounds and health ratios
    pub admission: AdmissionConfig,

    /// Token-bucket rate limiting per intake key
    pub rate_limit: RateLimitConfig,

    /// Escalation ladder sensitivity and de-escalation streaks
    pub policy: PolicyConfig,

    /// Circuit breaker defaults and per-component overrides
    pub circuit_breakers: CircuitBreakerConfig,

    /// Checkpoint cadence
    pub checkpoint: CheckpointConfig,

    /// Transit planning
    pub routing: RoutingConfig,
}

impl CoreConfig {
    /// Validate cross-field constraints. Called by the loader after merging.
    pub fn validate(&self) -> ConfigResult<()> {
        self.dispatch.validate()?;
        self.admission.validate()?;
        self.rate_limit.validate()?;
        self.policy.validate()?;
        self.circuit_breakers.validate()?;
        self.routing.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Capacity used when a caller does not supply one
    pub default_capacity: usize,
    /// Base rate fed to `estimate_cost`
    pub base_rate: f64,
    /// Minutes of service time per order when estimating turnaround
    pub service_minutes: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_capacity: 10,
            base_rate: defaults::BASE_RATE,
            service_minutes: defaults::SERVICE_MINUTES,
        }
    }
}

impl DispatchConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.base_rate.is_finite() || self.base_rate < 0.0 {
            return Err(ConfigurationError::invalid_value(
                "dispatch.base_rate",
                self.base_rate.to_string(),
                "base rate must be a finite, non-negative number",
            ));
        }
        if self.service_minutes == 0 {
            return Err(ConfigurationError::invalid_value(
                "dispatch.service_minutes",
                "0",
                "service time must be at least one minute",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Hard capacity of the bounded priority queue
    pub hard_limit: usize,
    /// Utilization at which the queue is reported as elevated
    pub warn_ratio: f64,
    /// Utilization at which the queue is reported as warning
    pub emergency_ratio: f64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            hard_limit: defaults::QUEUE_HARD_LIMIT,
            warn_ratio: defaults::WARN_RATIO,
            emergency_ratio: defaults::EMERGENCY_RATIO,
        }
    }
}

impl AdmissionConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.hard_limit == 0 {
            return Err(ConfigurationError::invalid_value(
                "admission.hard_limit",
                "0",
                "hard limit must be greater than 0",
            ));
        }
        let ordered = 0.0 < self.warn_ratio
            && self.warn_ratio < self.emergency_ratio
            && self.emergency_ratio < 1.0;
        if !ordered {
            return Err(ConfigurationError::validation_error(format!(
                "admission ratios must satisfy 0 < warn_ratio ({}) < emergency_ratio ({}) < 1",
                self.warn_ratio, self.emergency_ratio
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Maximum tokens a bucket holds
    pub capacity: f64,
    /// Tokens restored per second of elapsed time
    pub refill_per_second: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: defaults::RATE_LIMIT_CAPACITY,
            refill_per_second: defaults::RATE_LIMIT_REFILL_PER_SECOND,
        }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.capacity.is_finite() || self.capacity < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limit.capacity",
                self.capacity.to_string(),
                "bucket capacity must hold at least one token",
            ));
        }
        if !self.refill_per_second.is_finite() || self.refill_per_second < 0.0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limit.refill_per_second",
                self.refill_per_second.to_string(),
                "refill rate must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// A failure burst must exceed this to escalate
    pub sensitivity: u32,
    /// Success streak needed (strictly exceeded) to step down from each level
    pub watch_streak: u32,
    pub restricted_streak: u32,
    pub halted_streak: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sensitivity: defaults::POLICY_SENSITIVITY,
            watch_streak: defaults::WATCH_STREAK,
            restricted_streak: defaults::RESTRICTED_STREAK,
            halted_streak: defaults::HALTED_STREAK,
        }
    }
}

impl PolicyConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(self.watch_streak <= self.restricted_streak
            && self.restricted_streak <= self.halted_streak)
        {
            return Err(ConfigurationError::validation_error(format!(
                "policy streaks must not decrease with severity (watch={}, restricted={}, halted={})",
                self.watch_streak, self.restricted_streak, self.halted_streak
            )));
        }
        Ok(())
    }
}

/// Circuit breaker configuration: a default plus named component overrides
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Whether circuit breakers are enabled globally
    pub enabled: bool,

    /// Maximum number of named breakers the manager will track
    pub max_circuit_breakers: usize,

    /// Configuration for components without an override
    pub default_config: CircuitBreakerComponentConfig,

    /// Specific configurations for named components
    pub component_configs: HashMap<String, CircuitBreakerComponentConfig>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_circuit_breakers: 50,
            default_config: CircuitBreakerComponentConfig::default(),
            component_configs: HashMap::new(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Get configuration for a specific component
    pub fn config_for_component(&self, component_name: &str) -> CircuitBreakerComponentConfig {
        self.component_configs
            .get(component_name)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_circuit_breakers == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breakers.max_circuit_breakers",
                "0",
                "at least one circuit breaker must be allowed",
            ));
        }
        self.default_config
            .to_settings()
            .validate()
            .map_err(|e| ConfigurationError::invalid_value("circuit_breakers.default_config", "", e))?;
        for (name, component) in &self.component_configs {
            component.to_settings().validate().map_err(|e| {
                ConfigurationError::invalid_value(
                    format!("circuit_breakers.component_configs.{name}"),
                    "",
                    e,
                )
            })?;
        }
        Ok(())
    }
}

/// Circuit breaker configuration for a single component
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerComponentConfig {
    /// The breaker opens once consecutive failures exceed this value
    pub failure_threshold: u32,

    /// Consecutive half-open successes required to close
    pub success_threshold: u32,

    /// Seconds to stay open before `allow_request` moves to half-open
    pub open_timeout_seconds: u64,
}

impl Default for CircuitBreakerComponentConfig {
    fn default() -> Self {
        Self {
            failure_threshold: defaults::FAILURE_THRESHOLD,
            success_threshold: defaults::SUCCESS_THRESHOLD,
            open_timeout_seconds: defaults::OPEN_TIMEOUT_SECONDS,
        }
    }
}

impl CircuitBreakerComponentConfig {
    /// Convert to the resilience module's runtime settings
    pub fn to_settings(&self) -> CircuitBreakerSettings {
        CircuitBreakerSettings {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            open_timeout: Duration::from_secs(self.open_timeout_seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Sequence gap that must be strictly exceeded before checkpointing
    pub interval: u64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: defaults::CHECKPOINT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Constant speed (distance units per hour) for multi-leg planning
    pub transit_speed: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            transit_speed: defaults::TRANSIT_SPEED,
        }
    }
}

impl RoutingConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.transit_speed.is_finite() || self.transit_speed <= 0.0 {
            return Err(ConfigurationError::invalid_value(
                "routing.transit_speed",
                self.transit_speed.to_string(),
                "transit speed must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_admission_ratio_ordering_enforced() {
        let mut config = CoreConfig::default();
        config.admission.warn_ratio = 0.9;
        config.admission.emergency_ratio = 0.5;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("warn_ratio"));
    }

    #[test]
    fn test_zero_hard_limit_rejected() {
        let mut config = CoreConfig::default();
        config.admission.hard_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_component_override_lookup() {
        let mut config = CircuitBreakerConfig::default();
        config.component_configs.insert(
            "berth_allocator".to_string(),
            CircuitBreakerComponentConfig {
                failure_threshold: 2,
                success_threshold: 1,
                open_timeout_seconds: 5,
            },
        );

        assert_eq!(
            config.config_for_component("berth_allocator").failure_threshold,
            2
        );
        assert_eq!(
            config.config_for_component("unknown").failure_threshold,
            defaults::FAILURE_THRESHOLD
        );
    }

    #[test]
    fn test_invalid_component_override_rejected() {
        let mut config = CoreConfig::default();
        config.circuit_breakers.component_configs.insert(
            "grid_command".to_string(),
            CircuitBreakerComponentConfig {
                failure_threshold: 0,
                ..Default::default()
            },
        );

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("grid_command"));
    }

    #[test]
    fn test_partial_section_deserialization_uses_defaults() {
        let config: CoreConfig =
            serde_json::from_str(r#"{"admission": {"hard_limit": 3}}"#).unwrap();

        assert_eq!(config.admission.hard_limit, 3);
        assert_eq!(config.admission.warn_ratio, defaults::WARN_RATIO);
        assert_eq!(config.policy, PolicyConfig::default());
    }
}
