//! # Circuit Breaker Metrics
//!
//! Point-in-time snapshots of circuit breaker counters, per breaker and
//! aggregated across a [`super::CircuitBreakerManager`].

use super::circuit_breaker::CircuitState;
use crate::statistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Metrics for a single circuit breaker instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Total number of recorded outcomes
    pub total_calls: u64,

    /// Number of successful calls
    pub success_count: u64,

    /// Number of failed calls
    pub failure_count: u64,

    /// Current consecutive failure count
    pub consecutive_failures: u64,

    /// Consecutive successes while half-open
    pub half_open_successes: u64,

    /// Total duration of all guarded operations
    pub total_duration: Duration,

    pub current_state: CircuitState,

    /// Calculated failure rate (0.0 to 1.0)
    pub failure_rate: f64,

    /// Calculated success rate (0.0 to 1.0)
    pub success_rate: f64,

    /// Average operation duration
    pub average_duration: Duration,
}

impl CircuitBreakerMetrics {
    pub(crate) fn from_counts(
        current_state: CircuitState,
        total_calls: u64,
        success_count: u64,
        failure_count: u64,
        consecutive_failures: u64,
        half_open_successes: u64,
        total_duration: Duration,
    ) -> Self {
        let (failure_rate, success_rate, average_duration) = if total_calls > 0 {
            let calls = u32::try_from(total_calls).unwrap_or(u32::MAX);
            (
                failure_count as f64 / total_calls as f64,
                success_count as f64 / total_calls as f64,
                total_duration / calls,
            )
        } else {
            (0.0, 0.0, Duration::ZERO)
        };

        Self {
            total_calls,
            success_count,
            failure_count,
            consecutive_failures,
            half_open_successes,
            total_duration,
            current_state,
            failure_rate,
            success_rate,
            average_duration,
        }
    }

    /// Check if metrics indicate healthy operation
    pub fn is_healthy(&self) -> bool {
        match self.current_state {
            CircuitState::Closed => self.failure_rate < 0.1,
            CircuitState::Open => false,
            CircuitState::HalfOpen => true,
        }
    }
}

impl Default for CircuitBreakerMetrics {
    fn default() -> Self {
        Self::from_counts(CircuitState::Closed, 0, 0, 0, 0, 0, Duration::ZERO)
    }
}

/// System-wide circuit breaker metrics aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemCircuitBreakerMetrics {
    /// Metrics for individual circuit breakers by name
    pub circuit_breakers: HashMap<String, CircuitBreakerMetrics>,

    pub collected_at: DateTime<Utc>,
}

impl SystemCircuitBreakerMetrics {
    pub fn new() -> Self {
        Self {
            circuit_breakers: HashMap::new(),
            collected_at: Utc::now(),
        }
    }

    pub fn add_circuit_breaker(&mut self, name: String, metrics: CircuitBreakerMetrics) {
        self.circuit_breakers.insert(name, metrics);
        self.collected_at = Utc::now();
    }

    pub fn count_by_state(&self) -> HashMap<CircuitState, usize> {
        let mut counts = HashMap::new();
        for metrics in self.circuit_breakers.values() {
            *counts.entry(metrics.current_state).or_insert(0) += 1;
        }
        counts
    }

    /// Unhealthy breakers, sorted by name
    pub fn unhealthy_circuits(&self) -> Vec<(&String, &CircuitBreakerMetrics)> {
        let mut unhealthy: Vec<_> = self
            .circuit_breakers
            .iter()
            .filter(|(_, metrics)| !metrics.is_healthy())
            .collect();
        unhealthy.sort_by(|a, b| a.0.cmp(b.0));
        unhealthy
    }

    pub fn total_calls(&self) -> u64 {
        self.circuit_breakers.values().map(|m| m.total_calls).sum()
    }

    /// Nearest-rank percentile of the per-breaker failure rates. `None`
    /// before any breaker has been created.
    pub fn failure_rate_percentile(&self, pct: f64) -> Option<f64> {
        let rates: Vec<f64> = self
            .circuit_breakers
            .values()
            .map(|metrics| metrics.failure_rate)
            .collect();
        statistics::percentile(&rates, pct)
    }

    /// True when no breaker is unhealthy
    pub fn overall_health(&self) -> bool {
        self.circuit_breakers.values().all(CircuitBreakerMetrics::is_healthy)
    }
}

impl Default for SystemCircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_from_counts() {
        let metrics = CircuitBreakerMetrics::from_counts(
            CircuitState::Closed,
            20,
            19,
            1,
            0,
            0,
            Duration::from_millis(200),
        );
        assert!((metrics.failure_rate - 0.05).abs() < 1e-9);
        assert_eq!(metrics.average_duration, Duration::from_millis(10));
        assert!(metrics.is_healthy());
    }

    #[test]
    fn test_system_aggregation() {
        let mut system = SystemCircuitBreakerMetrics::new();
        system.add_circuit_breaker("berths".to_string(), CircuitBreakerMetrics::default());
        system.add_circuit_breaker(
            "grid".to_string(),
            CircuitBreakerMetrics::from_counts(CircuitState::Open, 6, 0, 6, 6, 0, Duration::ZERO),
        );

        assert_eq!(system.total_calls(), 6);
        assert_eq!(system.count_by_state().get(&CircuitState::Open), Some(&1));
        assert!(!system.overall_health());
        let unhealthy = system.unhealthy_circuits();
        assert_eq!(unhealthy.len(), 1);
        assert_eq!(unhealthy[0].0, "grid");
    }

    #[test]
    fn test_failure_rate_percentile_across_breakers() {
        let mut system = SystemCircuitBreakerMetrics::new();
        assert_eq!(system.failure_rate_percentile(95.0), None);

        for (name, failures) in [("berths", 0), ("grid", 1), ("tugs", 4), ("pilots", 10)] {
            system.add_circuit_breaker(
                name.to_string(),
                CircuitBreakerMetrics::from_counts(
                    CircuitState::Closed,
                    10,
                    10 - failures,
                    failures,
                    0,
                    0,
                    Duration::ZERO,
                ),
            );
        }

        assert_eq!(system.failure_rate_percentile(50.0), Some(0.1));
        assert_eq!(system.failure_rate_percentile(100.0), Some(1.0));
        assert_eq!(system.failure_rate_percentile(0.0), Some(0.0));
    }
}
