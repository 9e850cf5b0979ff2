#![allow(dead_code)]

pub mod strategies;

use dispatch_core::config::{CircuitBreakerComponentConfig, CoreConfig};
use dispatch_core::dispatch::Order;

pub use strategies::*;

/// Configuration with rate limiting off and small, predictable thresholds
pub fn test_config() -> CoreConfig {
    let mut config = CoreConfig::default();
    config.rate_limit.enabled = false;
    config.admission.hard_limit = 10;
    config.policy.sensitivity = 1;
    config.circuit_breakers.default_config = CircuitBreakerComponentConfig {
        failure_threshold: 3,
        success_threshold: 2,
        open_timeout_seconds: 1,
    };
    config
}

/// The A/B/C backlog used across scenario tests
pub fn abc_orders() -> Vec<Order> {
    vec![
        Order::new("A", 5, 10, "north"),
        Order::new("B", 5, 60, "north"),
        Order::new("C", 1, 5, "south"),
    ]
}
