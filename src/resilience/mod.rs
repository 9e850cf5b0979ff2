//! # Resilience Module
//!
//! Fault tolerance for the dispatch core.
//!
//! ## Architecture
//!
//! - **Circuit Breakers**: fail fast after repeated failures, trial calls for recovery
//! - **Manager**: named breakers built from configuration, with aggregated metrics
//! - **Replay**: idempotent merge of event logs
//! - **Checkpoints**: last processed sequence per stream
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::resilience::{CircuitBreaker, CircuitBreakerSettings, CircuitState};
//! use std::time::Duration;
//!
//! let settings = CircuitBreakerSettings {
//!     failure_threshold: 2,
//!     success_threshold: 1,
//!     open_timeout: Duration::from_secs(30),
//! };
//! let breaker = CircuitBreaker::new("berth_allocator", settings);
//!
//! let result = breaker.call(|| Ok::<_, String>("allocated"));
//! assert_eq!(result.unwrap(), "allocated");
//!
//! for _ in 0..3 {
//!     breaker.record_failure();
//! }
//! assert_eq!(breaker.state(), CircuitState::Open);
//! ```

pub mod checkpoint;
pub mod circuit_breaker;
pub mod manager;
pub mod metrics;
pub mod replay;
pub mod settings;

#[cfg(test)]
mod toml_config_test;

pub use checkpoint::{Checkpoint, CheckpointManager};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use manager::CircuitBreakerManager;
pub use metrics::{CircuitBreakerMetrics, SystemCircuitBreakerMetrics};
pub use replay::{deduplicate, replay, replay_since, ReplayEvent};
pub use settings::CircuitBreakerSettings;
