//! Error types for the dispatch core.
//!
//! Capacity conditions on admission (full queue, shed load, rate limiting)
//! are not errors; they are reported through `bool` or decision enums by the
//! components that own them. The one exception is an order released back to
//! a queue that has no room left, which fails with `CapacityExhausted`.

use crate::config::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed input rejected before any state changed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Batch-level integrity violation; nothing from the batch was applied
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Invalid transition for {entity_id}: {from} -> {to}")]
    InvalidTransition {
        entity_id: String,
        from: String,
        to: String,
    },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Operation attempted from a state that does not allow it
    #[error("Cannot {attempted} while in state {current}")]
    InvalidState { attempted: String, current: String },

    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    #[error("Dispatch halted by policy: {0}")]
    PolicyHalted(String),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Service {service} depends on unknown service {dependency}")]
    UnknownDependency { service: String, dependency: String },

    #[error("Dependency cycle detected among services: {remaining:?}")]
    DependencyCycle { remaining: Vec<String> },

    /// A released order could not re-enter the queue; it stays allocated
    #[error("Capacity exhausted: {0}")]
    CapacityExhausted(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<ConfigurationError> for CoreError {
    fn from(error: ConfigurationError) -> Self {
        CoreError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
