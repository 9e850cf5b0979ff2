//! # Circuit Breaker Manager
//!
//! Named circuit breakers for system components, created lazily from
//! configuration, with centralized control and metrics aggregation.

use super::circuit_breaker::CircuitBreaker;
use super::metrics::{CircuitBreakerMetrics, SystemCircuitBreakerMetrics};
use crate::config::CircuitBreakerConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct CircuitBreakerManager {
    circuit_breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerManager {
    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        info!(
            enabled = config.enabled,
            components = config.component_configs.len(),
            "Initializing circuit breaker manager"
        );

        Self {
            circuit_breakers: RwLock::new(HashMap::new()),
            config: config.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Get or create the breaker for a component
    pub fn get_circuit_breaker(&self, component_name: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.circuit_breakers.read().get(component_name) {
            return Arc::clone(breaker);
        }

        let mut breakers = self.circuit_breakers.write();

        // another caller may have created it between the two locks
        if let Some(breaker) = breakers.get(component_name) {
            return Arc::clone(breaker);
        }

        if breakers.len() >= self.config.max_circuit_breakers {
            warn!(
                component = component_name,
                current_count = breakers.len(),
                max_allowed = self.config.max_circuit_breakers,
                "Maximum circuit breaker limit reached"
            );
        }

        let settings = self.config.config_for_component(component_name).to_settings();
        let breaker = Arc::new(CircuitBreaker::new(component_name, settings));
        breakers.insert(component_name.to_string(), Arc::clone(&breaker));

        info!(
            component = component_name,
            total_circuit_breakers = breakers.len(),
            "Created new circuit breaker"
        );

        breaker
    }

    /// Component names, sorted
    pub fn list_components(&self) -> Vec<String> {
        let mut names: Vec<String> = self.circuit_breakers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get_component_metrics(&self, component_name: &str) -> Option<CircuitBreakerMetrics> {
        let breaker = self.circuit_breakers.read().get(component_name).cloned();
        breaker.map(|b| b.metrics())
    }

    pub fn get_system_metrics(&self) -> SystemCircuitBreakerMetrics {
        let mut system_metrics = SystemCircuitBreakerMetrics::new();
        for (name, breaker) in self.snapshot() {
            system_metrics.add_circuit_breaker(name, breaker.metrics());
        }
        system_metrics
    }

    /// Force open all circuit breakers (emergency stop)
    pub fn force_open_all(&self) {
        warn!("Forcing all circuit breakers open (emergency stop)");
        for (_, breaker) in self.snapshot() {
            breaker.force_open();
        }
    }

    /// Force close all circuit breakers (emergency recovery)
    pub fn force_close_all(&self) {
        warn!("Forcing all circuit breakers closed (emergency recovery)");
        for (_, breaker) in self.snapshot() {
            breaker.force_closed();
        }
    }

    pub fn remove_circuit_breaker(&self, component_name: &str) -> bool {
        let mut breakers = self.circuit_breakers.write();
        if breakers.remove(component_name).is_some() {
            info!(
                component = component_name,
                remaining_count = breakers.len(),
                "Removed circuit breaker"
            );
            true
        } else {
            false
        }
    }

    /// Copy the breaker handles out so no breaker lock is taken while the
    /// map lock is held
    fn snapshot(&self) -> Vec<(String, Arc<CircuitBreaker>)> {
        self.circuit_breakers
            .read()
            .iter()
            .map(|(name, breaker)| (name.clone(), Arc::clone(breaker)))
            .collect()
    }
}
