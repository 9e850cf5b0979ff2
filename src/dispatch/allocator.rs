//! # Dispatch Allocator
//!
//! Configured front for the planning and pricing functions. Holds the
//! deployment's base rate, service time and default capacity so callers only
//! pass the orders.

use super::order::Order;
use super::planner::{dispatch_batch, plan_dispatch, DispatchBatch};
use super::pricing::{allocate_costs, estimate_cost, estimate_turnaround, CostShare, Turnaround};
use crate::config::DispatchConfig;
use crate::error::Result;
use crate::logging::{log_dispatch_operation, log_error};

#[derive(Debug, Clone)]
pub struct DispatchAllocator {
    config: DispatchConfig,
}

impl DispatchAllocator {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Plan with an explicit capacity, or the configured default
    pub fn plan(&self, orders: &[Order], capacity: Option<usize>) -> Vec<Order> {
        plan_dispatch(orders, capacity.unwrap_or(self.config.default_capacity))
    }

    /// Validate and partition a batch, logging the outcome
    pub fn dispatch(&self, orders: &[Order], capacity: Option<usize>) -> Result<DispatchBatch> {
        let capacity = capacity.unwrap_or(self.config.default_capacity);

        match dispatch_batch(orders, capacity) {
            Ok(batch) => {
                log_dispatch_operation(
                    "dispatch_batch",
                    batch.admitted.len(),
                    batch.rejected.len(),
                    capacity,
                    None,
                );
                Ok(batch)
            }
            Err(e) => {
                log_error(
                    "dispatch_allocator",
                    "dispatch_batch",
                    &e.to_string(),
                    Some(&format!("{} orders", orders.len())),
                );
                Err(e)
            }
        }
    }

    pub fn cost(&self, severity: u32, sla_minutes: u32) -> f64 {
        estimate_cost(severity, sla_minutes, self.config.base_rate)
    }

    pub fn allocate(&self, orders: &[Order], budget: f64) -> Vec<CostShare> {
        allocate_costs(orders, budget)
    }

    pub fn turnaround(&self, order: &Order, queue_position: usize) -> Turnaround {
        estimate_turnaround(order, queue_position, self.config.service_minutes)
    }
}

impl Default for DispatchAllocator {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}
