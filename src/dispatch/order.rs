//! Orders as handed over by the intake boundary, and batch validation.

use crate::constants::{MAX_URGENCY, MIN_SLA_MINUTES, MIN_URGENCY};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A unit of work competing for dispatch capacity. Read-only once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// 1 (lowest) to 5 (highest)
    pub urgency: u8,
    /// Minutes until the service-level deadline, at least 1
    pub sla_minutes: u32,
    pub region: String,
}

impl Order {
    /// Create an order, clamping urgency into `[1, 5]` and the SLA to at
    /// least one minute. Orders deserialized from intake bypass the clamp and
    /// are checked by [`validate_orders`] instead.
    pub fn new(id: impl Into<String>, urgency: i64, sla_minutes: i64, region: impl Into<String>) -> Self {
        let urgency = urgency.clamp(i64::from(MIN_URGENCY), i64::from(MAX_URGENCY)) as u8;
        let sla_minutes = sla_minutes.clamp(i64::from(MIN_SLA_MINUTES), i64::from(u32::MAX)) as u32;
        Self {
            id: id.into(),
            urgency,
            sla_minutes,
            region: region.into(),
        }
    }
}

/// Reject a batch with the first problem found: an empty id, an urgency
/// outside `[1, 5]`, a zero SLA, or an id repeated within the batch (the last
/// is an integrity failure and aborts the batch).
pub fn validate_orders(orders: &[Order]) -> Result<()> {
    let mut seen = HashSet::with_capacity(orders.len());

    for (index, order) in orders.iter().enumerate() {
        if order.id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "order at position {index} has an empty id"
            )));
        }
        if !(MIN_URGENCY..=MAX_URGENCY).contains(&order.urgency) {
            return Err(CoreError::Validation(format!(
                "order {} urgency {} is outside [{MIN_URGENCY}, {MAX_URGENCY}]",
                order.id, order.urgency
            )));
        }
        if order.sla_minutes < MIN_SLA_MINUTES {
            return Err(CoreError::Validation(format!(
                "order {} sla_minutes must be at least {MIN_SLA_MINUTES}",
                order.id
            )));
        }
        if !seen.insert(order.id.as_str()) {
            return Err(CoreError::Integrity(format!(
                "duplicate order id {} in batch",
                order.id
            )));
        }
    }

    Ok(())
}
