//! Urgency ordering and capacity-bounded planning.

use super::order::{validate_orders, Order};
use crate::constants::{SLA_PRESSURE, URGENCY_WEIGHT};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ranking value for an order. Each urgency step outweighs the whole SLA
/// term, and within one urgency level a tighter SLA scores higher.
pub fn urgency_score(order: &Order) -> f64 {
    let sla = f64::from(order.sla_minutes.max(1));
    f64::from(order.urgency) * URGENCY_WEIGHT + SLA_PRESSURE / sla
}

/// Score descending, then SLA ascending
pub(crate) fn dispatch_ordering(a: &Order, b: &Order) -> Ordering {
    urgency_score(b)
        .total_cmp(&urgency_score(a))
        .then_with(|| a.sla_minutes.cmp(&b.sla_minutes))
}

/// Highest-ranked `capacity` orders in dispatch order. Capacity zero yields
/// an empty plan. The input is not validated; see [`dispatch_batch`].
pub fn plan_dispatch(orders: &[Order], capacity: usize) -> Vec<Order> {
    let mut ranked: Vec<&Order> = orders.iter().collect();
    ranked.sort_by(|a, b| dispatch_ordering(a, b));
    ranked.into_iter().take(capacity).cloned().collect()
}

/// Exact partition of a batch into admitted and rejected orders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchBatch {
    /// In dispatch order
    pub admitted: Vec<Order>,
    /// In the caller's original order
    pub rejected: Vec<Order>,
}

impl DispatchBatch {
    pub fn admitted_ids(&self) -> Vec<&str> {
        self.admitted.iter().map(|o| o.id.as_str()).collect()
    }

    pub fn rejected_ids(&self) -> Vec<&str> {
        self.rejected.iter().map(|o| o.id.as_str()).collect()
    }
}

/// Validate the batch, then split it into the planned orders and the
/// remainder. Rejected orders keep their input order.
pub fn dispatch_batch(orders: &[Order], capacity: usize) -> Result<DispatchBatch> {
    validate_orders(orders)?;

    let admitted = plan_dispatch(orders, capacity);
    let rejected = orders
        .iter()
        .filter(|order| !admitted.iter().any(|a| a.id == order.id))
        .cloned()
        .collect();

    Ok(DispatchBatch { admitted, rejected })
}
