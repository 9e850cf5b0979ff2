//! Cost estimation, budget allocation and turnaround estimates.

use super::order::Order;
use super::planner::urgency_score;
use crate::constants::{cost_tiers, COST_SCALE};
use serde::{Deserialize, Serialize};

/// Urgency multiplier for an SLA window. Bands are `<= 15`, `<= 30`, `<= 60`
/// minutes, then everything above.
pub fn urgency_factor(sla_minutes: u32) -> f64 {
    cost_tiers::TIERS
        .iter()
        .find(|tier| sla_minutes <= tier.max_sla_minutes)
        .map(|tier| tier.factor)
        .unwrap_or(cost_tiers::STANDARD_FACTOR)
}

/// `base_rate / severity`, scaled by the SLA band factor. Severity below one
/// is treated as one.
pub fn estimate_cost(severity: u32, sla_minutes: u32, base_rate: f64) -> f64 {
    let severity = f64::from(severity.max(1));
    base_rate / severity * urgency_factor(sla_minutes)
}

/// One order's slice of a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostShare {
    pub id: String,
    pub share: f64,
}

/// Split `budget` across orders in proportion to their urgency scores.
///
/// Shares are rounded to cents with the largest-remainder method, so they sum
/// to the budget rounded to the nearest cent. A non-positive or non-finite
/// budget, or a zero total score, gives every order a zero share.
pub fn allocate_costs(orders: &[Order], budget: f64) -> Vec<CostShare> {
    let scores: Vec<f64> = orders.iter().map(urgency_score).collect();
    let total: f64 = scores.iter().sum();

    if !budget.is_finite() || budget <= 0.0 || total <= 0.0 {
        return orders
            .iter()
            .map(|order| CostShare {
                id: order.id.clone(),
                share: 0.0,
            })
            .collect();
    }

    let budget_units = (budget * COST_SCALE).round() as i64;
    let exact: Vec<f64> = scores
        .iter()
        .map(|score| score / total * budget_units as f64)
        .collect();
    let mut units: Vec<i64> = exact.iter().map(|value| value.floor() as i64).collect();

    let assigned: i64 = units.iter().sum();
    let mut leftover = (budget_units - assigned).max(0) as usize;

    let mut by_remainder: Vec<usize> = (0..exact.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then_with(|| a.cmp(&b))
    });
    for index in by_remainder {
        if leftover == 0 {
            break;
        }
        units[index] += 1;
        leftover -= 1;
    }

    orders
        .iter()
        .zip(units)
        .map(|(order, units)| CostShare {
            id: order.id.clone(),
            share: units as f64 / COST_SCALE,
        })
        .collect()
}

/// When an order would start and finish given its position in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turnaround {
    pub start_offset_minutes: u64,
    pub completion_minutes: u64,
    pub meets_sla: bool,
}

/// Orders ahead of `queue_position` (zero-based) are each served for
/// `service_minutes`; the order finishes one service slot after it starts.
pub fn estimate_turnaround(order: &Order, queue_position: usize, service_minutes: u32) -> Turnaround {
    let service = u64::from(service_minutes);
    let start_offset_minutes = (queue_position as u64).saturating_mul(service);
    let completion_minutes = start_offset_minutes.saturating_add(service);

    Turnaround {
        start_offset_minutes,
        completion_minutes,
        meets_sla: completion_minutes <= u64::from(order.sla_minutes),
    }
}
