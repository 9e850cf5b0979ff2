//! # Dispatch Allocation
//!
//! Turns a backlog of prioritized orders and a capacity bound into an admitted
//! batch and a rejected remainder, and prices the result.
//!
//! ## Ordering
//!
//! Orders rank by urgency score descending, ties broken by the shorter SLA.
//! The score weights one urgency step above any SLA contribution, so a
//! priority-5 order always outranks a priority-4 order.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::dispatch::{dispatch_batch, Order};
//!
//! let orders = vec![
//!     Order::new("A", 5, 10, "north"),
//!     Order::new("B", 5, 60, "north"),
//!     Order::new("C", 1, 5, "south"),
//! ];
//! let batch = dispatch_batch(&orders, 2).unwrap();
//! assert_eq!(batch.admitted_ids(), vec!["A", "B"]);
//! assert_eq!(batch.rejected_ids(), vec!["C"]);
//! ```

pub mod allocator;
pub mod order;
pub mod planner;
pub mod pricing;

pub use allocator::DispatchAllocator;
pub use order::{validate_orders, Order};
pub use planner::{dispatch_batch, plan_dispatch, urgency_score, DispatchBatch};
pub use pricing::{
    allocate_costs, estimate_cost, estimate_turnaround, urgency_factor, CostShare, Turnaround,
};
