//! # Orchestration
//!
//! The higher-level coordinator that composes allocator, admission control,
//! workflow tracking, policy and resilience into a single dispatch flow.
//!
//! ## Core Components
//!
//! - **DispatchCoordinator**: submits batches, advances tracked orders and
//!   feeds outcomes back into the policy ladder and circuit breaker

pub mod dispatch_coordinator;

pub use dispatch_coordinator::{
    CoordinatorHealth, DispatchCoordinator, RefusedOrder, SubmissionReport, DISPATCH_COMPONENT,
};
