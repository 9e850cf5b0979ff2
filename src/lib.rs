#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatch Core
//!
//! Command/control core for operations platforms: priority-based admission
//! under capacity limits, circuit breaking, token-bucket rate limiting,
//! idempotent event replay and entity lifecycle tracking.
//!
//! ## Overview
//!
//! The core is domain-agnostic over "orders", "corridors" and "entities".
//! Transport, persistence and service discovery live outside it; callers hand
//! in pre-typed records and read decisions back. Everything runs in-process
//! and synchronously. Shared structures are guarded by one lock each and no
//! operation holds two of them at once.
//!
//! ## Module Organization
//!
//! - [`statistics`] - Percentile, mean, variance and moving averages
//! - [`registry`] - Service catalog and startup ordering
//! - [`routing`] - Corridor routes, best-route selection, transit planning
//! - [`dispatch`] - Order planning, validation, pricing and turnaround
//! - [`admission`] - Load shedding, bounded priority queue, rate limiting, queue health
//! - [`policy`] - Escalation ladder
//! - [`resilience`] - Circuit breakers, replay and checkpoints
//! - [`state_machine`] - Workflow graph and entity lifecycle engine
//! - [`orchestration`] - Coordinator composing the components
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured `tracing` setup
//!
//! ## Quick Start
//!
//! ```rust
//! use dispatch_core::config::CoreConfig;
//! use dispatch_core::dispatch::Order;
//! use dispatch_core::orchestration::DispatchCoordinator;
//! use std::time::Instant;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = DispatchCoordinator::new(&CoreConfig::default())?;
//!
//! let orders = vec![
//!     Order::new("A", 5, 10, "north"),
//!     Order::new("B", 5, 60, "north"),
//!     Order::new("C", 1, 5, "south"),
//! ];
//! let report = coordinator.submit_batch(&orders, Some(2), Instant::now())?;
//!
//! assert_eq!(report.queued, vec!["A", "B"]);
//! assert_eq!(report.rejected, vec!["C"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod admission;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod orchestration;
pub mod policy;
pub mod registry;
pub mod resilience;
pub mod routing;
pub mod state_machine;
pub mod statistics;

pub use admission::{AdmissionDecision, HealthStatus, QueueGuard};
pub use config::{ConfigManager, CoreConfig};
pub use dispatch::{DispatchAllocator, Order};
pub use error::{CoreError, Result};
pub use orchestration::DispatchCoordinator;
pub use policy::{PolicyEngine, PolicyLevel};
pub use registry::{ServiceDefinition, ServiceRegistry};
pub use resilience::{CircuitBreaker, CircuitState};
pub use routing::{Route, RoutingTable};
pub use state_machine::{DispatchState, WorkflowEngine};
