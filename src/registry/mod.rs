//! # Registry Infrastructure
//!
//! Catalogs consulted by the core. Currently a single registry:
//!
//! - **ServiceRegistry**: logical service nodes, their declared dependencies
//!   and the startup order derived from them
//!
//! The registry boundary exposed to bootstrapping code is `all()`,
//! `validate_contract(name)` and `topological_order()`.

pub mod service_registry;

pub use service_registry::{ServiceDefinition, ServiceRegistry};
