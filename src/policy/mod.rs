//! # Policy Engine
//!
//! Ordered escalation ladder `normal -> watch -> restricted -> halted` driven
//! by failure bursts and success streaks.

pub mod engine;
pub mod level;

pub use engine::{PolicyChange, PolicyEngine};
pub use level::PolicyLevel;
