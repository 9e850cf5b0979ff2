// Generic entity lifecycle state machine.
//
// A fixed transition graph with a declared initial state and terminal set,
// plus an engine that tracks entities through it. `DispatchState` is the
// built-in lifecycle for dispatched orders.

pub mod engine;
pub mod errors;
pub mod events;
pub mod graph;
pub mod states;

// Re-export main types for convenient access
pub use engine::{TransitionRecord, WorkflowEngine};
pub use errors::TransitionError;
pub use events::DispatchEvent;
pub use graph::{WorkflowGraph, WorkflowGraphBuilder};
pub use states::{DispatchState, LifecycleState};
