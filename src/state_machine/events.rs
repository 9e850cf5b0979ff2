use super::states::DispatchState;
use serde::{Deserialize, Serialize};

/// Events that drive a dispatched order through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DispatchEvent {
    /// Capacity was assigned
    Allocate,
    /// Capacity was handed back; the order waits again
    Release,
    /// The order left
    Depart,
    /// The order reached its destination
    Arrive,
    /// The order was withdrawn
    Cancel,
}

impl DispatchEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Allocate => "allocate",
            Self::Release => "release",
            Self::Depart => "depart",
            Self::Arrive => "arrive",
            Self::Cancel => "cancel",
        }
    }

    /// State the event moves an order into
    pub fn target_state(&self) -> DispatchState {
        match self {
            Self::Allocate => DispatchState::Allocated,
            Self::Release => DispatchState::Queued,
            Self::Depart => DispatchState::Departed,
            Self::Arrive => DispatchState::Arrived,
            Self::Cancel => DispatchState::Cancelled,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        self.target_state().is_terminal()
    }
}
