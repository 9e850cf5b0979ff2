use super::graph::WorkflowGraph;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// A state usable in a [`WorkflowGraph`]
pub trait LifecycleState: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> LifecycleState for T where T: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// Lifecycle of a dispatched order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    /// Admitted and waiting for an allocation
    Queued,
    /// Holding a berth/slot/crew
    Allocated,
    /// Under way
    Departed,
    /// Delivered
    Arrived,
    /// Withdrawn before arrival
    Cancelled,
}

impl DispatchState {
    pub const ALL: [DispatchState; 5] = [
        DispatchState::Queued,
        DispatchState::Allocated,
        DispatchState::Departed,
        DispatchState::Arrived,
        DispatchState::Cancelled,
    ];

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Arrived | Self::Cancelled)
    }

    /// The dispatch lifecycle graph:
    ///
    /// ```text
    /// queued ----> allocated ----> departed ----> arrived
    ///  |  ^            |
    ///  |  +-(release)--+
    ///  |               |
    ///  +---------------+----> cancelled
    /// ```
    pub fn workflow_graph() -> Result<WorkflowGraph<DispatchState>> {
        WorkflowGraph::builder(Self::Queued)
            .edge(Self::Queued, Self::Allocated)
            .edge(Self::Queued, Self::Cancelled)
            .edge(Self::Allocated, Self::Departed)
            .edge(Self::Allocated, Self::Queued)
            .edge(Self::Allocated, Self::Cancelled)
            .edge(Self::Departed, Self::Arrived)
            .terminal(Self::Arrived)
            .terminal(Self::Cancelled)
            .build()
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Allocated => write!(f, "allocated"),
            Self::Departed => write!(f, "departed"),
            Self::Arrived => write!(f, "arrived"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for DispatchState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "allocated" => Ok(Self::Allocated),
            "departed" => Ok(Self::Departed),
            "arrived" => Ok(Self::Arrived),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid dispatch state: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_flags_match_graph() {
        let graph = DispatchState::workflow_graph().unwrap();
        for state in DispatchState::ALL {
            assert_eq!(state.is_terminal(), graph.is_terminal(state), "{state}");
        }
    }

    #[test]
    fn test_string_round_trip() {
        for state in DispatchState::ALL {
            assert_eq!(state.to_string().parse::<DispatchState>().unwrap(), state);
        }
        assert!("lost".parse::<DispatchState>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&DispatchState::Departed).unwrap(),
            "\"departed\""
        );
    }
}
