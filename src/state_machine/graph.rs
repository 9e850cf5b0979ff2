//! Fixed transition graph with a declared initial state and terminal set.

use super::states::LifecycleState;
use crate::error::{CoreError, Result};
use std::collections::{HashMap, HashSet, VecDeque};

/// Directed graph of legal transitions. Terminal membership is declared, not
/// inferred: a state with no outgoing edges is not terminal unless marked.
#[derive(Debug, Clone)]
pub struct WorkflowGraph<S: LifecycleState> {
    initial: S,
    terminals: HashSet<S>,
    /// Outgoing edges in declaration order
    edges: HashMap<S, Vec<S>>,
}

#[derive(Debug)]
pub struct WorkflowGraphBuilder<S: LifecycleState> {
    initial: S,
    terminals: HashSet<S>,
    edges: HashMap<S, Vec<S>>,
}

impl<S: LifecycleState> WorkflowGraphBuilder<S> {
    pub fn edge(mut self, from: S, to: S) -> Self {
        let targets = self.edges.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
        self
    }

    pub fn terminal(mut self, state: S) -> Self {
        self.terminals.insert(state);
        self
    }

    /// Fails if a terminal state has outgoing edges or the initial state is
    /// terminal
    pub fn build(self) -> Result<WorkflowGraph<S>> {
        if self.terminals.contains(&self.initial) {
            return Err(CoreError::Validation(format!(
                "initial state {} cannot be terminal",
                self.initial
            )));
        }
        for terminal in &self.terminals {
            if self.edges.get(terminal).is_some_and(|targets| !targets.is_empty()) {
                return Err(CoreError::Validation(format!(
                    "terminal state {terminal} declares outgoing transitions"
                )));
            }
        }

        Ok(WorkflowGraph {
            initial: self.initial,
            terminals: self.terminals,
            edges: self.edges,
        })
    }
}

impl<S: LifecycleState> WorkflowGraph<S> {
    pub fn builder(initial: S) -> WorkflowGraphBuilder<S> {
        WorkflowGraphBuilder {
            initial,
            terminals: HashSet::new(),
            edges: HashMap::new(),
        }
    }

    pub fn initial(&self) -> S {
        self.initial
    }

    pub fn is_terminal(&self, state: S) -> bool {
        self.terminals.contains(&state)
    }

    pub fn can_transition(&self, from: S, to: S) -> bool {
        self.allowed_from(from).contains(&to)
    }

    /// Legal targets from `state`, in declaration order
    pub fn allowed_from(&self, state: S) -> &[S] {
        self.edges.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Minimal sequence of states from `from` to `to`, both included.
    /// `Some(vec![from])` when they are equal, `None` when unreachable.
    pub fn shortest_path(&self, from: S, to: S) -> Option<Vec<S>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut previous: HashMap<S, S> = HashMap::new();
        let mut visited: HashSet<S> = HashSet::from([from]);
        let mut frontier = VecDeque::from([from]);

        while let Some(current) = frontier.pop_front() {
            for &next in self.allowed_from(current) {
                if !visited.insert(next) {
                    continue;
                }
                previous.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut cursor = to;
                    while let Some(&prior) = previous.get(&cursor) {
                        path.push(prior);
                        cursor = prior;
                    }
                    path.reverse();
                    return Some(path);
                }
                frontier.push_back(next);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::DispatchState::{self, *};

    fn graph() -> WorkflowGraph<DispatchState> {
        DispatchState::workflow_graph().unwrap()
    }

    #[test]
    fn test_can_transition_is_graph_lookup() {
        let graph = graph();
        assert!(graph.can_transition(Queued, Allocated));
        assert!(graph.can_transition(Allocated, Queued));
        assert!(!graph.can_transition(Queued, Arrived));
        assert!(!graph.can_transition(Arrived, Queued));
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        let graph = graph();
        for state in DispatchState::ALL {
            if graph.is_terminal(state) {
                assert!(graph.allowed_from(state).is_empty());
            }
        }
    }

    #[test]
    fn test_shortest_path() {
        let graph = graph();
        assert_eq!(
            graph.shortest_path(Queued, Arrived),
            Some(vec![Queued, Allocated, Departed, Arrived])
        );
        assert_eq!(graph.shortest_path(Departed, Departed), Some(vec![Departed]));
        assert_eq!(graph.shortest_path(Departed, Queued), None);
        assert_eq!(graph.shortest_path(Cancelled, Queued), None);
    }

    #[test]
    fn test_undeclared_dead_end_is_not_terminal() {
        let graph = WorkflowGraph::builder(Queued)
            .edge(Queued, Allocated)
            .terminal(Arrived)
            .build()
            .unwrap();
        assert!(graph.allowed_from(Allocated).is_empty());
        assert!(!graph.is_terminal(Allocated));
    }

    #[test]
    fn test_terminal_with_outgoing_edges_rejected() {
        let result = WorkflowGraph::builder(Queued)
            .edge(Arrived, Queued)
            .terminal(Arrived)
            .build();
        assert!(matches!(result, Err(CoreError::Validation(_))));

        assert!(WorkflowGraph::builder(Queued).terminal(Queued).build().is_err());
    }
}
