//! # Workflow Engine
//!
//! Tracks the lifecycle state of registered entities against a fixed
//! [`WorkflowGraph`]. Every successful transition is appended to an audit
//! history; a refused transition changes nothing.

use super::errors::TransitionError;
use super::graph::WorkflowGraph;
use super::states::LifecycleState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Audit entry for one successful transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord<S> {
    pub entity_id: String,
    pub from: S,
    pub to: S,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
struct EngineState<S: LifecycleState> {
    entities: HashMap<String, S>,
    history: Vec<TransitionRecord<S>>,
}

#[derive(Debug)]
pub struct WorkflowEngine<S: LifecycleState> {
    graph: WorkflowGraph<S>,
    state: Mutex<EngineState<S>>,
}

impl<S: LifecycleState> WorkflowEngine<S> {
    pub fn new(graph: WorkflowGraph<S>) -> Self {
        Self {
            graph,
            state: Mutex::new(EngineState {
                entities: HashMap::new(),
                history: Vec::new(),
            }),
        }
    }

    pub fn graph(&self) -> &WorkflowGraph<S> {
        &self.graph
    }

    /// Start tracking an entity in the graph's initial state
    pub fn register(&self, entity_id: &str) -> Result<S, TransitionError<S>> {
        let mut state = self.state.lock();
        if state.entities.contains_key(entity_id) {
            return Err(TransitionError::AlreadyRegistered {
                entity_id: entity_id.to_string(),
            });
        }
        let initial = self.graph.initial();
        state.entities.insert(entity_id.to_string(), initial);

        debug!(entity_id = %entity_id, state = %initial, "Entity registered");
        Ok(initial)
    }

    /// Register every id or none of them. Duplicates within `entity_ids`
    /// count as already registered.
    pub fn register_all<I, T>(&self, entity_ids: I) -> Result<S, TransitionError<S>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let ids: Vec<T> = entity_ids.into_iter().collect();
        let mut state = self.state.lock();

        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            let id = id.as_ref();
            if state.entities.contains_key(id) || !seen.insert(id) {
                return Err(TransitionError::AlreadyRegistered {
                    entity_id: id.to_string(),
                });
            }
        }

        let initial = self.graph.initial();
        for id in &ids {
            state.entities.insert(id.as_ref().to_string(), initial);
        }

        debug!(count = ids.len(), state = %initial, "Entities registered");
        Ok(initial)
    }

    pub fn state_of(&self, entity_id: &str) -> Option<S> {
        self.state.lock().entities.get(entity_id).copied()
    }

    /// Move an entity to `to` if the graph allows it from its current state
    pub fn transition(
        &self,
        entity_id: &str,
        to: S,
        timestamp: DateTime<Utc>,
    ) -> Result<TransitionRecord<S>, TransitionError<S>> {
        let mut state = self.state.lock();
        let current = *state
            .entities
            .get(entity_id)
            .ok_or_else(|| TransitionError::EntityNotFound {
                entity_id: entity_id.to_string(),
            })?;

        if !self.graph.can_transition(current, to) {
            debug!(
                entity_id = %entity_id,
                current = %current,
                attempted = %to,
                "Transition refused"
            );
            return Err(TransitionError::IllegalTransition {
                entity_id: entity_id.to_string(),
                current,
                attempted: to,
            });
        }

        state.entities.insert(entity_id.to_string(), to);
        let record = TransitionRecord {
            entity_id: entity_id.to_string(),
            from: current,
            to,
            timestamp,
        };
        state.history.push(record.clone());

        info!(
            entity_id = %entity_id,
            from = %current,
            to = %to,
            terminal = self.graph.is_terminal(to),
            "Entity transitioned"
        );
        Ok(record)
    }

    pub fn can_transition(&self, from: S, to: S) -> bool {
        self.graph.can_transition(from, to)
    }

    pub fn allowed_from(&self, state: S) -> Vec<S> {
        self.graph.allowed_from(state).to_vec()
    }

    pub fn is_terminal(&self, state: S) -> bool {
        self.graph.is_terminal(state)
    }

    pub fn shortest_path(&self, from: S, to: S) -> Option<Vec<S>> {
        self.graph.shortest_path(from, to)
    }

    /// Full transition history in the order transitions happened
    pub fn history(&self) -> Vec<TransitionRecord<S>> {
        self.state.lock().history.clone()
    }

    pub fn history_for(&self, entity_id: &str) -> Vec<TransitionRecord<S>> {
        self.state
            .lock()
            .history
            .iter()
            .filter(|record| record.entity_id == entity_id)
            .cloned()
            .collect()
    }

    /// Stop tracking an entity. Its history is kept.
    pub fn remove(&self, entity_id: &str) -> Option<S> {
        self.state.lock().entities.remove(entity_id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entities.is_empty()
    }

    /// Forget every entity and the history
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entities.clear();
        state.history.clear();
    }
}
