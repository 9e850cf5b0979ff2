use super::states::LifecycleState;
use crate::error::CoreError;
use thiserror::Error;

/// Failure of a workflow operation. State is never modified when returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError<S: LifecycleState> {
    #[error("Entity {entity_id} is not registered")]
    EntityNotFound { entity_id: String },

    #[error("Entity {entity_id} is already registered")]
    AlreadyRegistered { entity_id: String },

    #[error("Illegal transition for {entity_id}: {current} -> {attempted}")]
    IllegalTransition {
        entity_id: String,
        current: S,
        attempted: S,
    },
}

impl<S: LifecycleState> From<TransitionError<S>> for CoreError {
    fn from(error: TransitionError<S>) -> Self {
        match error {
            TransitionError::EntityNotFound { entity_id } => CoreError::EntityNotFound(entity_id),
            TransitionError::AlreadyRegistered { entity_id } => {
                CoreError::Integrity(format!("entity {entity_id} is already registered"))
            }
            TransitionError::IllegalTransition {
                entity_id,
                current,
                attempted,
            } => CoreError::InvalidTransition {
                entity_id,
                from: current.to_string(),
                to: attempted.to_string(),
            },
        }
    }
}
