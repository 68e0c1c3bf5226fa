use thiserror::Error;

use crate::solver::SolverError;
use crate::state_machine::StateMachineError;
use crate::storage::StorageError;

/// Errors surfaced by the orchestration managers
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Bad input shape; surfaced to the client, never retried automatically
    #[error("validation failed: {0}")]
    Validation(String),

    /// An illegal state transition was attempted; the caller must re-fetch
    /// current state before retrying
    #[error("invalid {entity} transition: {source}")]
    InvalidState {
        entity: &'static str,
        #[source]
        source: StateMachineError,
    },

    /// The route matrix dependency failed; the whole solve may be retried
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Storage failure, including optimistic-lock conflicts and the
    /// one-active-session uniqueness violation
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl OrchestrationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Tag a state-machine failure with the entity it was applied to.
    pub fn invalid_state(entity: &'static str) -> impl FnOnce(StateMachineError) -> Self {
        move |source| Self::InvalidState { entity, source }
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
