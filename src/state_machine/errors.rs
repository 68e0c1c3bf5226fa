use thiserror::Error;

/// Errors raised by the pure transition functions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    /// The event is not legal from the current state
    #[error("invalid transition: event '{event}' is not allowed from state '{from}'")]
    InvalidTransition { from: String, event: String },
}

impl StateMachineError {
    /// Build an invalid-transition error from displayable state and event
    pub fn invalid_transition(
        from: impl std::fmt::Display,
        event: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            event: event.to_string(),
        }
    }
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
