use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    DatabaseError(String),
    StateTransitionError(String),
    OrchestrationError(String),
    EventError(String),
    ValidationError(String),
    ConfigurationError(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            DispatchError::StateTransitionError(msg) => write!(f, "State transition error: {msg}"),
            DispatchError::OrchestrationError(msg) => write!(f, "Orchestration error: {msg}"),
            DispatchError::EventError(msg) => write!(f, "Event error: {msg}"),
            DispatchError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            DispatchError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for DispatchError {}

pub type Result<T> = std::result::Result<T, DispatchError>;
