//! # Web API Error Types
//!
//! HTTP mapping for the orchestration error taxonomy. Leverages thiserror
//! for the error enum and Axum's IntoResponse for the wire shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::orchestration::OrchestrationError;
use crate::storage::StorageError;

/// Web API errors with HTTP status code mappings
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found")]
    NotFound,

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Conflicting state: {message}")]
    Conflict { message: String },

    #[error("Dependency unavailable: {message}")]
    DependencyUnavailable { message: String },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(error: OrchestrationError) -> Self {
        match error {
            OrchestrationError::Validation(message) => Self::BadRequest { message },
            OrchestrationError::InvalidState { .. } => Self::Conflict {
                message: error.to_string(),
            },
            OrchestrationError::Solver(e) => Self::DependencyUnavailable {
                message: e.to_string(),
            },
            OrchestrationError::Storage(e) => match e {
                StorageError::NotFound { .. } => Self::NotFound,
                StorageError::Conflict { .. } | StorageError::ActiveSessionExists { .. } => {
                    Self::Conflict {
                        message: e.to_string(),
                    }
                }
                StorageError::Database(_) => Self::Internal,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_code, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found"),
            ApiError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.as_str())
            }
            ApiError::Conflict { message } => (StatusCode::CONFLICT, "CONFLICT", message.as_str()),
            ApiError::DependencyUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DEPENDENCY_UNAVAILABLE",
                message.as_str(),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status_code, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::StateMachineError;
    use uuid::Uuid;

    #[test]
    fn test_orchestration_error_mapping() {
        let validation = OrchestrationError::Validation("empty".to_string());
        assert!(matches!(ApiError::from(validation), ApiError::BadRequest { .. }));

        let invalid = OrchestrationError::InvalidState {
            entity: "assignment",
            source: StateMachineError::invalid_transition("in_progress", "accept"),
        };
        assert!(matches!(ApiError::from(invalid), ApiError::Conflict { .. }));

        let missing = OrchestrationError::Storage(StorageError::not_found("parcel", Uuid::new_v4()));
        assert!(matches!(ApiError::from(missing), ApiError::NotFound));

        let race = OrchestrationError::Storage(StorageError::conflict("session", Uuid::new_v4()));
        assert!(matches!(ApiError::from(race), ApiError::Conflict { .. }));
    }
}
