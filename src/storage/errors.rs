use thiserror::Error;
use uuid::Uuid;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Optimistic version check failed; the caller must re-fetch and retry
    #[error("concurrent modification of {entity} {id}")]
    Conflict { entity: &'static str, id: Uuid },

    /// The one-active-session-per-shipper invariant would be violated
    #[error("shipper {shipper_id} already has active session {session_id}")]
    ActiveSessionExists { shipper_id: Uuid, session_id: Uuid },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(entity: &'static str, id: Uuid) -> Self {
        Self::Conflict { entity, id }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
