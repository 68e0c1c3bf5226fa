use thiserror::Error;

/// Errors from the route matrix service adapter
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Transport-level failure reaching the service
    #[error("route matrix service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The bounded request timeout elapsed
    #[error("route matrix request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The service answered without usable matrix data
    #[error("route matrix response is malformed: {reason}")]
    MalformedResponse { reason: String },
}

pub type RoutingResult<T> = Result<T, RoutingError>;
