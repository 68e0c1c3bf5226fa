use thiserror::Error;

use crate::routing::RoutingError;

/// Errors from the auto-assignment engine
#[derive(Debug, Error)]
pub enum SolverError {
    /// The route matrix service failed or timed out; no partial solution
    /// is fabricated
    #[error("route solver unavailable: {0}")]
    Unavailable(#[from] RoutingError),

    /// The returned matrix does not cover the requested coordinates
    #[error("matrix shape mismatch: requested {expected} waypoints, matrix covers {actual}")]
    MatrixShape { expected: usize, actual: usize },
}

pub type SolverResult<T> = Result<T, SolverError>;
