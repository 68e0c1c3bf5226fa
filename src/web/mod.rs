//! # Web API
//!
//! Axum router over the orchestration managers. Only the core-relevant
//! surface lives here; CRUD for users, tickets and chat is a separate
//! service behind the gateway.

pub mod errors;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use errors::{ApiError, ApiResult};
pub use state::AppState;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/v1/assignments/manual",
            post(handlers::assignments::create_manual),
        )
        .route(
            "/v1/assignments/auto",
            post(handlers::assignments::create_auto),
        )
        .route("/v1/sessions", post(handlers::sessions::create_session))
        .route(
            "/v1/sessions/:session_id/complete",
            post(handlers::sessions::complete_session),
        )
        .route(
            "/v1/sessions/:session_id/fail",
            post(handlers::sessions::fail_session),
        )
        .route("/v1/tasks/accept", post(handlers::tasks::accept_task))
        .route("/v1/tasks/complete", post(handlers::tasks::complete_task))
        .route("/v1/tasks/fail", post(handlers::tasks::fail_task))
        .route("/v1/tasks/refuse", post(handlers::tasks::refuse_task))
        .route("/v1/tasks/postpone", post(handlers::tasks::postpone_task))
        .with_state(state)
}
