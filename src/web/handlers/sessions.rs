//! # Session Handlers
//!
//! HTTP endpoints for session creation and closure.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::models::DeliverySession;
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

/// Request body for POST /v1/sessions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub delivery_man_id: Uuid,
    pub assignment_ids: Vec<Uuid>,
}

/// Request body for POST /v1/sessions/{id}/fail
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailSessionRequest {
    pub reason: String,
}

/// Create a session: POST /v1/sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<DeliverySession>)> {
    info!(
        delivery_man_id = %request.delivery_man_id,
        assignments = request.assignment_ids.len(),
        "session creation requested"
    );

    let session = state
        .sessions
        .create_session(request.delivery_man_id, &request.assignment_ids)
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Complete a session: POST /v1/sessions/{id}/complete
pub async fn complete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<DeliverySession>> {
    let session = state.sessions.complete_session(session_id).await?;
    Ok(Json(session))
}

/// Fail a session with a reason: POST /v1/sessions/{id}/fail
pub async fn fail_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<FailSessionRequest>,
) -> ApiResult<Json<DeliverySession>> {
    let session = state
        .sessions
        .fail_session(session_id, request.reason)
        .await?;
    Ok(Json(session))
}
