//! # Task Action Handlers
//!
//! Shipper task actions keyed by (deliveryManId, parcelId). The parcel id
//! resolves to its currently bound assignment; actions without a bound
//! assignment answer 404.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::DeliveryAssignment;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Common body for accept/complete/refuse actions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskActionRequest {
    pub delivery_man_id: Uuid,
    pub parcel_id: Uuid,
}

/// Body for the fail action
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailTaskRequest {
    pub delivery_man_id: Uuid,
    pub parcel_id: Uuid,
    pub reason: String,
}

/// Body for the postpone action
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostponeTaskRequest {
    pub delivery_man_id: Uuid,
    pub parcel_id: Uuid,
    pub requested_time: DateTime<Utc>,
    pub reason: String,
}

async fn resolve_assignment(state: &AppState, parcel_id: Uuid) -> ApiResult<Uuid> {
    let assignment = state
        .store
        .find_assignment_by_parcel(parcel_id)
        .await
        .map_err(crate::orchestration::OrchestrationError::from)?;
    assignment
        .map(|a| a.assignment_id)
        .ok_or(ApiError::NotFound)
}

/// Accept a task: POST /v1/tasks/accept
pub async fn accept_task(
    State(state): State<AppState>,
    Json(request): Json<TaskActionRequest>,
) -> ApiResult<Json<DeliveryAssignment>> {
    let assignment_id = resolve_assignment(&state, request.parcel_id).await?;
    let assignment = state
        .assignments
        .accept_task(assignment_id, request.delivery_man_id)
        .await?;
    Ok(Json(assignment))
}

/// Complete a task: POST /v1/tasks/complete
pub async fn complete_task(
    State(state): State<AppState>,
    Json(request): Json<TaskActionRequest>,
) -> ApiResult<Json<DeliveryAssignment>> {
    let assignment_id = resolve_assignment(&state, request.parcel_id).await?;
    let assignment = state
        .assignments
        .complete_task(assignment_id, request.delivery_man_id)
        .await?;
    Ok(Json(assignment))
}

/// Record a failed delivery: POST /v1/tasks/fail
pub async fn fail_task(
    State(state): State<AppState>,
    Json(request): Json<FailTaskRequest>,
) -> ApiResult<Json<DeliveryAssignment>> {
    let assignment_id = resolve_assignment(&state, request.parcel_id).await?;
    let assignment = state
        .assignments
        .delivery_failed(assignment_id, request.delivery_man_id, request.reason)
        .await?;
    Ok(Json(assignment))
}

/// Refuse a task: POST /v1/tasks/refuse
pub async fn refuse_task(
    State(state): State<AppState>,
    Json(request): Json<TaskActionRequest>,
) -> ApiResult<Json<DeliveryAssignment>> {
    let assignment_id = resolve_assignment(&state, request.parcel_id).await?;
    let assignment = state
        .assignments
        .refuse_task(assignment_id, request.delivery_man_id)
        .await?;
    Ok(Json(assignment))
}

/// Postpone a task: POST /v1/tasks/postpone
pub async fn postpone_task(
    State(state): State<AppState>,
    Json(request): Json<PostponeTaskRequest>,
) -> ApiResult<Json<DeliveryAssignment>> {
    let assignment_id = resolve_assignment(&state, request.parcel_id).await?;
    let assignment = state
        .assignments
        .postpone_task(
            assignment_id,
            request.delivery_man_id,
            request.requested_time,
            request.reason,
        )
        .await?;
    Ok(Json(assignment))
}
