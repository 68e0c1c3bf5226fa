//! # Assignment Handlers
//!
//! HTTP endpoints for manual and automatic assignment creation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::models::DeliveryAssignment;
use crate::orchestration::AutoAssignmentOutcome;
use crate::routing::{SolverMode, VehicleProfile};
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

/// Request body for POST /v1/assignments/manual
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAssignmentRequest {
    pub shipper_id: Uuid,
    pub parcel_ids: Vec<Uuid>,
    pub zone_id: Option<String>,
}

/// Request body for POST /v1/assignments/auto
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AutoAssignmentRequest {
    pub shipper_ids: Option<Vec<Uuid>>,
    pub parcel_ids: Option<Vec<Uuid>>,
    pub vehicle: Option<VehicleProfile>,
    pub mode: Option<SolverMode>,
}

/// Create a manual assignment: POST /v1/assignments/manual
pub async fn create_manual(
    State(state): State<AppState>,
    Json(request): Json<ManualAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<DeliveryAssignment>)> {
    info!(
        shipper_id = %request.shipper_id,
        parcels = request.parcel_ids.len(),
        "manual assignment requested"
    );

    let assignment = state
        .assignments
        .create_manual(
            request.shipper_id,
            &request.parcel_ids,
            request.zone_id.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Run auto-assignment: POST /v1/assignments/auto
pub async fn create_auto(
    State(state): State<AppState>,
    Json(request): Json<AutoAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AutoAssignmentOutcome>)> {
    let vehicle = request
        .vehicle
        .unwrap_or(state.config.routing.default_vehicle);
    let mode = request.mode.unwrap_or(state.config.routing.default_mode);

    info!(
        explicit_shippers = request.shipper_ids.as_ref().map(Vec::len),
        explicit_parcels = request.parcel_ids.as_ref().map(Vec::len),
        vehicle = %vehicle,
        "auto assignment requested"
    );

    let outcome = state
        .assignments
        .create_auto(
            request.shipper_ids.as_deref(),
            request.parcel_ids.as_deref(),
            vehicle,
            mode,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
