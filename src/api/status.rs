//! Telemetry status endpoints: owner-only reports, owner-or-shared reads.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::core::{authority, status, AuthContext};
use crate::db::{ReportStatusResponse, StatusResponse, StatusSnapshot};
use crate::AppState;

use super::error::ApiError;
use super::validation::validate_uuid;

pub async fn report_status(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(device_id): Path<String>,
    Json(snapshot): Json<StatusSnapshot>,
) -> Result<Json<ReportStatusResponse>, ApiError> {
    validate_uuid(&device_id, "device_id")
        .map_err(|e| ApiError::validation_field("device_id", e))?;
    authority::authorize_owner(&state.db, &ctx, &device_id).await?;

    let timestamp = status::report_status(&state.db, &device_id, &snapshot).await?;

    tracing::debug!(device = %device_id, timestamp, "Status reported");

    Ok(Json(ReportStatusResponse { timestamp }))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(device_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    validate_uuid(&device_id, "device_id")
        .map_err(|e| ApiError::validation_field("device_id", e))?;
    let response = status::get_status(&state.db, &ctx, &device_id).await?;
    Ok(Json(response))
}
