//! Share grant endpoints. The caller of a share request is the viewer; only
//! device owners authorize; deletion is open to either side of a grant.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::core::{authority, sharing, AuthContext};
use crate::db::{AuthorizeRequest, GrantIdResponse, GrantView, ShareRequest};
use crate::AppState;

use super::error::ApiError;
use super::validation::validate_uuid;

pub async fn request_share(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(req): Json<ShareRequest>,
) -> Result<(StatusCode, Json<GrantIdResponse>), ApiError> {
    let grant_id = sharing::request_share(&state.db, &req.device_id, &ctx.user_id).await?;

    tracing::info!(device = %req.device_id, viewer = %ctx.user_id, "Share requested");

    Ok((StatusCode::CREATED, Json(GrantIdResponse { grant_id })))
}

pub async fn list_incoming(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<GrantView>>, ApiError> {
    let grants = sharing::list_incoming_requests(&state.db, &ctx.user_id).await?;
    Ok(Json(grants))
}

pub async fn list_outgoing(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<GrantView>>, ApiError> {
    let grants = sharing::list_outgoing_grants(&state.db, &ctx.user_id).await?;
    Ok(Json(grants))
}

pub async fn authorize(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<AuthorizeRequest>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&id, "grant_id").map_err(|e| ApiError::validation_field("grant_id", e))?;
    sharing::set_authorization(&state.db, &ctx, &id, req.status).await?;

    tracing::info!(grant = %id, status = req.status, "Grant status updated");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_grant(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&id, "grant_id").map_err(|e| ApiError::validation_field("grant_id", e))?;

    // Deletion policy lives here, not in the core: the viewer may withdraw
    // their request, the owner may revoke.
    let grant = sharing::load_grant(&state.db, &id).await?;
    if grant.viewer_id != ctx.user_id {
        let device = authority::load_device(&state.db, &grant.device_id).await?;
        if device.owner_id != ctx.user_id {
            return Err(ApiError::forbidden(
                "Only the grant's viewer or the device owner may delete it",
            ));
        }
    }

    sharing::delete_grant(&state.db, &id).await?;

    tracing::info!(grant = %id, "Grant deleted");

    Ok(StatusCode::NO_CONTENT)
}
