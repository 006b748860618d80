//! Device endpoints: registration, info updates, listings and cascade delete.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{self, authority, AuthContext};
use crate::db::{Device, GrantStatus, RegisterDeviceRequest, UpdateDeviceRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_description, validate_device_name, validate_platform, validate_uuid,
};

pub async fn register_device(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_device_name(&req.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_platform(&req.platform) {
        errors.add("platform", e);
    }
    if let Err(e) = validate_description(&req.description) {
        errors.add("description", e);
    }
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let registered_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO devices (id, owner_id, name, platform, description, registered_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&ctx.user_id)
    .bind(&req.name)
    .bind(&req.platform)
    .bind(&req.description)
    .bind(&registered_at)
    .execute(&state.db)
    .await?;

    tracing::info!(device = %req.name, owner = %ctx.user_id, "Device registered");

    let device = authority::load_device(&state.db, &id).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn update_device(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateDeviceRequest>,
) -> Result<Json<Device>, ApiError> {
    validate_uuid(&id, "device_id").map_err(|e| ApiError::validation_field("device_id", e))?;
    let device = authority::authorize_owner(&state.db, &ctx, &id).await?;

    let name = req.name.unwrap_or(device.name);
    let platform = req.platform.unwrap_or(device.platform);
    let description = req.description.unwrap_or(device.description);

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_device_name(&name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_platform(&platform) {
        errors.add("platform", e);
    }
    if let Err(e) = validate_description(&description) {
        errors.add("description", e);
    }
    errors.finish()?;

    sqlx::query("UPDATE devices SET name = ?, platform = ?, description = ? WHERE id = ?")
        .bind(&name)
        .bind(&platform)
        .bind(&description)
        .bind(&id)
        .execute(&state.db)
        .await?;

    let device = authority::load_device(&state.db, &id).await?;
    Ok(Json(device))
}

/// Devices owned by the caller.
pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<Device>>, ApiError> {
    let devices = sqlx::query_as::<_, Device>(
        "SELECT * FROM devices WHERE owner_id = ? ORDER BY registered_at DESC",
    )
    .bind(&ctx.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(devices))
}

/// Devices shared to the caller through an approved grant.
pub async fn list_shared_devices(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<Device>>, ApiError> {
    let devices = sqlx::query_as::<_, Device>(
        "SELECT d.* FROM devices d
         JOIN share_grants g ON g.device_id = d.id
         WHERE g.viewer_id = ? AND g.status = ?
         ORDER BY d.registered_at DESC",
    )
    .bind(&ctx.user_id)
    .bind(GrantStatus::Approved)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(devices))
}

pub async fn get_device(
    State(state): State<Arc<AppState>>,
    _ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<Device>, ApiError> {
    validate_uuid(&id, "device_id").map_err(|e| ApiError::validation_field("device_id", e))?;
    let device = authority::load_device(&state.db, &id).await?;
    Ok(Json(device))
}

pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&id, "device_id").map_err(|e| ApiError::validation_field("device_id", e))?;
    authority::authorize_owner(&state.db, &ctx, &id).await?;
    core::cascade::delete_device(&state.db, &id).await?;

    tracing::info!(device = %id, "Device deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn malformed_device_id_is_rejected_before_lookup() {
        let db = db::init_memory().await.unwrap();
        let state = Arc::new(AppState::new(Config::default(), db));
        let ctx = AuthContext::new("someone");

        let err = get_device(State(state), ctx, Path("not-a-uuid".into()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
