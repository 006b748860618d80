//! User account endpoints: registration, login, profile, rename, password
//! reset and password-confirmed account deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{self, AuthContext};
use crate::db::{
    DeleteAccountRequest, LoginRequest, RegisterUserRequest, RenameRequest, ResetPasswordRequest,
    User, UserIdResponse, UserResponse,
};
use crate::AppState;

use super::auth::{hash_password, verify_password};
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_password, validate_username, validate_uuid};

async fn username_taken(state: &AppState, name: &str) -> Result<bool, ApiError> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE name = ?")
        .bind(name)
        .fetch_optional(&state.db)
        .await?;
    Ok(existing.is_some())
}

async fn load_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(user)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserIdResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_username(&req.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }
    errors.finish()?;

    if username_taken(&state, &req.name).await? {
        return Err(ApiError::conflict("Username already taken"));
    }

    let user_id = Uuid::new_v4().to_string();
    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let registered_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, name, password_hash, registered_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(&req.name)
    .bind(&password_hash)
    .bind(&registered_at)
    .execute(&state.db)
    .await
    .map_err(|e| {
        // Lost a race with an identical name
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::conflict("Username already taken")
        } else {
            ApiError::from(e)
        }
    })?;

    tracing::info!(user = %req.name, "User registered");

    Ok((StatusCode::CREATED, Json(UserIdResponse { user_id })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserIdResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE name = ?")
        .bind(&req.name)
        .fetch_optional(&state.db)
        .await?;

    // Same response for unknown name and wrong password
    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    Ok(Json(UserIdResponse { user_id: user.id }))
}

pub async fn rename(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(req): Json<RenameRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Err(e) = validate_username(&req.name) {
        return Err(ApiError::validation_field("name", e));
    }

    if username_taken(&state, &req.name).await? {
        return Err(ApiError::conflict("Username already taken"));
    }

    sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(&req.name)
        .bind(&ctx.user_id)
        .execute(&state.db)
        .await?;

    let user = load_user(&state, &ctx.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user = load_user(&state, &ctx.user_id).await?;

    if !verify_password(&req.old_password, &user.password_hash) {
        return Err(ApiError::forbidden("Old password is incorrect"));
    }
    if req.new_password == req.old_password {
        return Err(ApiError::bad_request(
            "New password must differ from the old one",
        ));
    }
    if let Err(e) = validate_password(&req.new_password) {
        return Err(ApiError::validation_field("new_password", e));
    }

    let password_hash = hash_password(&req.new_password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(&ctx.user_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_uuid(&id, "user_id").map_err(|e| ApiError::validation_field("user_id", e))?;
    let user = load_user(&state, &id).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<StatusCode, ApiError> {
    let user = load_user(&state, &ctx.user_id).await?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::forbidden("Password is incorrect"));
    }

    core::cascade::delete_user(&state.db, &ctx.user_id).await?;

    tracing::info!(user = %user.name, "User account deleted");

    Ok(StatusCode::NO_CONTENT)
}
