//! User models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub registered_at: String,
}

/// Response DTO for User that excludes the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub registered_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            registered_at: user.registered_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// Returned by registration and login: the opaque id the client presents as
/// its bearer identity afterwards.
#[derive(Debug, Serialize)]
pub struct UserIdResponse {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Account deletion requires the password as confirmation.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}
