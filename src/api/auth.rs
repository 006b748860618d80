//! Password hashing and caller identity resolution.
//!
//! Identity is a caller-supplied user id (`Authorization: Bearer <user-id>`
//! or `X-User-Id`), verified to reference an existing user and turned into an
//! explicit [`AuthContext`] that every core authorization decision receives.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::core::AuthContext;
use crate::AppState;

use super::error::ApiError;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Extract the caller-supplied user id from request headers
fn extract_user_id(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        if let Some(rest) = auth_header.strip_prefix("Bearer ") {
            return Some(rest.to_string());
        }
    }

    headers
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = extract_user_id(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Missing credentials"))?;

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|_| ApiError::database("A database error occurred"))?;

        match exists {
            Some(_) => Ok(AuthContext::new(user_id)),
            None => Err(ApiError::unauthorized("Unknown user")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("hunter3hunter3", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn user_id_extraction_prefers_bearer() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("Authorization", "Bearer u-123".parse().unwrap());
        headers.insert("X-User-Id", "u-456".parse().unwrap());
        assert_eq!(extract_user_id(&headers), Some("u-123".to_string()));

        let mut headers = axum::http::HeaderMap::new();
        headers.insert("X-User-Id", "u-456".parse().unwrap());
        assert_eq!(extract_user_id(&headers), Some("u-456".to_string()));

        assert_eq!(extract_user_id(&axum::http::HeaderMap::new()), None);
    }
}
