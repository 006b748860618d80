//! Share grant lifecycle: request, owner authorization, list views and
//! deletion.
//!
//! A grant starts pending; only the device owner moves it between pending and
//! approved. Both directions are legal, so revoking read access is returning
//! the grant to pending (or deleting it outright).

use uuid::Uuid;

use crate::db::{DbPool, GrantStatus, GrantView, ShareGrant};

use super::authority::{self, AuthContext};
use super::error::{CoreError, CoreResult};

/// Create a pending grant for `(device, viewer)` and return its id.
///
/// Re-requesting an existing pair is rejected regardless of the grant's
/// current status; only the owner can change it.
pub async fn request_share(db: &DbPool, device_id: &str, viewer_id: &str) -> CoreResult<String> {
    let device = authority::load_device(db, device_id).await?;

    let viewer: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(viewer_id)
        .fetch_optional(db)
        .await?;
    if viewer.is_none() {
        return Err(CoreError::NotFound("User"));
    }

    if device.owner_id == viewer_id {
        return Err(CoreError::Conflict("Cannot request access to your own device"));
    }

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT id FROM share_grants WHERE device_id = ? AND viewer_id = ?")
            .bind(device_id)
            .bind(viewer_id)
            .fetch_optional(db)
            .await?;
    if existing.is_some() {
        return Err(CoreError::Conflict(
            "A share grant for this device and viewer already exists",
        ));
    }

    let id = Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO share_grants (id, device_id, viewer_id, status, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(device_id)
    .bind(viewer_id)
    .bind(GrantStatus::Pending)
    .bind(&created_at)
    .execute(db)
    .await
    .map_err(|e| {
        // Two concurrent first-requests: the unique (device_id, viewer_id)
        // constraint lets exactly one insert win.
        if e.to_string().contains("UNIQUE constraint failed") {
            CoreError::Conflict("A share grant for this device and viewer already exists")
        } else {
            CoreError::Storage(e)
        }
    })?;

    Ok(id)
}

pub async fn load_grant(db: &DbPool, grant_id: &str) -> CoreResult<ShareGrant> {
    sqlx::query_as::<_, ShareGrant>("SELECT * FROM share_grants WHERE id = ?")
        .bind(grant_id)
        .fetch_optional(db)
        .await?
        .ok_or(CoreError::NotFound("Share grant"))
}

/// Owner-only: overwrite the grant's status. Setting the current status again
/// is a no-op success.
pub async fn set_authorization(
    db: &DbPool,
    ctx: &AuthContext,
    grant_id: &str,
    status_code: i64,
) -> CoreResult<()> {
    let status = GrantStatus::try_from(status_code)
        .map_err(|_| CoreError::InvalidInput("Status must be 1 (approved) or 2 (pending)"))?;

    let grant = load_grant(db, grant_id).await?;
    authority::authorize_owner(db, ctx, &grant.device_id).await?;

    sqlx::query("UPDATE share_grants SET status = ? WHERE id = ?")
        .bind(status)
        .bind(grant_id)
        .execute(db)
        .await?;

    Ok(())
}

/// Grants where the given user is the viewer, joined with device names, for
/// display to the requesting viewer.
pub async fn list_incoming_requests(db: &DbPool, viewer_id: &str) -> CoreResult<Vec<GrantView>> {
    let grants = sqlx::query_as::<_, GrantView>(
        "SELECT g.id, g.device_id, g.status, u.name AS user_name, d.name AS device_name, g.created_at
         FROM share_grants g
         JOIN users u ON u.id = g.viewer_id
         JOIN devices d ON d.id = g.device_id
         WHERE g.viewer_id = ?
         ORDER BY g.created_at DESC",
    )
    .bind(viewer_id)
    .fetch_all(db)
    .await?;

    Ok(grants)
}

/// Grants over devices owned by the given user, for the owner to review.
pub async fn list_outgoing_grants(db: &DbPool, owner_id: &str) -> CoreResult<Vec<GrantView>> {
    let grants = sqlx::query_as::<_, GrantView>(
        "SELECT g.id, g.device_id, g.status, u.name AS user_name, d.name AS device_name, g.created_at
         FROM share_grants g
         JOIN users u ON u.id = g.viewer_id
         JOIN devices d ON d.id = g.device_id
         WHERE d.owner_id = ?
         ORDER BY g.created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(db)
    .await?;

    Ok(grants)
}

/// Delete a grant unconditionally. Which callers may reach this is external
/// policy; the core checks existence only.
pub async fn delete_grant(db: &DbPool, grant_id: &str) -> CoreResult<()> {
    let result = sqlx::query("DELETE FROM share_grants WHERE id = ?")
        .bind(grant_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::NotFound("Share grant"));
    }
    Ok(())
}
