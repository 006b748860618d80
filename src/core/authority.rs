//! Ownership authority: decides whether a given user may read or write a
//! given device, based on ownership or an approved share grant.

use crate::db::{DbPool, Device, GrantStatus};

use super::error::{CoreError, CoreResult};

/// Identity of the caller, resolved by the transport layer before any core
/// operation runs.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Which authorization branch granted a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSource {
    Owner,
    Shared,
}

impl AccessSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Shared => "shared",
        }
    }
}

pub async fn load_device(db: &DbPool, device_id: &str) -> CoreResult<Device> {
    sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = ?")
        .bind(device_id)
        .fetch_optional(db)
        .await?
        .ok_or(CoreError::NotFound("Device"))
}

/// Authorize an owner-only action (info update, deletion, grant approval,
/// telemetry writes). Viewers never pass this check.
pub async fn authorize_owner(
    db: &DbPool,
    ctx: &AuthContext,
    device_id: &str,
) -> CoreResult<Device> {
    let device = load_device(db, device_id).await?;
    if device.owner_id != ctx.user_id {
        return Err(CoreError::NotOwner);
    }
    Ok(device)
}

/// Authorize a status read: the owner always passes, a viewer passes only
/// with an approved grant. The matched branch is reported back for
/// caller-visible provenance.
pub async fn authorize_read(
    db: &DbPool,
    ctx: &AuthContext,
    device_id: &str,
) -> CoreResult<(Device, AccessSource)> {
    let device = load_device(db, device_id).await?;
    if device.owner_id == ctx.user_id {
        return Ok((device, AccessSource::Owner));
    }

    let grant: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM share_grants WHERE device_id = ? AND viewer_id = ? AND status = ?",
    )
    .bind(device_id)
    .bind(&ctx.user_id)
    .bind(GrantStatus::Approved)
    .fetch_optional(db)
    .await?;

    match grant {
        Some(_) => Ok((device, AccessSource::Shared)),
        None => Err(CoreError::Forbidden),
    }
}
