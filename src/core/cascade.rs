//! Cascading deletes: removing a device or a user removes every dependent row
//! in one transaction, so no status row or grant can outlive its device or
//! either of its users.

use crate::db::DbPool;

use super::error::{CoreError, CoreResult};

/// Delete a device, its status row and every grant referencing it.
///
/// Not idempotent past the first success: deleting an already-deleted id is
/// `NotFound`, not a silent no-op.
pub async fn delete_device(db: &DbPool, device_id: &str) -> CoreResult<()> {
    let mut tx = db.begin().await?;

    // Referencing rows go first; the device row carries the foreign keys'
    // target and must outlive them within the transaction.
    sqlx::query("DELETE FROM device_status WHERE device_id = ?")
        .bind(device_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM share_grants WHERE device_id = ?")
        .bind(device_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM devices WHERE id = ?")
        .bind(device_id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(CoreError::NotFound("Device"));
    }

    tx.commit().await?;
    Ok(())
}

/// Delete a user, all devices they own (with statuses and grants), and every
/// grant where they are merely the viewer of someone else's device.
pub async fn delete_user(db: &DbPool, user_id: &str) -> CoreResult<()> {
    let mut tx = db.begin().await?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(CoreError::NotFound("User"));
    }

    // A deleted user cannot hold a grant on anyone else's device.
    sqlx::query("DELETE FROM share_grants WHERE viewer_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let device_ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM devices WHERE owner_id = ?")
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

    for (device_id,) in &device_ids {
        sqlx::query("DELETE FROM device_status WHERE device_id = ?")
            .bind(device_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM share_grants WHERE device_id = ?")
            .bind(device_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("DELETE FROM devices WHERE owner_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
