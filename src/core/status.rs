//! Status reconciler: folds each telemetry report into the single
//! current-status row for a device.
//!
//! Reports are full snapshots, so reconciliation is create-if-absent or full
//! replace; nothing from the previous row survives except the row id. The
//! timestamp is always server-assigned.

use uuid::Uuid;

use crate::db::{DbPool, DeviceStatus, StatusResponse, StatusSnapshot};

use super::authority::{self, AuthContext};
use super::error::{CoreError, CoreResult};

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Upsert the status row for a device. The caller must already be authorized
/// as the device owner. Returns the assigned timestamp.
///
/// The write is one statement keyed on the `device_status.device_id`
/// uniqueness constraint, so a report racing another report (or the first
/// report racing itself on two connections) cannot produce two rows or a
/// half-applied merge. The foreign key on `device_id` covers the other race:
/// a report landing after the device's delete transaction has no row to
/// reference and fails instead of resurrecting an orphan status.
pub async fn report_status(
    db: &DbPool,
    device_id: &str,
    snapshot: &StatusSnapshot,
) -> CoreResult<i64> {
    let timestamp = now_ms();

    sqlx::query(
        r#"
        INSERT INTO device_status (
            id, device_id, timestamp,
            battery_charging, battery_level, battery_temperature, battery_capacity,
            wifi_connected, wifi_ssid, mobile_data_active, mobile_signal_dbm,
            network_type, upload_speed_kbps, download_speed_kbps, traffic_used_mb,
            app_name, app_title, speaker_playing,
            screen_on, is_charging_via_usb, is_charging_via_ac, is_low_power_mode
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(device_id) DO UPDATE SET
            timestamp = excluded.timestamp,
            battery_charging = excluded.battery_charging,
            battery_level = excluded.battery_level,
            battery_temperature = excluded.battery_temperature,
            battery_capacity = excluded.battery_capacity,
            wifi_connected = excluded.wifi_connected,
            wifi_ssid = excluded.wifi_ssid,
            mobile_data_active = excluded.mobile_data_active,
            mobile_signal_dbm = excluded.mobile_signal_dbm,
            network_type = excluded.network_type,
            upload_speed_kbps = excluded.upload_speed_kbps,
            download_speed_kbps = excluded.download_speed_kbps,
            traffic_used_mb = excluded.traffic_used_mb,
            app_name = excluded.app_name,
            app_title = excluded.app_title,
            speaker_playing = excluded.speaker_playing,
            screen_on = excluded.screen_on,
            is_charging_via_usb = excluded.is_charging_via_usb,
            is_charging_via_ac = excluded.is_charging_via_ac,
            is_low_power_mode = excluded.is_low_power_mode
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(device_id)
    .bind(timestamp)
    .bind(snapshot.battery.charging)
    .bind(snapshot.battery.level)
    .bind(snapshot.battery.temperature)
    .bind(snapshot.battery.capacity)
    .bind(snapshot.network.wifi_connected)
    .bind(&snapshot.network.wifi_ssid)
    .bind(snapshot.network.mobile_data_active)
    .bind(snapshot.network.mobile_signal_dbm)
    .bind(&snapshot.network.network_type)
    .bind(snapshot.network.upload_speed_kbps)
    .bind(snapshot.network.download_speed_kbps)
    .bind(snapshot.network.traffic_used_mb)
    .bind(&snapshot.foreground.app_name)
    .bind(&snapshot.foreground.app_title)
    .bind(snapshot.foreground.speaker_playing)
    .bind(snapshot.other.screen_on)
    .bind(snapshot.other.is_charging_via_usb)
    .bind(snapshot.other.is_charging_via_ac)
    .bind(snapshot.other.is_low_power_mode)
    .execute(db)
    .await?;

    Ok(timestamp)
}

/// Read the current status for a device as the given caller. Succeeds for the
/// owner or a viewer with an approved grant; the response carries which
/// branch matched.
pub async fn get_status(
    db: &DbPool,
    ctx: &AuthContext,
    device_id: &str,
) -> CoreResult<StatusResponse> {
    let (_, source) = authority::authorize_read(db, ctx, device_id).await?;

    let row = sqlx::query_as::<_, DeviceStatus>("SELECT * FROM device_status WHERE device_id = ?")
        .bind(device_id)
        .fetch_optional(db)
        .await?
        .ok_or(CoreError::NotFound("Device status"))?;

    Ok(StatusResponse {
        source: source.as_str().to_string(),
        device_id: row.device_id.clone(),
        timestamp: row.timestamp,
        snapshot: row.snapshot(),
    })
}
