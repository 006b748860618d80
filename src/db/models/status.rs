//! Device status models: the stored row, the nested snapshot payload and the
//! tri-state integer codec used by the `other` telemetry group.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tri-state flag for telemetry the collector may not be able to sample.
///
/// Wire encoding: 0 = unknown, 1 = true, 2 = false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i64", into = "i64")]
#[repr(i64)]
pub enum TriState {
    #[default]
    Unknown = 0,
    True = 1,
    False = 2,
}

impl From<TriState> for i64 {
    fn from(value: TriState) -> i64 {
        value as i64
    }
}

impl TryFrom<i64> for TriState {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::True),
            2 => Ok(Self::False),
            other => Err(format!("invalid tri-state value: {}", other)),
        }
    }
}

/// The single current-status row for a device.
///
/// Boolean-like fields outside the `other` group use the 1/2 integer encoding
/// the reporting clients send; they are stored and returned verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceStatus {
    pub id: String,
    pub device_id: String,
    /// Milliseconds since epoch, server-assigned on every report.
    pub timestamp: i64,
    pub battery_charging: i64,
    pub battery_level: i64,
    pub battery_temperature: f64,
    pub battery_capacity: i64,
    pub wifi_connected: i64,
    pub wifi_ssid: String,
    pub mobile_data_active: i64,
    pub mobile_signal_dbm: i64,
    pub network_type: String,
    pub upload_speed_kbps: i64,
    pub download_speed_kbps: i64,
    pub traffic_used_mb: f64,
    pub app_name: String,
    pub app_title: String,
    pub speaker_playing: i64,
    pub screen_on: TriState,
    pub is_charging_via_usb: TriState,
    pub is_charging_via_ac: TriState,
    pub is_low_power_mode: TriState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterySnapshot {
    pub charging: i64,
    pub level: i64,
    pub temperature: f64,
    pub capacity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub wifi_connected: i64,
    pub wifi_ssid: String,
    pub mobile_data_active: i64,
    pub mobile_signal_dbm: i64,
    pub network_type: String,
    pub upload_speed_kbps: i64,
    pub download_speed_kbps: i64,
    pub traffic_used_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForegroundSnapshot {
    pub app_name: String,
    pub app_title: String,
    pub speaker_playing: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherSnapshot {
    #[serde(default)]
    pub screen_on: TriState,
    #[serde(default)]
    pub is_charging_via_usb: TriState,
    #[serde(default)]
    pub is_charging_via_ac: TriState,
    #[serde(default)]
    pub is_low_power_mode: TriState,
}

/// One complete telemetry payload, as sent by a reporting client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub battery: BatterySnapshot,
    pub network: NetworkSnapshot,
    pub foreground: ForegroundSnapshot,
    pub other: OtherSnapshot,
}

impl DeviceStatus {
    /// Regroup the flat row into the nested snapshot shape.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            battery: BatterySnapshot {
                charging: self.battery_charging,
                level: self.battery_level,
                temperature: self.battery_temperature,
                capacity: self.battery_capacity,
            },
            network: NetworkSnapshot {
                wifi_connected: self.wifi_connected,
                wifi_ssid: self.wifi_ssid.clone(),
                mobile_data_active: self.mobile_data_active,
                mobile_signal_dbm: self.mobile_signal_dbm,
                network_type: self.network_type.clone(),
                upload_speed_kbps: self.upload_speed_kbps,
                download_speed_kbps: self.download_speed_kbps,
                traffic_used_mb: self.traffic_used_mb,
            },
            foreground: ForegroundSnapshot {
                app_name: self.app_name.clone(),
                app_title: self.app_title.clone(),
                speaker_playing: self.speaker_playing,
            },
            other: OtherSnapshot {
                screen_on: self.screen_on,
                is_charging_via_usb: self.is_charging_via_usb,
                is_charging_via_ac: self.is_charging_via_ac,
                is_low_power_mode: self.is_low_power_mode,
            },
        }
    }
}

/// Response for status reads: the snapshot plus which authorization branch
/// granted the read ("owner" or "shared").
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub source: String,
    pub device_id: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ReportStatusResponse {
    pub timestamp: i64,
}
