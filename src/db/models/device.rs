//! Device models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Device {
    pub id: String,
    /// Owner is set at registration and immutable thereafter.
    pub owner_id: String,
    pub name: String,
    pub platform: String,
    pub description: String,
    pub registered_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub description: String,
}

/// Owner-initiated info update. `None` means "don't change".
#[derive(Debug, Deserialize)]
pub struct UpdateDeviceRequest {
    pub name: Option<String>,
    pub platform: Option<String>,
    pub description: Option<String>,
}
