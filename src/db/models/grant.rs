//! Share grant models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Authorization state of a share grant.
///
/// Wire encoding matches the existing client fleet: 1 = approved, 2 = pending.
/// There is no separate "rejected" state; rejecting a request is returning it
/// to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i64", into = "i64")]
#[repr(i64)]
pub enum GrantStatus {
    Approved = 1,
    Pending = 2,
}

impl From<GrantStatus> for i64 {
    fn from(status: GrantStatus) -> i64 {
        status as i64
    }
}

impl TryFrom<i64> for GrantStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Approved),
            2 => Ok(Self::Pending),
            other => Err(format!("invalid grant status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShareGrant {
    pub id: String,
    pub device_id: String,
    pub viewer_id: String,
    pub status: GrantStatus,
    pub created_at: String,
}

/// A grant joined with the viewer and device names, for list views.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GrantView {
    pub id: String,
    pub device_id: String,
    pub status: GrantStatus,
    pub user_name: String,
    pub device_name: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub device_id: String,
}

/// The status arrives as a raw integer so out-of-range values can be rejected
/// with a typed error instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub status: i64,
}

#[derive(Debug, Serialize)]
pub struct GrantIdResponse {
    pub grant_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_status_round_trips_through_wire_integers() {
        assert_eq!(GrantStatus::try_from(1).unwrap(), GrantStatus::Approved);
        assert_eq!(GrantStatus::try_from(2).unwrap(), GrantStatus::Pending);
        assert_eq!(i64::from(GrantStatus::Approved), 1);
        assert_eq!(i64::from(GrantStatus::Pending), 2);
    }

    #[test]
    fn grant_status_rejects_unknown_codes() {
        assert!(GrantStatus::try_from(0).is_err());
        assert!(GrantStatus::try_from(3).is_err());
        assert!(GrantStatus::try_from(-1).is_err());
    }

    #[test]
    fn grant_status_serializes_as_integer() {
        let json = serde_json::to_string(&GrantStatus::Approved).unwrap();
        assert_eq!(json, "1");
        let status: GrantStatus = serde_json::from_str("2").unwrap();
        assert_eq!(status, GrantStatus::Pending);
    }
}
