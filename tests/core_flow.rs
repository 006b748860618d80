//! End-to-end tests for the ownership, sharing and status-reconciliation
//! core, run against an in-memory database.

use uuid::Uuid;

use perch::core::{authority, cascade, sharing, status, AuthContext, CoreError};
use perch::db::{
    self, BatterySnapshot, DbPool, ForegroundSnapshot, GrantStatus, NetworkSnapshot,
    OtherSnapshot, ShareGrant, StatusSnapshot, TriState,
};

async fn pool() -> DbPool {
    db::init_memory().await.expect("in-memory db")
}

async fn create_user(db: &DbPool, name: &str) -> String {
    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO users (id, name, password_hash, registered_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind("$argon2id$test")
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(db)
        .await
        .unwrap();
    id
}

async fn create_device(db: &DbPool, owner_id: &str, name: &str) -> String {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO devices (id, owner_id, name, platform, description, registered_at)
         VALUES (?, ?, ?, 'Android', '', ?)",
    )
    .bind(&id)
    .bind(owner_id)
    .bind(name)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(db)
    .await
    .unwrap();
    id
}

fn snapshot(level: i64, app: &str) -> StatusSnapshot {
    StatusSnapshot {
        battery: BatterySnapshot {
            charging: 1,
            level,
            temperature: 30.5,
            capacity: 4500,
        },
        network: NetworkSnapshot {
            wifi_connected: 1,
            wifi_ssid: "home".to_string(),
            mobile_data_active: 2,
            mobile_signal_dbm: -70,
            network_type: "WiFi".to_string(),
            upload_speed_kbps: 1200,
            download_speed_kbps: 48000,
            traffic_used_mb: 120.5,
        },
        foreground: ForegroundSnapshot {
            app_name: app.to_string(),
            app_title: format!("{} window", app),
            speaker_playing: 2,
        },
        other: OtherSnapshot {
            screen_on: TriState::True,
            is_charging_via_usb: TriState::False,
            is_charging_via_ac: TriState::True,
            is_low_power_mode: TriState::Unknown,
        },
    }
}

async fn count(db: &DbPool, sql: &str, bind: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql).bind(bind).fetch_one(db).await.unwrap();
    n
}

#[tokio::test]
async fn owner_reads_status_regardless_of_grants() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let device = create_device(&db, &owner, "phone").await;
    let ctx = AuthContext::new(owner);

    status::report_status(&db, &device, &snapshot(80, "org.example.music"))
        .await
        .unwrap();

    let response = status::get_status(&db, &ctx, &device).await.unwrap();
    assert_eq!(response.source, "owner");
    assert_eq!(response.snapshot.battery.level, 80);
}

#[tokio::test]
async fn read_without_approved_grant_is_forbidden() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let viewer = create_user(&db, "viewer").await;
    let device = create_device(&db, &owner, "phone").await;
    let viewer_ctx = AuthContext::new(viewer.clone());

    status::report_status(&db, &device, &snapshot(55, "org.example.maps"))
        .await
        .unwrap();

    // No grant at all
    let err = status::get_status(&db, &viewer_ctx, &device).await.unwrap_err();
    assert!(matches!(err, CoreError::Forbidden));

    // A pending grant is still not access
    sharing::request_share(&db, &device, &viewer).await.unwrap();
    let err = status::get_status(&db, &viewer_ctx, &device).await.unwrap_err();
    assert!(matches!(err, CoreError::Forbidden));
}

#[tokio::test]
async fn status_read_on_missing_device_is_not_found() {
    let db = pool().await;
    let user = create_user(&db, "someone").await;
    let ctx = AuthContext::new(user);

    let err = status::get_status(&db, &ctx, "no-such-device").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn status_read_before_first_report_is_not_found() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let device = create_device(&db, &owner, "phone").await;
    let ctx = AuthContext::new(owner);

    let err = status::get_status(&db, &ctx, &device).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("Device status")));
}

#[tokio::test]
async fn approve_then_revert_keeps_one_row_and_revokes_access() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let viewer = create_user(&db, "viewer").await;
    let device = create_device(&db, &owner, "phone").await;
    let owner_ctx = AuthContext::new(owner.clone());
    let viewer_ctx = AuthContext::new(viewer.clone());

    status::report_status(&db, &device, &snapshot(60, "org.example.mail"))
        .await
        .unwrap();
    let grant_id = sharing::request_share(&db, &device, &viewer).await.unwrap();

    sharing::set_authorization(&db, &owner_ctx, &grant_id, 1).await.unwrap();
    let response = status::get_status(&db, &viewer_ctx, &device).await.unwrap();
    assert_eq!(response.source, "shared");

    // Re-approving is a no-op success
    sharing::set_authorization(&db, &owner_ctx, &grant_id, 1).await.unwrap();

    sharing::set_authorization(&db, &owner_ctx, &grant_id, 2).await.unwrap();
    let err = status::get_status(&db, &viewer_ctx, &device).await.unwrap_err();
    assert!(matches!(err, CoreError::Forbidden));

    let rows = count(&db, "SELECT COUNT(*) FROM share_grants WHERE device_id = ?", &device).await;
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn self_share_is_rejected() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let device = create_device(&db, &owner, "phone").await;

    let err = sharing::request_share(&db, &device, &owner).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_share_request_is_rejected() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let viewer = create_user(&db, "viewer").await;
    let device = create_device(&db, &owner, "phone").await;

    sharing::request_share(&db, &device, &viewer).await.unwrap();
    let err = sharing::request_share(&db, &device, &viewer).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let rows = count(&db, "SELECT COUNT(*) FROM share_grants WHERE device_id = ?", &device).await;
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn share_request_validates_both_parties() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let viewer = create_user(&db, "viewer").await;
    let device = create_device(&db, &owner, "phone").await;

    let err = sharing::request_share(&db, "nope", &viewer).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("Device")));

    let err = sharing::request_share(&db, &device, "nope").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("User")));
}

#[tokio::test]
async fn only_the_owner_authorizes_a_grant() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let viewer = create_user(&db, "viewer").await;
    let device = create_device(&db, &owner, "phone").await;
    let viewer_ctx = AuthContext::new(viewer.clone());

    let grant_id = sharing::request_share(&db, &device, &viewer).await.unwrap();

    // The viewer cannot approve their own request
    let err = sharing::set_authorization(&db, &viewer_ctx, &grant_id, 1).await.unwrap_err();
    assert!(matches!(err, CoreError::NotOwner));

    // Out-of-range status codes are rejected before anything else
    let owner_ctx = AuthContext::new(owner);
    let err = sharing::set_authorization(&db, &owner_ctx, &grant_id, 3).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));

    let err = sharing::set_authorization(&db, &owner_ctx, "nope", 1).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("Share grant")));
}

#[tokio::test]
async fn second_report_fully_replaces_the_first() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let device = create_device(&db, &owner, "phone").await;
    let ctx = AuthContext::new(owner);

    let first_ts = status::report_status(&db, &device, &snapshot(90, "org.example.music"))
        .await
        .unwrap();
    let second_ts = status::report_status(&db, &device, &snapshot(85, "org.example.maps"))
        .await
        .unwrap();
    assert!(second_ts >= first_ts);

    let rows = count(&db, "SELECT COUNT(*) FROM device_status WHERE device_id = ?", &device).await;
    assert_eq!(rows, 1);

    let response = status::get_status(&db, &ctx, &device).await.unwrap();
    assert_eq!(response.timestamp, second_ts);
    assert_eq!(response.snapshot, snapshot(85, "org.example.maps"));
}

#[tokio::test]
async fn delete_device_cascades_to_status_and_grants() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let viewer = create_user(&db, "viewer").await;
    let device = create_device(&db, &owner, "phone").await;
    let viewer_ctx = AuthContext::new(viewer.clone());

    status::report_status(&db, &device, &snapshot(70, "org.example.chat"))
        .await
        .unwrap();
    sharing::request_share(&db, &device, &viewer).await.unwrap();

    cascade::delete_device(&db, &device).await.unwrap();

    assert_eq!(count(&db, "SELECT COUNT(*) FROM device_status WHERE device_id = ?", &device).await, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM share_grants WHERE device_id = ?", &device).await, 0);

    let err = status::get_status(&db, &viewer_ctx, &device).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("Device")));

    // Deletion is not idempotent past the first success
    let err = cascade::delete_device(&db, &device).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("Device")));
}

#[tokio::test]
async fn report_after_delete_cannot_resurrect_a_status_row() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let device = create_device(&db, &owner, "phone").await;

    status::report_status(&db, &device, &snapshot(70, "org.example.chat"))
        .await
        .unwrap();
    cascade::delete_device(&db, &device).await.unwrap();

    // A report that lost the race against the delete hits the foreign key on
    // device_status.device_id and fails at the storage layer.
    let err = status::report_status(&db, &device, &snapshot(71, "org.example.chat"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));

    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM device_status WHERE device_id = ?", &device).await,
        0
    );
}

#[tokio::test]
async fn delete_user_cascades_including_viewer_grants() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let other = create_user(&db, "other").await;
    let device = create_device(&db, &owner, "phone").await;
    let other_device = create_device(&db, &other, "tablet").await;

    status::report_status(&db, &device, &snapshot(50, "org.example.camera"))
        .await
        .unwrap();
    // Someone else requested access to the owner's device...
    sharing::request_share(&db, &device, &other).await.unwrap();
    // ...and the owner holds a grant on someone else's device.
    sharing::request_share(&db, &other_device, &owner).await.unwrap();

    cascade::delete_user(&db, &owner).await.unwrap();

    assert_eq!(count(&db, "SELECT COUNT(*) FROM devices WHERE owner_id = ?", &owner).await, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM device_status WHERE device_id = ?", &device).await, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM share_grants WHERE device_id = ?", &device).await, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM share_grants WHERE viewer_id = ?", &owner).await, 0);

    // The unrelated user and their device are untouched
    assert_eq!(count(&db, "SELECT COUNT(*) FROM devices WHERE owner_id = ?", &other).await, 1);

    let err = cascade::delete_user(&db, &owner).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("User")));
}

#[tokio::test]
async fn grant_lists_join_device_and_user_names() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let viewer = create_user(&db, "viewer").await;
    let device = create_device(&db, &owner, "phone").await;

    let grant_id = sharing::request_share(&db, &device, &viewer).await.unwrap();

    let incoming = sharing::list_incoming_requests(&db, &viewer).await.unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].id, grant_id);
    assert_eq!(incoming[0].device_name, "phone");
    assert_eq!(incoming[0].user_name, "viewer");
    assert_eq!(incoming[0].status, GrantStatus::Pending);

    let outgoing = sharing::list_outgoing_grants(&db, &owner).await.unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].id, grant_id);

    // The viewer has no outgoing grants, the owner no incoming requests
    assert!(sharing::list_outgoing_grants(&db, &viewer).await.unwrap().is_empty());
    assert!(sharing::list_incoming_requests(&db, &owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_grant_requires_existence_only() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let viewer = create_user(&db, "viewer").await;
    let device = create_device(&db, &owner, "phone").await;

    let grant_id = sharing::request_share(&db, &device, &viewer).await.unwrap();
    sharing::delete_grant(&db, &grant_id).await.unwrap();

    let err = sharing::delete_grant(&db, &grant_id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("Share grant")));
}

#[tokio::test]
async fn authority_distinguishes_not_found_and_not_owner() {
    let db = pool().await;
    let owner = create_user(&db, "owner").await;
    let other = create_user(&db, "other").await;
    let device = create_device(&db, &owner, "phone").await;

    let err = authority::authorize_owner(&db, &AuthContext::new(other.clone()), &device)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotOwner));

    let err = authority::authorize_owner(&db, &AuthContext::new(other), "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound("Device")));
}

/// The full sharing walkthrough: report, request, denied read, approval,
/// shared read with provenance.
#[tokio::test]
async fn sharing_walkthrough() {
    let db = pool().await;
    let u1 = create_user(&db, "u1").await;
    let u2 = create_user(&db, "u2").await;
    let d1 = create_device(&db, &u1, "d1").await;
    let u1_ctx = AuthContext::new(u1.clone());
    let u2_ctx = AuthContext::new(u2.clone());

    status::report_status(&db, &d1, &snapshot(80, "org.example.music"))
        .await
        .unwrap();

    let g1 = sharing::request_share(&db, &d1, &u2).await.unwrap();
    let grant = sqlx::query_as::<_, ShareGrant>("SELECT * FROM share_grants WHERE id = ?")
        .bind(&g1)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(grant.status, GrantStatus::Pending);

    let err = status::get_status(&db, &u2_ctx, &d1).await.unwrap_err();
    assert!(matches!(err, CoreError::Forbidden));

    sharing::set_authorization(&db, &u1_ctx, &g1, 1).await.unwrap();

    let response = status::get_status(&db, &u2_ctx, &d1).await.unwrap();
    assert_eq!(response.source, "shared");
    assert_eq!(response.snapshot.battery.level, 80);
}
