pub mod auth;
mod devices;
pub mod error;
mod share;
mod status;
mod users;
mod validation;

use axum::{
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/name", put(users::rename))
        .route("/password", put(users::reset_password))
        .route("/me", delete(users::delete_account))
        .route("/:id", get(users::get_user));

    let device_routes = Router::new()
        .route("/", get(devices::list_devices).post(devices::register_device))
        .route("/shared", get(devices::list_shared_devices))
        .route(
            "/:id",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        );

    let share_routes = Router::new()
        .route("/", post(share::request_share))
        .route("/incoming", get(share::list_incoming))
        .route("/outgoing", get(share::list_outgoing))
        .route("/:id", put(share::authorize).delete(share::delete_grant));

    let status_routes = Router::new().route(
        "/:device_id",
        get(status::get_status).put(status::report_status),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/users", user_routes)
        .nest("/api/devices", device_routes)
        .nest("/api/share", share_routes)
        .nest("/api/status", status_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
