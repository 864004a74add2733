//! API routes.

pub mod admin;
pub mod chat;
pub mod health;
pub mod track;

use axum::{
    body::Bytes,
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracker_core::limits::MAX_BODY_BYTES;
use tracker_core::{validate_request, ValidationErrorCode};
use validator::Validate;

use crate::response::ApiError;
use crate::state::AppState;

/// Creates the API router.
///
/// Unmatched paths fall through to the static asset directory when one is
/// configured.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/track/visit", post(track::visit_handler))
        .route("/api/track/activity", post(track::activity_handler))
        .route("/api/track/heartbeat", post(track::heartbeat_handler))
        .route("/api/track/end", post(track::end_handler))
        .route("/api/admin/auth", post(admin::auth_handler))
        .route("/api/admin/visitors", get(admin::visitors_handler))
        .route("/api/admin/questions", get(admin::questions_handler))
        .route("/api/admin/active", get(admin::active_handler))
        .route("/api/admin/stats", get(admin::stats_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler));

    if let Some(dir) = state.static_dir.clone() {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(CompressionLayer::new())
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    )
    .with_state(state)
}

/// Parses a JSON body whatever its declared content type, then validates it.
///
/// Beacon deliveries arrive as `text/plain`, so handlers take raw bytes.
pub(crate) fn parse_json<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let request: T = serde_json::from_slice(body).map_err(|e| {
        ApiError::validation(
            ValidationErrorCode::InvalidFormat.code(),
            vec![format!("invalid JSON: {}", e)],
        )
    })?;
    validate_request(&request)?;
    Ok(request)
}
