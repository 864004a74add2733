//! Admin dashboard endpoints.

use axum::{body::Bytes, extract::State, Json};
use ledger::AdminStats;
use tracing::warn;
use tracker_core::{AdminAuthRequest, AdminAuthResponse, QuestionLogEntry, Session};

use super::parse_json;
use crate::extractors::AdminContext;
use crate::response::ApiError;
use crate::state::AppState;

/// POST /api/admin/auth - exchanges the access code for a token.
pub async fn auth_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AdminAuthResponse>, ApiError> {
    let request: AdminAuthRequest = parse_json(&body)?;

    let token = state.admin.login(&request.code).await.inspect_err(|e| {
        warn!(error = %e, "Admin login rejected");
    })?;

    Ok(Json(AdminAuthResponse {
        success: true,
        token: token.as_str().to_string(),
    }))
}

/// GET /api/admin/visitors
pub async fn visitors_handler(State(state): State<AppState>, _admin: AdminContext) -> Json<Vec<Session>> {
    Json(state.ledger.visitors().await)
}

/// GET /api/admin/questions
pub async fn questions_handler(
    State(state): State<AppState>,
    _admin: AdminContext,
) -> Json<Vec<QuestionLogEntry>> {
    Json(state.ledger.questions().await)
}

/// GET /api/admin/active
pub async fn active_handler(State(state): State<AppState>, _admin: AdminContext) -> Json<Vec<Session>> {
    Json(state.tracker.active_sessions())
}

/// GET /api/admin/stats
pub async fn stats_handler(State(state): State<AppState>, _admin: AdminContext) -> Json<AdminStats> {
    let visitors = state.ledger.visitors().await;
    let questions = state.ledger.questions().await;
    Json(AdminStats::compute(
        &visitors,
        &questions,
        state.tracker.active_count(),
    ))
}
