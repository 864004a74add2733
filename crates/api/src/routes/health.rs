//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use telemetry::health;

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - Full health check.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = health();
    let report = registry.report();

    Json(HealthResponse {
        status: report.status.as_str().to_string(),
        ledger_writable: registry.ledger.is_healthy(),
        llm_available: registry.llm.is_healthy(),
        geolocation_available: registry.geolocation.is_healthy(),
        mailer_available: registry.mailer.is_healthy(),
        active_sessions: state.tracker.active_count(),
    })
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
