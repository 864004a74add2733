//! Tracking beacon endpoints.
//!
//! Unknown session ids are soft failures (`{"ok": false}`), never HTTP
//! errors: the page keeps working whatever the server remembers.

use axum::{body::Bytes, extract::State, Json};
use tracing::debug;
use tracker_core::{ActivityRequest, SectionTimesRequest, VisitRequest};

use super::parse_json;
use crate::extractors::{ClientIp, UserAgent};
use crate::response::{ApiError, EndResponse, OkResponse, VisitResponse};
use crate::state::AppState;

/// POST /api/track/visit
pub async fn visit_handler(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    UserAgent(header_ua): UserAgent,
    body: Bytes,
) -> Result<Json<VisitResponse>, ApiError> {
    let mut request: VisitRequest = if body.iter().all(u8::is_ascii_whitespace) {
        VisitRequest::default()
    } else {
        parse_json(&body)?
    };

    if request.user_agent.is_empty() {
        request.user_agent = header_ua.unwrap_or_default();
    }

    let session_id = state.tracker.start_session(request, client_ip).await;

    Ok(Json(VisitResponse {
        tracked: session_id.is_some(),
        session_id,
    }))
}

/// POST /api/track/activity
pub async fn activity_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OkResponse>, ApiError> {
    let request: ActivityRequest = parse_json(&body)?;
    let ok = state
        .tracker
        .record_activity(&request.session_id, &request.to_update())
        .await;

    Ok(Json(OkResponse { ok }))
}

/// POST /api/track/heartbeat
pub async fn heartbeat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OkResponse>, ApiError> {
    let request = SectionTimesRequest::parse(&body)?;
    let times = request.section_times_ms();
    let ok = state
        .tracker
        .heartbeat(&request.session_id, times.as_ref())
        .await;

    Ok(Json(OkResponse { ok }))
}

/// POST /api/track/end - accepts beacon bodies of any content type.
pub async fn end_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EndResponse>, ApiError> {
    let request = SectionTimesRequest::parse(&body)?;
    let times = request.section_times_ms();
    let outcome = state
        .tracker
        .end_session(&request.session_id, times.as_ref())
        .await;

    debug!(session_id = %request.session_id, ok = outcome.ok, "End request handled");

    Ok(Json(EndResponse {
        ok: outcome.ok,
        analysis: outcome.analysis,
    }))
}
