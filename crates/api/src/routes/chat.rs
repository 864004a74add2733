//! Chat widget endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracker_core::{ChatRequest, FALLBACK_REPLY};

use super::parse_json;
use crate::response::{ApiError, ChatResponse};
use crate::state::AppState;

/// POST /api/chat
///
/// Provider failures answer 500 with the fallback reply so the widget can
/// still show something.
pub async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: ChatRequest = parse_json(&body)?;

    let response = match state
        .chat
        .ask(&request.message, request.session_id.as_deref())
        .await
    {
        Ok(reply) => Json(ChatResponse {
            logged: reply.logged(),
            response: reply.response,
        })
        .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ChatResponse {
                response: FALLBACK_REPLY.to_string(),
                logged: false,
            }),
        )
            .into_response(),
    };

    Ok(response)
}
