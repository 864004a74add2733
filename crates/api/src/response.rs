//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// `POST /api/chat`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// True when the question was deferred for the call
    pub logged: bool,
}

/// `POST /api/track/visit`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitResponse {
    pub session_id: Option<String>,
    pub tracked: bool,
}

/// `POST /api/track/activity` and `POST /api/track/heartbeat`
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// `POST /api/track/end`
#[derive(Debug, Serialize, Deserialize)]
pub struct EndResponse {
    pub ok: bool,
    pub analysis: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub ledger_writable: bool,
    pub llm_available: bool,
    pub geolocation_available: bool,
    pub mailer_available: bool,
    pub active_sessions: usize,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error type with coded errors.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn unauthorized(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::UNAUTHORIZED, code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_001", msg)
    }

    pub fn validation(code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Validation failed", code).with_details(errors),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<tracker_core::Error> for ApiError {
    fn from(err: tracker_core::Error) -> Self {
        use tracker_core::Error;

        match &err {
            Error::Auth {
                code,
                message,
                http_status,
            } => {
                let status = StatusCode::from_u16(*http_status).unwrap_or(StatusCode::UNAUTHORIZED);
                ApiError::with_code(status, *code, message)
            }
            Error::ValidationWithCode { code, message, .. } => {
                ApiError::validation(*code, vec![message.clone()])
            }
            Error::Provider { code, message, .. } => {
                ApiError::with_code(StatusCode::INTERNAL_SERVER_ERROR, *code, message)
            }
            Error::Storage(msg) => {
                ApiError::with_code(StatusCode::INTERNAL_SERVER_ERROR, "STORE_001", msg)
            }
            Error::Validation(msg) => ApiError::bad_request(msg),
            Error::Serialization(e) => ApiError::bad_request(e.to_string()),
            _ => ApiError::internal(err.to_string()),
        }
    }
}
