//! Unified error types for the landing engine.
//!
//! Error codes:
//! - AUTH_001-004: Admin authentication errors
//! - VALID_001-002: Request validation errors
//! - PROV_001-003: Upstream provider errors (LLM, geolocation, mail)
//! - STORE_001: Ledger persistence errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Admin authentication error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// AUTH_001: Token is required
    MissingToken,
    /// AUTH_002: Token is malformed
    MalformedToken,
    /// AUTH_003: Token is unknown or expired
    InvalidToken,
    /// AUTH_004: Access code rejected
    InvalidCode,
}

impl AuthErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "AUTH_001",
            Self::MalformedToken => "AUTH_002",
            Self::InvalidToken => "AUTH_003",
            Self::InvalidCode => "AUTH_004",
        }
    }

    /// All admin auth failures are 401.
    pub fn http_status(&self) -> u16 {
        401
    }
}

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Invalid JSON / invalid format
    InvalidFormat,
    /// VALID_002: Field exceeds its length limit
    FieldTooLong,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::FieldTooLong => "VALID_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Upstream provider error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    /// PROV_001: LLM completion failed
    Llm,
    /// PROV_002: Geolocation lookup failed
    Geolocation,
    /// PROV_003: Mail delivery failed
    Mail,
}

impl ProviderErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Llm => "PROV_001",
            Self::Geolocation => "PROV_002",
            Self::Mail => "PROV_003",
        }
    }

    /// Provider failures surface as a generic server error.
    pub fn http_status(&self) -> u16 {
        500
    }
}

/// Unified error type for the landing engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication error with code.
    #[error("[{code}] {message}")]
    Auth {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Validation error with code.
    #[error("[{code}] {message}")]
    ValidationWithCode {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Upstream provider error with code.
    #[error("[{code}] {message}")]
    Provider {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Ledger persistence error.
    #[error("[STORE_001] {0}")]
    Storage(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an authentication error.
    pub fn auth(code: AuthErrorCode, msg: impl Into<String>) -> Self {
        Self::Auth {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a validation error with code.
    pub fn validation_code(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::ValidationWithCode {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a provider error.
    pub fn provider(code: ProviderErrorCode, msg: impl Into<String>) -> Self {
        Self::Provider {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::provider(ProviderErrorCode::Llm, msg)
    }

    pub fn geolocation(msg: impl Into<String>) -> Self {
        Self::provider(ProviderErrorCode::Geolocation, msg)
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        Self::provider(ProviderErrorCode::Mail, msg)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_session(id: impl Into<String>) -> Self {
        Self::UnknownSession(id.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Auth { http_status, .. } => *http_status,
            Self::ValidationWithCode { http_status, .. } => *http_status,
            Self::Provider { http_status, .. } => *http_status,
            Self::Storage(_) => 500,
            Self::Validation(_) => 400,
            Self::Serialization(_) => 400,
            Self::Io(_) => 500,
            Self::UnknownSession(_) => 404,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Auth { code, .. } => Some(code),
            Self::ValidationWithCode { code, .. } => Some(code),
            Self::Provider { code, .. } => Some(code),
            Self::Storage(_) => Some("STORE_001"),
            _ => None,
        }
    }
}
