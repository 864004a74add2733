//! Admin authentication types.
//!
//! Admins exchange an access code for an opaque bearer token. Tokens are
//! 32 lowercase hex characters; anything else is rejected as malformed before
//! any lookup happens.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AuthErrorCode, Error, Result};

/// Admin token format.
pub const ADMIN_TOKEN_PATTERN: &str = r"^[0-9a-f]{32}$";

/// Compiled admin token regex (lazy initialization).
static ADMIN_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ADMIN_TOKEN_PATTERN).expect("invalid admin token pattern"));

/// Syntactically valid admin token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdminToken(String);

impl AdminToken {
    /// Issues a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse and validate a token.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::auth(AuthErrorCode::MissingToken, "Admin token is required"));
        }
        if !ADMIN_TOKEN_REGEX.is_match(token) {
            return Err(Error::auth(
                AuthErrorCode::MalformedToken,
                "Invalid admin token format",
            ));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract an admin token from the request.
///
/// Checks in order:
/// 1. `?token=<token>` query parameter
/// 2. `Authorization: Bearer <token>`
pub fn extract_admin_token(query_token: Option<&str>, auth_header: Option<&str>) -> Result<AdminToken> {
    if let Some(token) = query_token {
        return AdminToken::parse(token);
    }

    if let Some(token) = auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        return AdminToken::parse(token);
    }

    Err(Error::auth(AuthErrorCode::MissingToken, "Admin token is required"))
}

/// Compares an access code against the configured one in constant time.
///
/// An unset or empty configured code rejects everything.
pub fn verify_access_code(expected: Option<&str>, provided: &str) -> Result<()> {
    let Some(expected) = expected.filter(|c| !c.is_empty()) else {
        return Err(Error::auth(AuthErrorCode::InvalidCode, "Admin access is disabled"));
    };

    let a = expected.as_bytes();
    let b = provided.trim().as_bytes();
    let mut diff = a.len() ^ b.len();
    for (i, byte) in a.iter().enumerate() {
        diff |= usize::from(byte ^ b.get(i).copied().unwrap_or(0));
    }

    if diff == 0 {
        Ok(())
    } else {
        Err(Error::auth(AuthErrorCode::InvalidCode, "Invalid access code"))
    }
}

/// Request body for `POST /api/admin/auth`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminAuthRequest {
    #[validate(length(max = 256))]
    pub code: String,
}

/// Successful admin authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAuthResponse {
    pub success: bool,
    pub token: String,
}
