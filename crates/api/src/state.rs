//! Application state shared across handlers.

use ledger::Ledger;
use moka::future::Cache;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracker_core::limits::ADMIN_TOKEN_TTL;
use tracker_core::{verify_access_code, AdminToken, AuthErrorCode, Error, Result};
use worker::{ChatRelay, SessionTracker};

/// Maximum concurrently issued admin tokens.
const ADMIN_TOKEN_MAX_CAPACITY: u64 = 1_000;

/// Admin access: exchanges the access code for short-lived tokens.
///
/// Issued tokens live in an in-memory cache and expire after
/// [`ADMIN_TOKEN_TTL`]; a restart invalidates them all.
#[derive(Clone)]
pub struct AdminAuth {
    code: Option<String>,
    tokens: Cache<String, ()>,
}

impl AdminAuth {
    pub fn new(code: Option<String>) -> Self {
        if code.as_deref().map_or(true, str::is_empty) {
            warn!("ADMIN_CODE not set, admin API disabled");
        }

        Self {
            code,
            tokens: Cache::builder()
                .max_capacity(ADMIN_TOKEN_MAX_CAPACITY)
                .time_to_live(ADMIN_TOKEN_TTL)
                .build(),
        }
    }

    /// Issues a token for a correct access code.
    pub async fn login(&self, code: &str) -> Result<AdminToken> {
        verify_access_code(self.code.as_deref(), code)?;

        let token = AdminToken::generate();
        self.tokens.insert(token.as_str().to_string(), ()).await;
        info!("Admin token issued");
        Ok(token)
    }

    /// Accepts only tokens issued by [`AdminAuth::login`] and not expired.
    pub async fn validate(&self, token: &AdminToken) -> Result<()> {
        if self.tokens.get(token.as_str()).await.is_some() {
            debug!("Admin token accepted");
            Ok(())
        } else {
            Err(Error::auth(AuthErrorCode::InvalidToken, "Unknown or expired admin token"))
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<SessionTracker>,
    pub chat: Arc<ChatRelay>,
    pub ledger: Arc<Ledger>,
    pub admin: AdminAuth,
    /// Static landing page assets
    pub static_dir: Option<PathBuf>,
    /// Read the client address from forwarding headers
    pub trust_proxy: bool,
}

impl AppState {
    pub fn new(
        tracker: Arc<SessionTracker>,
        chat: Arc<ChatRelay>,
        ledger: Arc<Ledger>,
        admin_code: Option<String>,
    ) -> Self {
        Self {
            tracker,
            chat,
            ledger,
            admin: AdminAuth::new(admin_code),
            static_dir: None,
            trust_proxy: false,
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }
}
