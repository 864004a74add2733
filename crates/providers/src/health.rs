//! Startup checks for external collaborators.

use telemetry::health;
use tracing::{error, info, warn};

use crate::config::{LlmConfig, SmtpConfig};
use crate::mailer::Mailer;

/// Marks the LLM component from configuration alone.
///
/// No request is made; the first completion updates the state.
pub fn check_llm(config: &LlmConfig) -> bool {
    if config.is_configured() {
        health().llm.set_healthy();
        true
    } else {
        warn!("LLM API key not configured, chat will return the fallback reply");
        health().llm.set_unhealthy("API key not configured");
        false
    }
}

/// Geolocation is assumed reachable until a lookup fails.
pub fn check_geolocation(enabled: bool) -> bool {
    if enabled {
        health().geolocation.set_healthy();
    } else {
        health().geolocation.set_unhealthy("disabled");
    }
    enabled
}

/// Verifies the SMTP relay accepts connections.
pub async fn check_mailer(config: &SmtpConfig, mailer: &dyn Mailer) -> bool {
    if !config.is_configured() {
        health().mailer.set_unhealthy("SMTP not configured");
        return false;
    }

    match mailer.test_connection().await {
        Ok(true) => {
            info!("SMTP relay reachable");
            health().mailer.set_healthy();
            true
        }
        Ok(false) => {
            error!("SMTP relay refused connection");
            health().mailer.set_unhealthy("relay refused connection");
            false
        }
        Err(e) => {
            error!(error = %e, "SMTP connection check failed");
            health().mailer.set_unhealthy(e.to_string());
            false
        }
    }
}
