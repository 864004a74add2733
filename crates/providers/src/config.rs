//! Provider configuration.

use serde::{Deserialize, Serialize};

/// Hosted LLM (Anthropic messages API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; chat and analysis degrade to fallbacks when unset
    pub api_key: Option<String>,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Token cap for chat replies
    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,
    /// Token cap for session analyses
    #[serde(default = "default_analysis_max_tokens")]
    pub analysis_max_tokens: u32,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_chat_max_tokens() -> u32 {
    500
}

fn default_analysis_max_tokens() -> u32 {
    400
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_model(),
            chat_max_tokens: default_chat_max_tokens(),
            analysis_max_tokens: default_analysis_max_tokens(),
            api_version: default_api_version(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// IP geolocation (ip-api.com compatible) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    #[serde(default = "default_geo_enabled")]
    pub enabled: bool,
    #[serde(default = "default_geo_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_geo_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geo_enabled() -> bool {
    true
}

fn default_geo_base_url() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_geo_timeout_secs() -> u64 {
    5
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: default_geo_enabled(),
            base_url: default_geo_base_url(),
            timeout_secs: default_geo_timeout_secs(),
        }
    }
}

/// Transport security for the SMTP relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Upgrade a plaintext connection (port 587)
    #[default]
    Starttls,
    /// Implicit TLS (port 465)
    Tls,
    /// No encryption; local relays only
    None,
}

/// SMTP alert configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay host; alerts are only logged when unset
    pub host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub security: SmtpSecurity,
    /// Sender mailbox; defaults to the username
    pub from: Option<String>,
    /// Alert recipient
    pub alert_to: Option<String>,
    /// Connection timeout in seconds
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout_secs() -> u64 {
    10
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            username: None,
            password: None,
            security: SmtpSecurity::default(),
            from: None,
            alert_to: None,
            timeout_secs: default_smtp_timeout_secs(),
        }
    }
}

impl SmtpConfig {
    /// True when a relay, a sender and a recipient are all known.
    pub fn is_configured(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.is_empty())
            && self.sender().is_some()
            && self.alert_to.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Sender mailbox: explicit `from`, else the login name.
    pub fn sender(&self) -> Option<&str> {
        self.from
            .as_deref()
            .or(self.username.as_deref())
            .filter(|s| !s.is_empty())
    }
}
