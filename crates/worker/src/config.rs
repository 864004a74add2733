//! Tracker and chat relay configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracker_core::chat::DEFAULT_OUT_OF_SCOPE_MARKER;
use tracker_core::limits::{SESSION_IDLE_TIMEOUT, SWEEP_INTERVAL};

/// Session lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Idle time after which the sweeper finalizes a session
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Sweeper polling interval
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Sections whose first view is emailed; empty means every section
    #[serde(default)]
    pub alert_sections: Vec<String>,
}

fn default_idle_timeout_secs() -> u64 {
    SESSION_IDLE_TIMEOUT.as_secs()
}

fn default_sweep_interval_secs() -> u64 {
    SWEEP_INTERVAL.as_secs()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            alert_sections: Vec::new(),
        }
    }
}

impl TrackerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn alerts_on_section(&self, section: &str) -> bool {
        self.alert_sections.is_empty() || self.alert_sections.iter().any(|s| s == section)
    }
}

/// Chat relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Replaces the built-in policy preamble
    pub system_prompt: Option<String>,
    /// Substrings marking a deferred (out-of-scope) reply; the first one
    /// is the marker the preamble asks the assistant to emit
    #[serde(default = "default_markers")]
    pub out_of_scope_markers: Vec<String>,
}

fn default_markers() -> Vec<String> {
    vec![DEFAULT_OUT_OF_SCOPE_MARKER.to_string()]
}

impl ChatConfig {
    /// Marker named in the built-in preamble.
    pub fn prompt_marker(&self) -> &str {
        self.out_of_scope_markers
            .iter()
            .map(String::as_str)
            .find(|m| !m.is_empty())
            .unwrap_or(DEFAULT_OUT_OF_SCOPE_MARKER)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            out_of_scope_markers: default_markers(),
        }
    }
}
