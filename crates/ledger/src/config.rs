//! Ledger configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const VISITORS_FILE: &str = "visitors.json";
pub const QUESTIONS_FILE: &str = "questions.json";
pub const ACTIVE_SESSIONS_FILE: &str = "active_sessions.json";

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Directory holding the JSON documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl LedgerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn visitors_path(&self) -> PathBuf {
        self.data_dir.join(VISITORS_FILE)
    }

    pub fn questions_path(&self) -> PathBuf {
        self.data_dir.join(QUESTIONS_FILE)
    }

    pub fn active_path(&self) -> PathBuf {
        self.data_dir.join(ACTIVE_SESSIONS_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
