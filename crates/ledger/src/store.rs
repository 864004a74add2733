//! Single-owner ledger over the JSON documents.

use std::collections::BTreeMap;
use telemetry::{health, metrics};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use tracker_core::{Error, QuestionLogEntry, Result, Session};

use crate::config::LedgerConfig;
use crate::files::{load_or_default, write_atomic};

/// Active-session snapshot keyed by session id.
pub type ActiveSnapshot = BTreeMap<String, Session>;

/// Owner of the visitor, question and active-session documents.
///
/// Each document is held in memory behind its own async mutex and rewritten
/// whole on every change, so the files are never read-modified-written.
pub struct Ledger {
    config: LedgerConfig,
    visitors: Mutex<Vec<Session>>,
    questions: Mutex<Vec<QuestionLogEntry>>,
    active: Mutex<()>,
}

impl Ledger {
    /// Opens the ledger, creating the data directory if needed.
    pub async fn open(config: LedgerConfig) -> Result<Self> {
        tokio::fs::create_dir_all(config.data_dir())
            .await
            .map_err(|e| {
                health().ledger.set_unhealthy(e.to_string());
                Error::storage(format!(
                    "Failed to create data directory {}: {}",
                    config.data_dir().display(),
                    e
                ))
            })?;

        let visitors: Vec<Session> = load_or_default(&config.visitors_path()).await?;
        let questions: Vec<QuestionLogEntry> = load_or_default(&config.questions_path()).await?;

        info!(
            data_dir = %config.data_dir().display(),
            visitors = visitors.len(),
            questions = questions.len(),
            "Ledger opened"
        );
        health().ledger.set_healthy();

        Ok(Self {
            config,
            visitors: Mutex::new(visitors),
            questions: Mutex::new(questions),
            active: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Inserts a visitor record or replaces the one with the same id.
    pub async fn upsert_visitor(&self, session: &Session) -> Result<()> {
        let mut visitors = self.visitors.lock().await;
        match visitors.iter_mut().find(|v| v.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => visitors.push(session.clone()),
        }

        let result = write_atomic(&self.config.visitors_path(), &*visitors).await;
        debug!(session_id = %session.id, active = session.active, "Visitor record written");
        track_write(result)
    }

    /// Appends an entry to the question log.
    pub async fn append_question(&self, entry: QuestionLogEntry) -> Result<()> {
        let mut questions = self.questions.lock().await;
        questions.push(entry);
        track_write(write_atomic(&self.config.questions_path(), &*questions).await)
    }

    /// Rewrites the active-session snapshot.
    ///
    /// The snapshot is taken while the write lock is held so a slower writer
    /// can never replace a newer snapshot with an older one.
    pub async fn save_active<F>(&self, snapshot: F) -> Result<()>
    where
        F: FnOnce() -> ActiveSnapshot,
    {
        let _guard = self.active.lock().await;
        let sessions = snapshot();
        track_write(write_atomic(&self.config.active_path(), &sessions).await)
    }

    /// Loads the active-session snapshot left by a previous run.
    pub async fn load_active(&self) -> Result<ActiveSnapshot> {
        let _guard = self.active.lock().await;
        load_or_default(&self.config.active_path()).await
    }

    pub async fn visitors(&self) -> Vec<Session> {
        self.visitors.lock().await.clone()
    }

    pub async fn visitor(&self, id: &str) -> Option<Session> {
        self.visitors.lock().await.iter().find(|v| v.id == id).cloned()
    }

    pub async fn questions(&self) -> Vec<QuestionLogEntry> {
        self.questions.lock().await.clone()
    }
}

fn track_write(result: Result<()>) -> Result<()> {
    match &result {
        Ok(()) => health().ledger.set_healthy(),
        Err(e) => {
            metrics().ledger_write_errors.inc();
            health().ledger.set_unhealthy(e.to_string());
            error!(error = %e, "Ledger write failed");
        }
    }
    result
}
