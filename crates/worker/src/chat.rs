//! Chat relay: forwards visitor questions to the LLM and logs the exchange.

use chrono::Utc;
use ledger::Ledger;
use providers::{Completion, CompletionRequest};
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{info, warn};
use tracker_core::{Classification, QuestionLogEntry, Result};

use crate::config::ChatConfig;
use crate::notifications::{Notification, Notifier};
use crate::prompts::chat_system_prompt;
use crate::tracker::SessionTracker;

/// A classified assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub classification: Classification,
}

impl ChatReply {
    /// True when the question was deferred to the owner.
    pub fn logged(&self) -> bool {
        self.classification.is_out_of_scope()
    }
}

pub struct ChatRelay {
    completion: Arc<dyn Completion>,
    system_prompt: String,
    markers: Vec<String>,
    max_tokens: u32,
    ledger: Arc<Ledger>,
    tracker: Arc<SessionTracker>,
    notifier: Arc<Notifier>,
}

impl ChatRelay {
    pub fn new(
        config: ChatConfig,
        max_tokens: u32,
        completion: Arc<dyn Completion>,
        ledger: Arc<Ledger>,
        tracker: Arc<SessionTracker>,
        notifier: Arc<Notifier>,
    ) -> Self {
        let system_prompt = match config.system_prompt.as_deref() {
            Some(prompt) if !prompt.trim().is_empty() => prompt.to_string(),
            _ => chat_system_prompt(config.prompt_marker()),
        };

        Self {
            completion,
            system_prompt,
            markers: config.out_of_scope_markers,
            max_tokens,
            ledger,
            tracker,
            notifier,
        }
    }

    /// Answers one question.
    ///
    /// On provider failure the error is returned and nothing is recorded.
    pub async fn ask(&self, message: &str, session_id: Option<&str>) -> Result<ChatReply> {
        metrics().chat_requests.inc();

        let request = CompletionRequest::single(self.system_prompt.clone(), message, self.max_tokens);
        let start = Instant::now();
        let result = self.completion.complete(request).await;
        metrics()
            .chat_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        let response = match result {
            Ok(text) => text,
            Err(e) => {
                metrics().chat_failures.inc();
                warn!(session_id = ?session_id, error = %e, "Chat completion failed");
                return Err(e);
            }
        };

        let classification = Classification::of_reply(&response, &self.markers);
        let session_id = session_id.filter(|id| !id.is_empty()).map(str::to_string);

        let entry = QuestionLogEntry::new(
            session_id.clone(),
            message,
            response.clone(),
            classification,
            Utc::now(),
        );
        // Errors are counted and logged by the ledger
        let _ = self.ledger.append_question(entry).await;

        if let Some(id) = session_id.as_deref() {
            self.tracker.record_chat(id, message, &response).await;
        }

        info!(
            session_id = ?session_id,
            classification = classification.as_str(),
            "Chat question answered"
        );

        if classification.is_out_of_scope() {
            metrics().chat_out_of_scope.inc();
            self.notifier
                .send(Notification::OutOfScopeQuestion {
                    session_id,
                    question: message.to_string(),
                    response: response.clone(),
                })
                .await;
        }

        Ok(ChatReply {
            response,
            classification,
        })
    }
}
