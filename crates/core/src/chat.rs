//! Chat relay types: reply classification and the question log record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker the assistant is instructed to emit for questions it defers.
pub const DEFAULT_OUT_OF_SCOPE_MARKER: &str = "📝";

/// Reply shown when the LLM provider fails.
pub const FALLBACK_REPLY: &str =
    "Sorry, something went wrong on our side. Please try again, or ask your question during the call!";

/// Whether a question was answered from the document or deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    InScope,
    OutOfScope,
}

impl Classification {
    /// Out of scope when the reply contains any of the non-empty markers.
    pub fn of_reply<S: AsRef<str>>(reply: &str, markers: &[S]) -> Self {
        let flagged = markers
            .iter()
            .map(AsRef::as_ref)
            .any(|marker| !marker.is_empty() && reply.contains(marker));
        if flagged {
            Self::OutOfScope
        } else {
            Self::InScope
        }
    }

    pub fn is_out_of_scope(&self) -> bool {
        matches!(self, Self::OutOfScope)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InScope => "in-scope",
            Self::OutOfScope => "out-of-scope",
        }
    }
}

/// Immutable question log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub question: String,
    pub response: String,
    #[serde(rename = "type")]
    pub classification: Classification,
}

impl QuestionLogEntry {
    pub fn new(
        session_id: Option<String>,
        question: impl Into<String>,
        response: impl Into<String>,
        classification: Classification,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            session_id,
            question: question.into(),
            response: response.into(),
            classification,
        }
    }
}
