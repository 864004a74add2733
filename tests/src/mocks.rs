//! Mock implementations for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use providers::{Completion, CompletionRequest, EmailMessage, GeoLocator, Mailer};
use std::net::IpAddr;
use std::sync::Arc;
use tracker_core::{Error, GeoLocation, Result};

/// Mock LLM that returns a scripted reply and records every request.
///
/// Implements the same `Completion` trait as the real Anthropic client.
#[derive(Clone)]
pub struct MockCompletion {
    reply: Arc<Mutex<String>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Arc::new(Mutex::new(reply.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Set the reply returned by subsequent calls.
    pub fn set_reply(&self, reply: impl Into<String>) {
        *self.reply.lock() = reply.into();
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Completion for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.requests.lock().push(request);
        if *self.should_fail.lock() {
            return Err(Error::llm("Mock LLM failure"));
        }
        Ok(self.reply.lock().clone())
    }
}

/// Mock geolocation returning a fixed location, or failing.
#[derive(Clone)]
pub struct MockGeo {
    location: Option<GeoLocation>,
    lookups: Arc<Mutex<Vec<IpAddr>>>,
}

impl MockGeo {
    pub fn new(location: GeoLocation) -> Self {
        Self {
            location: Some(location),
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            location: None,
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn lookups(&self) -> Vec<IpAddr> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl GeoLocator for MockGeo {
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation> {
        self.lookups.lock().push(ip);
        self.location
            .clone()
            .ok_or_else(|| Error::geolocation("Mock geolocation failure"))
    }
}

/// Mock mailer that captures alert emails in memory.
#[derive(Clone, Default)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }

    /// Number of captured emails whose subject starts with `prefix`.
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.subject.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        self.sent.lock().push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_completion_records_and_fails() {
        let llm = MockCompletion::new("hello");
        let request = CompletionRequest::single("system", "question", 10);

        assert_eq!(llm.complete(request.clone()).await.unwrap(), "hello");
        llm.set_should_fail(true);
        assert!(llm.complete(request).await.is_err());
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_mailer_counts_by_subject() {
        let mailer = MockMailer::new();
        mailer.send(EmailMessage::new("New visitor from X", "")).await.unwrap();
        mailer.send(EmailMessage::new("Session ended (explicit) - X", "")).await.unwrap();
        assert_eq!(mailer.count_with_prefix("Session ended"), 1);
    }
}
