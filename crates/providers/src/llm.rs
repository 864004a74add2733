//! Hosted LLM client (Anthropic messages API).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tracing::{debug, warn};
use tracker_core::{Error, Result};

use crate::config::LlmConfig;

/// Conversation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Provider-agnostic completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Policy preamble
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Single-turn request.
    pub fn single(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens,
        }
    }
}

/// Text completion provider.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Returns the reply text. One attempt, no retries.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Concatenates the text blocks of a messages API response.
fn extract_text(response: MessagesResponse) -> Result<String> {
    let text: String = response
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(Error::llm("Empty completion"));
    }
    Ok(text)
}

/// Anthropic messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    config: LlmConfig,
    http_client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn send(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::llm("LLM API key not configured"))?;

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: &request.messages,
        };

        debug!(url = %url, model = %self.config.model, "Calling LLM provider");

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::llm(format!("LLM request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| format!("{}: {}", b.error.kind, b.error.message))
                .unwrap_or(text);
            return Err(Error::llm(format!("LLM provider returned {}: {}", status, detail)));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Invalid LLM response: {}", e)))?;

        extract_text(parsed)
    }
}

#[async_trait]
impl Completion for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let start = Instant::now();
        let result = self.send(&request).await;

        match &result {
            Ok(_) => {
                health().llm.set_healthy();
                debug!(latency_ms = start.elapsed().as_millis() as u64, "LLM completion received");
            }
            Err(e) => {
                metrics().llm_errors.inc();
                health().llm.set_unhealthy(e.to_string());
                warn!(error = %e, "LLM completion failed");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = CompletionRequest::single("be brief", "what is BMAD?", 500);
        let body = MessagesRequest {
            model: "claude-test",
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: &request.messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-test");
        assert_eq!(json["system"], "be brief");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "what is BMAD?");
    }

    #[test]
    fn test_extract_text_joins_text_blocks() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Hello "},{"type":"tool_use","id":"x"},{"type":"text","text":"there"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello there");
    }

    #[test]
    fn test_extract_text_rejects_empty() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(extract_text(response).is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let client = AnthropicClient::new(LlmConfig::default()).unwrap();
        let err = client
            .complete(CompletionRequest::single("s", "q", 10))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some("PROV_001"));
    }
}
