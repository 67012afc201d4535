//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::DomainError;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Which configured model serves a request. Planner handles merging and
/// repair of whole networks; writer handles corrections and short texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Planner,
    Writer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One chat completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Caller-chosen id; batch results are keyed by it.
    pub id: String,
    pub tier: ModelTier,
    pub messages: Vec<ChatMessage>,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
    pub max_completion_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(id: impl Into<String>, tier: ModelTier, messages: Vec<ChatMessage>) -> Self {
        Self {
            id: id.into(),
            tier,
            messages,
            json_mode: false,
            max_completion_tokens: None,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn with_max_completion_tokens(mut self, tokens: u32) -> Self {
        self.max_completion_tokens = Some(tokens);
        self
    }
}

/// Chat-completion LLM provider.
#[async_trait::async_trait]
pub trait LlmPort: Send + Sync {
    /// Send one request and return the assistant message text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError>;

    /// True when `complete_batch` is backed by an offline batch endpoint.
    fn supports_batch(&self) -> bool {
        false
    }

    /// Run many requests as one offline batch. Returns content per request id;
    /// requests that failed inside the batch are absent from the map.
    async fn complete_batch(
        &self,
        _requests: &[CompletionRequest],
    ) -> Result<HashMap<String, String>, DomainError> {
        Err(DomainError::Llm(
            "batch completions are not supported by this provider".to_string(),
        ))
    }
}

/// Web search provider.
#[async_trait::async_trait]
pub trait SearchPort: Send + Sync {
    /// Run all queries and return one deduplicated, formatted digest of the sources.
    async fn search(&self, queries: &[String]) -> Result<String, DomainError>;
}

/// Stage output store (intermediate and final files).
#[async_trait::async_trait]
pub trait ArtifactPort: Send + Sync {
    /// Write one equation per line.
    async fn write_lines(&self, name: &str, lines: &[String]) -> Result<PathBuf, DomainError>;

    async fn write_text(&self, name: &str, text: &str) -> Result<PathBuf, DomainError>;

    /// Pretty-printed JSON.
    async fn write_json(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<PathBuf, DomainError>;
}
