//! Structured model output: fence stripping and typed decoding.

use crate::domain::DomainError;
use crate::ports::{CompletionRequest, LlmPort};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Sanitize a JSON response from an LLM.
///
/// Models sometimes wrap JSON in markdown code blocks or surround it with prose.
pub fn sanitize_json(raw_text: &str) -> String {
    let trimmed = raw_text.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = rest.strip_prefix("json").unwrap_or(rest);
        let body = match body.rfind("```") {
            Some(end) => &body[..end],
            None => body,
        };
        return body.trim().to_string();
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

/// Decode model output into `T`.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, DomainError> {
    let clean = sanitize_json(raw);
    serde_json::from_str(&clean).map_err(|e| {
        warn!(error = %e, json = %clean.chars().take(200).collect::<String>(), "JSON parse failed");
        DomainError::Parse(format!("{}: {}", e, clean.chars().take(200).collect::<String>()))
    })
}

/// Send a JSON-mode request and decode the reply.
pub async fn request_structured<T: DeserializeOwned>(
    llm: &dyn LlmPort,
    request: CompletionRequest,
) -> Result<T, DomainError> {
    let request = request.json();
    let raw = llm.complete(&request).await?;
    debug!(id = %request.id, raw_len = raw.len(), "structured response received");
    parse_structured(&raw)
}
