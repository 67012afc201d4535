//! OpenAI-compatible adapter for chat completions and the Batch API.
//!
//! Works with the OpenAI API and any server exposing `/chat/completions`
//! (batch support additionally needs `/files` and `/batches`).

use crate::domain::DomainError;
use crate::ports::{ChatMessage, CompletionRequest, LlmPort, ModelTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const BATCH_ENDPOINT: &str = "/v1/chat/completions";
const BATCH_COMPLETION_WINDOW: &str = "24h";

pub struct OpenAiAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    planner_model: String,
    writer_model: String,
    seed: i64,
    poll_interval: Duration,
}

impl OpenAiAdapter {
    /// # Arguments
    /// * `base_url` - API root without trailing slash (e.g. "https://api.openai.com/v1")
    /// * `api_key` - Bearer token
    /// * `planner_model` / `writer_model` - model per [`ModelTier`]
    pub fn new(
        base_url: String,
        api_key: String,
        planner_model: String,
        writer_model: String,
        seed: i64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            planner_model,
            writer_model,
            seed,
            poll_interval: Duration::from_secs(300),
        }
    }

    /// Interval between batch status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Planner => &self.planner_model,
            ModelTier::Writer => &self.writer_model,
        }
    }

    fn chat_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: self.model_for(request.tier),
            messages: &request.messages,
            seed: self.seed,
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
            max_completion_tokens: request.max_completion_tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fail with status and truncated body on non-2xx responses.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DomainError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %text, "AI API returned error");
        Err(DomainError::Llm(format!(
            "API error {}: {}",
            status,
            text.chars().take(200).collect::<String>()
        )))
    }

    async fn upload_batch_file(&self, jsonl: String) -> Result<String, DomainError> {
        let part = reqwest::multipart::Part::bytes(jsonl.into_bytes())
            .file_name("batch_input.jsonl")
            .mime_str("application/jsonl")
            .map_err(|e| DomainError::Llm(format!("invalid mime type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "batch")
            .part("file", part);

        let response = self
            .client
            .post(self.url("/files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DomainError::Llm(format!("file upload failed: {}", e)))?;
        let file: FileObject = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Llm(format!("Failed to parse file response: {}", e)))?;
        Ok(file.id)
    }

    async fn create_batch(&self, input_file_id: &str) -> Result<BatchObject, DomainError> {
        let body = serde_json::json!({
            "input_file_id": input_file_id,
            "endpoint": BATCH_ENDPOINT,
            "completion_window": BATCH_COMPLETION_WINDOW,
        });
        let response = self
            .client
            .post(self.url("/batches"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Llm(format!("batch create failed: {}", e)))?;
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Llm(format!("Failed to parse batch response: {}", e)))
    }

    async fn retrieve_batch(&self, batch_id: &str) -> Result<BatchObject, DomainError> {
        let response = self
            .client
            .get(self.url(&format!("/batches/{}", batch_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| DomainError::Llm(format!("batch status request failed: {}", e)))?;
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Llm(format!("Failed to parse batch response: {}", e)))
    }

    /// Poll until the batch reaches a terminal state.
    async fn wait_for_batch(&self, mut batch: BatchObject) -> Result<BatchObject, DomainError> {
        loop {
            match batch.status.as_str() {
                "completed" => return Ok(batch),
                "failed" | "expired" | "cancelled" => {
                    return Err(DomainError::BatchFailed {
                        batch_id: batch.id,
                        status: batch.status,
                    });
                }
                status => {
                    info!(batch_id = %batch.id, status, "batch in progress, waiting");
                    tokio::time::sleep(self.poll_interval).await;
                    batch = self.retrieve_batch(&batch.id).await?;
                }
            }
        }
    }

    async fn download_file(&self, file_id: &str) -> Result<String, DomainError> {
        let response = self
            .client
            .get(self.url(&format!("/files/{}/content", file_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| DomainError::Llm(format!("file download failed: {}", e)))?;
        Self::check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| DomainError::Llm(format!("file download failed: {}", e)))
    }
}

/// Parse batch output JSONL into content per `custom_id`. Errored entries are skipped.
fn parse_batch_output(jsonl: &str) -> HashMap<String, String> {
    let mut results = HashMap::new();
    for line in jsonl.lines().filter(|l| !l.trim().is_empty()) {
        let entry: BatchOutputLine = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable batch output line");
                continue;
            }
        };
        let content = entry
            .response
            .filter(|r| (200..300).contains(&r.status_code))
            .and_then(|r| r.body.choices.into_iter().next())
            .and_then(|c| c.message.content);
        match content {
            Some(content) => {
                results.insert(entry.custom_id, content);
            }
            None => warn!(custom_id = %entry.custom_id, "batch request failed"),
        }
    }
    results
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    seed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize)]
struct BatchInputLine<'a> {
    custom_id: &'a str,
    method: &'static str,
    url: &'static str,
    body: ChatRequest<'a>,
}

/// OpenAI API response structure.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

#[derive(Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Deserialize)]
struct BatchObject {
    id: String,
    status: String,
    #[serde(default)]
    output_file_id: Option<String>,
}

#[derive(Deserialize)]
struct BatchOutputLine {
    custom_id: String,
    #[serde(default)]
    response: Option<BatchOutputResponse>,
}

#[derive(Deserialize)]
struct BatchOutputResponse {
    status_code: u16,
    body: ChatResponse,
}

#[async_trait::async_trait]
impl LlmPort for OpenAiAdapter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let body = self.chat_body(request);
        info!(
            id = %request.id,
            model = body.model,
            messages = request.messages.len(),
            json = request.json_mode,
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.url("/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Llm(format!("HTTP request failed: {}", e)))?;

        let chat_response: ChatResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Llm(format!("Failed to parse API response: {}", e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Llm("No response choices returned".to_string()))?;

        debug!(id = %request.id, len = content.len(), "received chat completion");
        Ok(content)
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn complete_batch(
        &self,
        requests: &[CompletionRequest],
    ) -> Result<HashMap<String, String>, DomainError> {
        if requests.is_empty() {
            return Ok(HashMap::new());
        }

        let mut jsonl = String::new();
        for request in requests {
            let line = BatchInputLine {
                custom_id: &request.id,
                method: "POST",
                url: BATCH_ENDPOINT,
                body: self.chat_body(request),
            };
            let encoded = serde_json::to_string(&line)
                .map_err(|e| DomainError::Llm(format!("batch encode failed: {}", e)))?;
            jsonl.push_str(&encoded);
            jsonl.push('\n');
        }

        let input_file_id = self.upload_batch_file(jsonl).await?;
        let batch = self.create_batch(&input_file_id).await?;
        info!(batch_id = %batch.id, requests = requests.len(), "batch created");

        let batch = self.wait_for_batch(batch).await?;
        let output_file_id = batch.output_file_id.ok_or_else(|| {
            DomainError::Llm(format!("batch {} completed without output file", batch.id))
        })?;
        let output = self.download_file(&output_file_id).await?;
        let results = parse_batch_output(&output);
        info!(
            batch_id = %batch.id,
            received = results.len(),
            requested = requests.len(),
            "batch results downloaded"
        );
        Ok(results)
    }
}
