//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("LLM request failed: {0}")]
    Llm(String),

    /// Batch job ended in a terminal non-success state (failed, expired, cancelled).
    #[error("Batch {batch_id} ended with status {status}")]
    BatchFailed { batch_id: String, status: String },

    #[error("Web search failed: {0}")]
    Search(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Failed to parse model output: {0}")]
    Parse(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stage failed: {0}")]
    Stage(String),
}
