//! LLM adapters. Implement LlmPort.
//!
//! OpenAI-compatible adapter plus a scripted mock for tests.

pub mod mock_adapter;
pub mod openai_adapter;

pub use mock_adapter::MockLlmAdapter;
pub use openai_adapter::OpenAiAdapter;
