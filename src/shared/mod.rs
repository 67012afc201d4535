//! Cross-cutting helpers: configuration, prompt registry, JSON output handling, logging.

pub mod config;
pub mod json;
pub mod logging;
pub mod prompts;
pub mod templates;
