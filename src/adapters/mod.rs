//! Infrastructure adapters. Implement outbound ports.
//!
//! LLM provider, web search, filesystem, terminal UI. Map errors to DomainError.

pub mod ai;
pub mod persistence;
pub mod search;
pub mod ui;
