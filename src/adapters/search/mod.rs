//! Web search adapters. Implement SearchPort.
//!
//! Tavily and Exa share one source digest format.

pub mod digest;
pub mod exa;
pub mod mock;
pub mod tavily;

pub use digest::{format_sources, SearchHit};
pub use exa::ExaSearchAdapter;
pub use mock::MockSearchAdapter;
pub use tavily::TavilySearchAdapter;
