//! Fixed-digest search adapter for tests.

use crate::domain::DomainError;
use crate::ports::SearchPort;
use std::sync::Mutex;
use tracing::info;

pub struct MockSearchAdapter {
    digest: String,
    queries: Mutex<Vec<String>>,
}

impl MockSearchAdapter {
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every query received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SearchPort for MockSearchAdapter {
    async fn search(&self, queries: &[String]) -> Result<String, DomainError> {
        info!(queries = queries.len(), "[MOCK] web search");
        if let Ok(mut seen) = self.queries.lock() {
            seen.extend(queries.iter().cloned());
        }
        Ok(self.digest.clone())
    }
}
