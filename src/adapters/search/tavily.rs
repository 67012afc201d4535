//! Tavily web search. Implements SearchPort.

use super::digest::{format_sources, SearchHit};
use crate::domain::DomainError;
use crate::ports::SearchPort;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

const TAVILY_API_URL: &str = "https://api.tavily.com";

pub struct TavilySearchAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: usize,
    max_chars_per_source: usize,
}

impl TavilySearchAdapter {
    pub fn new(api_key: String, max_results: usize, max_chars_per_source: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: TAVILY_API_URL.to_string(),
            api_key,
            max_results,
            max_chars_per_source,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn search_one(&self, query: &str) -> Result<Vec<SearchHit>, DomainError> {
        let body = json!({
            "query": query,
            "max_results": self.max_results,
            "include_raw_content": true,
            "topic": "general",
        });
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Search(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DomainError::Search(format!(
                "Tavily API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Search(format!("Failed to parse Tavily response: {}", e)))?;
        Ok(parsed
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
                raw_content: r.raw_content,
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    raw_content: Option<String>,
}

#[async_trait::async_trait]
impl SearchPort for TavilySearchAdapter {
    async fn search(&self, queries: &[String]) -> Result<String, DomainError> {
        let mut hits = Vec::new();
        let mut failures = 0;
        for query in queries {
            match self.search_one(query).await {
                Ok(found) => {
                    info!(query = %query, results = found.len(), "Tavily search done");
                    hits.extend(found);
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Tavily search failed");
                    failures += 1;
                }
            }
        }
        if !queries.is_empty() && failures == queries.len() {
            return Err(DomainError::Search("all Tavily queries failed".to_string()));
        }
        Ok(format_sources(&hits, self.max_chars_per_source))
    }
}
