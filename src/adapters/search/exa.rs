//! Exa web search. Implements SearchPort.

use super::digest::{format_sources, SearchHit};
use crate::domain::DomainError;
use crate::ports::SearchPort;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

const EXA_API_URL: &str = "https://api.exa.ai";
const NUM_RESULTS_MAX: usize = 100;

pub struct ExaSearchAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: usize,
    max_chars_per_source: usize,
}

impl ExaSearchAdapter {
    pub fn new(api_key: String, max_results: usize, max_chars_per_source: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: EXA_API_URL.to_string(),
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
            "numResults": self.max_results.min(NUM_RESULTS_MAX),
            "type": "auto",
            "contents": {
                "text": { "maxCharacters": self.max_chars_per_source },
                "highlights": { "numSentences": 3 },
            },
        });
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Search(format!("Exa request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DomainError::Search(format!(
                "Exa API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ExaResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Search(format!("Failed to parse Exa response: {}", e)))?;
        Ok(parsed.results.into_iter().map(ExaResult::into_hit).collect())
    }
}

#[derive(Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Deserialize)]
struct ExaResult {
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    highlights: Vec<String>,
}

impl ExaResult {
    /// Summary, else highlights, else the start of the page text.
    fn into_hit(self) -> SearchHit {
        let content = self
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| (!self.highlights.is_empty()).then(|| self.highlights.join(" ")))
            .or_else(|| {
                self.text
                    .as_deref()
                    .map(|t| t.chars().take(500).collect::<String>())
            })
            .unwrap_or_default();
        SearchHit {
            title: self.title.unwrap_or_else(|| "(no title)".to_string()),
            url: self.url,
            content,
            raw_content: self.text,
        }
    }
}

#[async_trait::async_trait]
impl SearchPort for ExaSearchAdapter {
    async fn search(&self, queries: &[String]) -> Result<String, DomainError> {
        let mut hits = Vec::new();
        let mut failures = 0;
        for query in queries {
            match self.search_one(query).await {
                Ok(found) => {
                    info!(query = %query, results = found.len(), "Exa search done");
                    hits.extend(found);
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Exa search failed");
                    failures += 1;
                }
            }
        }
        if !queries.is_empty() && failures == queries.len() {
            return Err(DomainError::Search("all Exa queries failed".to_string()));
        }
        Ok(format_sources(&hits, self.max_chars_per_source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_prefers_highlights() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("x-api-key", "exa-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"title": "AKT crosstalk", "url": "https://x/1", "text": "full page", "highlights": ["AKT phosphorylates RAF"]},
                    {"url": "https://x/2", "text": "only text"}
                ]
            })))
            .mount(&server)
            .await;

        let adapter = ExaSearchAdapter::new("exa-key".to_string(), 5, 50).with_base_url(server.uri());
        let digest = adapter.search(&["AKT RAF".to_string()]).await.unwrap();
        assert!(digest.contains("Most relevant content from source: AKT phosphorylates RAF"));
        assert!(digest.contains("Source: (no title)"));
        assert!(digest.contains("Most relevant content from source: only text"));
    }

    #[tokio::test]
    async fn test_http_error_maps_to_search_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let adapter = ExaSearchAdapter::new("k".to_string(), 5, 50).with_base_url(server.uri());
        assert!(adapter.search(&["q".to_string()]).await.is_err());
    }
}
