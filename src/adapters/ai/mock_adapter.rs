//! Scripted LLM adapter for tests and dry runs.
//!
//! Replies are chosen by substring match, first against the last message of a
//! request, then against the whole conversation, falling back to a FIFO queue.

use crate::domain::DomainError;
use crate::ports::{CompletionRequest, LlmPort};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::info;

struct Rule {
    needle: String,
    /// The last reply is repeated once the queue is down to one entry.
    replies: VecDeque<Result<String, String>>,
}

#[derive(Default)]
pub struct MockLlmAdapter {
    rules: Mutex<Vec<Rule>>,
    fallback: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    batch: bool,
}

impl MockLlmAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` to requests mentioning `needle`.
    /// Repeated calls for the same needle queue further replies.
    pub fn on(self, needle: &str, reply: impl Into<String>) -> Self {
        self.push_rule(needle, Ok(reply.into()));
        self
    }

    /// Fail requests mentioning `needle`.
    pub fn on_error(self, needle: &str, message: &str) -> Self {
        self.push_rule(needle, Err(message.to_string()));
        self
    }

    /// Reply used when no rule matches, consumed in order.
    pub fn then(self, reply: impl Into<String>) -> Self {
        if let Ok(mut fallback) = self.fallback.lock() {
            fallback.push_back(reply.into());
        }
        self
    }

    /// Report batch support; `complete_batch` then runs requests one by one.
    pub fn with_batch(mut self) -> Self {
        self.batch = true;
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push_rule(&self, needle: &str, reply: Result<String, String>) {
        let Ok(mut rules) = self.rules.lock() else {
            return;
        };
        match rules.iter_mut().find(|r| r.needle == needle) {
            Some(rule) => rule.replies.push_back(reply),
            None => rules.push(Rule {
                needle: needle.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    fn scripted_reply(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let all: String = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut rules = self
            .rules
            .lock()
            .map_err(|_| DomainError::Llm("mock rules poisoned".to_string()))?;
        let hit = rules
            .iter()
            .position(|r| last.contains(&r.needle))
            .or_else(|| rules.iter().position(|r| all.contains(&r.needle)));
        if let Some(i) = hit {
            let rule = &mut rules[i];
            let reply = if rule.replies.len() > 1 {
                rule.replies.pop_front()
            } else {
                rule.replies.front().cloned()
            };
            return match reply {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(DomainError::Llm(message)),
                None => Err(DomainError::Llm(format!("no reply for '{}'", rule.needle))),
            };
        }
        drop(rules);

        self.fallback
            .lock()
            .ok()
            .and_then(|mut f| f.pop_front())
            .ok_or_else(|| DomainError::Llm(format!("no scripted reply for request {}", request.id)))
    }
}

#[async_trait::async_trait]
impl LlmPort for MockLlmAdapter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        info!(id = %request.id, "[MOCK] completion");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.scripted_reply(request)
    }

    fn supports_batch(&self) -> bool {
        self.batch
    }

    async fn complete_batch(
        &self,
        requests: &[CompletionRequest],
    ) -> Result<HashMap<String, String>, DomainError> {
        let mut results = HashMap::new();
        for request in requests {
            if let Ok(text) = self.complete(request).await {
                results.insert(request.id.clone(), text);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ChatMessage, ModelTier};

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new("t", ModelTier::Writer, vec![ChatMessage::user(text)])
    }

    #[tokio::test]
    async fn test_rules_queue_then_repeat_last() {
        let llm = MockLlmAdapter::new().on("dedupe", "first").on("dedupe", "second");
        assert_eq!(llm.complete(&request("please dedupe")).await.unwrap(), "first");
        assert_eq!(llm.complete(&request("please dedupe")).await.unwrap(), "second");
        assert_eq!(llm.complete(&request("please dedupe")).await.unwrap(), "second");
        assert_eq!(llm.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_fallback_and_errors() {
        let llm = MockLlmAdapter::new().on_error("boom", "down").then("queued");
        assert!(llm.complete(&request("boom")).await.is_err());
        assert_eq!(llm.complete(&request("other")).await.unwrap(), "queued");
        assert!(llm.complete(&request("other")).await.is_err());
    }
}
