//! Feedback loop and crosstalk enhancement around the network's sink nodes.

use crate::domain::{
    DomainError, EnhancementOutcome, Queries, ReactionAdditions, ReactionOverview, TerminalNodes,
};
use crate::ports::{ChatMessage, CompletionRequest, LlmPort, ModelTier, SearchPort};
use crate::shared::json::request_structured;
use crate::shared::prompts::{self, PromptManager};
use crate::usecases::inputs::{read_json, read_text};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EnhancementOptions {
    pub number_of_queries: usize,
}

impl Default for EnhancementOptions {
    fn default() -> Self {
        Self {
            number_of_queries: 6,
        }
    }
}

pub struct EnhancementService {
    llm: Arc<dyn LlmPort>,
    search: Arc<dyn SearchPort>,
    prompts: Arc<PromptManager>,
    options: EnhancementOptions,
}

/// Rationale followed by a `Sources:` list.
pub fn enhancement_summary(additions: &ReactionAdditions) -> String {
    let mut summary = format!("{}\nSources:\n", additions.rationale.trim());
    for source in &additions.sources {
        summary.push_str(&format!("- {}\n", source));
    }
    summary
}

fn node_list(nodes: &[String]) -> String {
    if nodes.is_empty() {
        "none".to_string()
    } else {
        nodes.join(", ")
    }
}

impl EnhancementService {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        search: Arc<dyn SearchPort>,
        prompts: Arc<PromptManager>,
        options: EnhancementOptions,
    ) -> Self {
        Self {
            llm,
            search,
            prompts,
            options,
        }
    }

    /// Reads the reactions text, terminal nodes JSON and, when given, the
    /// pathway overview JSON. A missing overview means "unknown" for both fields.
    pub async fn run_enhance_feedback_crosstalk(
        &self,
        reactions_path: &Path,
        terminal_nodes_path: &Path,
        overview_path: Option<&Path>,
    ) -> Result<EnhancementOutcome, DomainError> {
        let reactions = read_text(reactions_path).await?;
        let terminal_nodes: TerminalNodes = read_json(terminal_nodes_path).await?;
        let overview = match overview_path {
            Some(path) => read_json::<ReactionOverview>(path).await?,
            None => ReactionOverview::unknown(),
        };
        self.enhance(&reactions, &terminal_nodes, &overview).await
    }

    pub async fn enhance(
        &self,
        reactions: &str,
        terminal_nodes: &TerminalNodes,
        overview: &ReactionOverview,
    ) -> Result<EnhancementOutcome, DomainError> {
        let reactions = reactions.trim();
        if reactions.is_empty() {
            return Err(DomainError::Input("no reactions to enhance".to_string()));
        }
        if terminal_nodes.sink.is_empty() {
            warn!("no sink nodes, enhancement queries will be unfocused");
        }
        let overview = if overview.is_complete() {
            overview.clone()
        } else {
            ReactionOverview::unknown()
        };
        let source_nodes = node_list(&terminal_nodes.source);
        let sink_nodes = node_list(&terminal_nodes.sink);
        let number_of_queries = self.options.number_of_queries.to_string();
        info!(
            sources = terminal_nodes.source.len(),
            sinks = terminal_nodes.sink.len(),
            "starting feedback and crosstalk enhancement"
        );

        let query_instructions = self.prompts.render(
            prompts::FEEDBACK_CROSSTALK_QUERY_WRITER,
            &[
                ("reactions", reactions),
                ("source_nodes", source_nodes.as_str()),
                ("sink_nodes", sink_nodes.as_str()),
                ("main_signaling_pathways", overview.main_signaling_pathway.as_str()),
                ("expected_readouts", overview.expected_readouts.as_str()),
                ("number_of_queries", number_of_queries.as_str()),
            ],
        )?;
        let queries: Queries = request_structured(
            self.llm.as_ref(),
            CompletionRequest::new(
                "feedback-queries",
                ModelTier::Writer,
                vec![
                    ChatMessage::system(query_instructions),
                    ChatMessage::user(
                        "Generate search queries for feedback loops and pathway crosstalk.",
                    ),
                ],
            ),
        )
        .await?;
        let query_list: Vec<String> = queries
            .queries
            .into_iter()
            .map(|q| q.search_query)
            .filter(|q| !q.trim().is_empty())
            .collect();
        info!(queries = query_list.len(), "enhancement queries generated");

        let context = self.search.search(&query_list).await?;

        let instructions = self.prompts.render(
            prompts::REACTION_ENHANCEMENT_PROMPT,
            &[
                ("reactions", reactions),
                ("source_nodes", source_nodes.as_str()),
                ("sink_nodes", sink_nodes.as_str()),
                ("main_signaling_pathways", overview.main_signaling_pathway.as_str()),
                ("expected_readouts", overview.expected_readouts.as_str()),
                ("context", context.as_str()),
            ],
        )?;
        let additions: ReactionAdditions = request_structured(
            self.llm.as_ref(),
            CompletionRequest::new(
                "enhance-reactions",
                ModelTier::Writer,
                vec![
                    ChatMessage::system(instructions),
                    ChatMessage::user("Add feedback loop and crosstalk reactions to the network."),
                ],
            ),
        )
        .await?;

        let added_reactions: Vec<String> = additions
            .added_reactions
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        info!(added = added_reactions.len(), "enhancement reactions received");

        let enhanced_reactions = if added_reactions.is_empty() {
            reactions.to_string()
        } else {
            format!("{}\n{}", reactions, added_reactions.join("\n"))
        };
        Ok(EnhancementOutcome {
            enhanced_reactions,
            summary: enhancement_summary(&additions),
            added_reactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmAdapter;
    use crate::adapters::search::MockSearchAdapter;

    const NETWORK: &str = "EGF binds EGFR <--> EGF_EGFR\nEGF_EGFR phosphorylates ERK --> ERK_p\n";

    fn nodes() -> TerminalNodes {
        TerminalNodes {
            source: vec!["EGF".to_string(), "EGFR".to_string()],
            sink: vec!["ERK_p".to_string()],
        }
    }

    fn scripted() -> MockLlmAdapter {
        MockLlmAdapter::new()
            .on(
                "feedback loops and pathway crosstalk.",
                r#"{"queries": [{"search_query": "ERK_p SOS negative feedback"}, {"search_query": "ERK crosstalk PI3K"}]}"#,
            )
            .on(
                "Add feedback loop and crosstalk reactions",
                r#"```json
{"added_reactions": ["ERK_p inhibits SOS", " "], "rationale": "ERK phosphorylates SOS to dampen signaling.", "sources": ["https://pubmed/1"]}
```"#,
            )
    }

    #[tokio::test]
    async fn test_enhancement_appends_reactions() {
        let llm = Arc::new(scripted());
        let search = Arc::new(MockSearchAdapter::new("Content from sources: ERK SOS"));
        let svc = EnhancementService::new(
            llm.clone(),
            search.clone(),
            Arc::new(PromptManager::new()),
            EnhancementOptions::default(),
        );
        let out = svc
            .enhance(NETWORK, &nodes(), &ReactionOverview::unknown())
            .await
            .unwrap();

        assert_eq!(out.added_reactions, vec!["ERK_p inhibits SOS"]);
        assert!(out.enhanced_reactions.ends_with("ERK --> ERK_p\nERK_p inhibits SOS"));
        assert_eq!(
            out.summary,
            "ERK phosphorylates SOS to dampen signaling.\nSources:\n- https://pubmed/1\n"
        );
        assert_eq!(search.queries().len(), 2);

        let requests = llm.requests();
        let query_prompt = &requests[0].messages[0].content;
        assert!(query_prompt.contains("Generate 6 specific web search queries"));
        assert!(query_prompt.contains("<Sink Nodes (Pathway Outputs - HIGH PRIORITY)>\nERK_p"));
        assert!(requests[1].messages[0].content.contains("Content from sources: ERK SOS"));
        assert!(requests.iter().all(|r| r.json_mode));
    }

    #[tokio::test]
    async fn test_from_files_defaults_overview_to_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        let reactions = tmp.path().join("integrated.txt");
        let terminal = tmp.path().join("terminal_nodes.json");
        std::fs::write(&reactions, NETWORK).unwrap();
        std::fs::write(&terminal, r#"{"source": ["EGF"], "sink": ["ERK_p"]}"#).unwrap();

        let llm = Arc::new(scripted());
        let svc = EnhancementService::new(
            llm.clone(),
            Arc::new(MockSearchAdapter::new("digest")),
            Arc::new(PromptManager::new()),
            EnhancementOptions { number_of_queries: 3 },
        );
        let out = svc
            .run_enhance_feedback_crosstalk(&reactions, &terminal, None)
            .await
            .unwrap();
        assert_eq!(out.added_reactions.len(), 1);
        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("<Main Signaling Pathway>\nunknown"));
        assert!(prompt.contains("Generate 3 specific"));
    }

    #[tokio::test]
    async fn test_bad_additions_json_is_parse_error() {
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on("feedback loops and pathway crosstalk.", r#"{"queries": []}"#)
                .on("Add feedback loop", "I could not find anything."),
        );
        let svc = EnhancementService::new(
            llm,
            Arc::new(MockSearchAdapter::new("")),
            Arc::new(PromptManager::new()),
            EnhancementOptions::default(),
        );
        let res = svc.enhance(NETWORK, &nodes(), &ReactionOverview::unknown()).await;
        assert!(matches!(res, Err(DomainError::Parse(_))));
    }
}
