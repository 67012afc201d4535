//! Pathway analysis: web research on what a reaction set represents.
//!
//! Two sections are researched concurrently (main pathway, expected readouts),
//! then the readouts go through an evaluate/refine loop.

use crate::domain::{
    AnalysisSection, CompletedSection, DomainError, PathwayReport, Queries, ReadoutDecision,
    SectionContent, SectionKind,
};
use crate::ports::{ArtifactPort, ChatMessage, CompletionRequest, LlmPort, ModelTier, SearchPort};
use crate::shared::json::request_structured;
use crate::shared::prompts::{self, PromptManager};
use crate::usecases::inputs::read_text;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const PATHWAY_REPORT_FILE: &str = "pathway_analysis_result.json";

const MAIN_PATHWAY_DESCRIPTION: &str = "Identify the detailed signaling pathway these reactions represent, including all intermediate steps, regulatory proteins, feedback loops, and downstream effectors (e.g., detailed EGFR→RAS→RAF→MEK→ERK cascade with regulatory components)";
const READOUTS_DESCRIPTION: &str =
    "Identify measurable outcomes or downstream effects of this pathway activation";

pub fn analysis_sections() -> [AnalysisSection; 2] {
    [
        AnalysisSection {
            kind: SectionKind::MainSignalingPathway,
            title: "Main Signaling Pathway".to_string(),
            description: MAIN_PATHWAY_DESCRIPTION.to_string(),
        },
        AnalysisSection {
            kind: SectionKind::ExpectedReadouts,
            title: "Expected Readouts".to_string(),
            description: READOUTS_DESCRIPTION.to_string(),
        },
    ]
}

fn condition_section(condition: Option<&str>) -> String {
    condition
        .map(|c| format!("<Experimental Condition>\n{}\n</Experimental Condition>\n", c))
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct PathwayOptions {
    pub number_of_queries: usize,
    pub max_refinements: usize,
}

impl Default for PathwayOptions {
    fn default() -> Self {
        Self {
            number_of_queries: 4,
            max_refinements: 3,
        }
    }
}

pub struct PathwayAnalysisService {
    llm: Arc<dyn LlmPort>,
    search: Arc<dyn SearchPort>,
    prompts: Arc<PromptManager>,
    artifacts: Arc<dyn ArtifactPort>,
    options: PathwayOptions,
}

impl PathwayAnalysisService {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        search: Arc<dyn SearchPort>,
        prompts: Arc<PromptManager>,
        artifacts: Arc<dyn ArtifactPort>,
        options: PathwayOptions,
    ) -> Self {
        Self {
            llm,
            search,
            prompts,
            artifacts,
            options,
        }
    }

    /// Analyze a reactions file, optionally under an experimental condition,
    /// and save the report as `pathway_analysis_result.json`.
    pub async fn run_pathway_analysis(
        &self,
        reactions_path: &Path,
        condition_path: Option<&Path>,
    ) -> Result<PathwayReport, DomainError> {
        let reactions = read_text(reactions_path).await?;
        if reactions.trim().is_empty() {
            return Err(DomainError::Input(format!(
                "reactions file is empty: {}",
                reactions_path.display()
            )));
        }

        let condition = match condition_path {
            Some(path) => {
                let text = read_text(path).await?;
                if text.trim().is_empty() {
                    warn!(path = %path.display(), "experimental condition file is empty, ignoring");
                    None
                } else {
                    Some(text.trim().to_string())
                }
            }
            None => None,
        };

        let report = self.analyze(reactions.trim(), condition.as_deref()).await?;
        let value = serde_json::to_value(&report)
            .map_err(|e| DomainError::Artifact(format!("report encode failed: {}", e)))?;
        self.artifacts.write_json(PATHWAY_REPORT_FILE, &value).await?;
        Ok(report)
    }

    pub async fn analyze(
        &self,
        reactions: &str,
        condition: Option<&str>,
    ) -> Result<PathwayReport, DomainError> {
        info!(
            reactions_len = reactions.len(),
            with_condition = condition.is_some(),
            "starting pathway analysis"
        );
        let [main_section, readout_section] = analysis_sections();
        let (main, readouts) = tokio::try_join!(
            self.research_section(&main_section, reactions, condition),
            self.research_section(&readout_section, reactions, condition),
        )?;

        let refined = self
            .refine_readouts(reactions, &main.content, &readouts.content)
            .await;
        let expected_readouts = if refined.trim().is_empty() {
            readouts.content
        } else {
            refined
        };

        info!("pathway analysis completed");
        Ok(PathwayReport {
            reaction_equations: reactions.to_string(),
            experimental_condition: condition.map(str::to_string),
            main_signaling_pathway: main.content,
            expected_readouts,
        })
    }

    /// Queries, web search, then section writing for one section.
    async fn research_section(
        &self,
        section: &AnalysisSection,
        reactions: &str,
        condition: Option<&str>,
    ) -> Result<CompletedSection, DomainError> {
        let key = match section.kind {
            SectionKind::MainSignalingPathway => "main_signaling_pathway",
            SectionKind::ExpectedReadouts => "expected_readouts",
        };
        let condition_block = condition_section(condition);
        let number_of_queries = self.options.number_of_queries.to_string();

        let query_instructions = self.prompts.render(
            prompts::QUERY_WRITER_INSTRUCTIONS,
            &[
                ("reactions", reactions),
                ("experimental_condition_section", condition_block.as_str()),
                (
                    "experimental_condition_note",
                    if condition.is_some() {
                        "4. Consider the specific experimental condition when crafting queries"
                    } else {
                        ""
                    },
                ),
                ("section_title", section.title.as_str()),
                ("section_description", section.description.as_str()),
                ("number_of_queries", number_of_queries.as_str()),
            ],
        )?;
        let queries: Queries = request_structured(
            self.llm.as_ref(),
            CompletionRequest::new(
                format!("queries-{}", key),
                ModelTier::Writer,
                vec![
                    ChatMessage::system(query_instructions),
                    ChatMessage::user("Generate search queries."),
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
        info!(section = key, queries = query_list.len(), "search queries generated");

        let context = self.search.search(&query_list).await?;

        let writer_instructions = self.prompts.render(
            prompts::SECTION_WRITER_INSTRUCTIONS,
            &[
                ("reactions", reactions),
                ("experimental_condition_section", condition_block.as_str()),
                (
                    "experimental_condition_note",
                    if condition.is_some() {
                        "- Consider the specific experimental condition in your analysis"
                    } else {
                        ""
                    },
                ),
                ("section_title", section.title.as_str()),
                ("section_description", section.description.as_str()),
                ("context", context.as_str()),
            ],
        )?;
        let written: SectionContent = request_structured(
            self.llm.as_ref(),
            CompletionRequest::new(
                format!("section-{}", key),
                ModelTier::Writer,
                vec![
                    ChatMessage::system(writer_instructions),
                    ChatMessage::user("Write the section content."),
                ],
            ),
        )
        .await?;
        info!(section = key, sources = written.sources.len(), "section written");

        Ok(CompletedSection {
            kind: section.kind,
            content: written.content.trim().to_string(),
            sources: written.sources,
        })
    }

    /// Evaluate/refine loop over the readouts, at most `max_refinements` rewrites.
    /// A failed model call ends the loop with the readouts reached so far.
    async fn refine_readouts(&self, reactions: &str, main_pathway: &str, initial: &str) -> String {
        let mut current = initial.to_string();
        for round in 0..self.options.max_refinements {
            let decision = match self.evaluate_readouts(reactions, main_pathway, &current, round).await {
                Ok(decision) => decision,
                Err(e) => {
                    error!(error = %e, "readout evaluation failed");
                    break;
                }
            };
            if !decision.should_refine {
                info!(round, reasoning = %decision.reasoning, "readouts accepted");
                break;
            }
            info!(round, suggestions = %decision.suggested_improvements, "refining readouts");
            match self
                .rewrite_readouts(reactions, main_pathway, &current, &decision.suggested_improvements, round)
                .await
            {
                Ok(text) => current = text.trim().to_string(),
                Err(e) => {
                    error!(error = %e, "readout refinement failed");
                    break;
                }
            }
        }
        current
    }

    async fn evaluate_readouts(
        &self,
        reactions: &str,
        main_pathway: &str,
        current: &str,
        round: usize,
    ) -> Result<ReadoutDecision, DomainError> {
        let instructions = self.prompts.render(
            prompts::READOUT_EVALUATION_INSTRUCTIONS,
            &[
                ("reactions", reactions),
                ("main_pathway", main_pathway),
                ("current_readouts", current),
            ],
        )?;
        request_structured(
            self.llm.as_ref(),
            CompletionRequest::new(
                format!("evaluate-readouts-{}", round),
                ModelTier::Writer,
                vec![
                    ChatMessage::system(instructions),
                    ChatMessage::user("Evaluate the readouts."),
                ],
            ),
        )
        .await
    }

    async fn rewrite_readouts(
        &self,
        reactions: &str,
        main_pathway: &str,
        current: &str,
        suggestions: &str,
        round: usize,
    ) -> Result<String, DomainError> {
        let instructions = self.prompts.render(
            prompts::READOUT_REFINEMENT_INSTRUCTIONS,
            &[
                ("reactions", reactions),
                ("main_pathway", main_pathway),
                ("current_readouts", current),
                ("suggested_improvements", suggestions),
            ],
        )?;
        let request = CompletionRequest::new(
            format!("refine-readouts-{}", round),
            ModelTier::Writer,
            vec![
                ChatMessage::system(instructions),
                ChatMessage::user("Refine the readouts."),
            ],
        );
        self.llm.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmAdapter;
    use crate::adapters::persistence::FsArtifactStore;
    use crate::adapters::search::MockSearchAdapter;

    const REACTIONS: &str = "EGF binds EGFR <--> EGF_EGFR\nEGF_EGFR phosphorylates ERK --> ERK_p";

    fn scripted() -> MockLlmAdapter {
        MockLlmAdapter::new()
            .on(
                "<Section to Research>\nMain Signaling Pathway",
                r#"{"queries": [{"search_query": "EGFR ERK cascade"}, {"search_query": "  "}]}"#,
            )
            .on(
                "<Section to Research>\nExpected Readouts",
                r#"{"queries": [{"search_query": "ERK phosphorylation readout"}]}"#,
            )
    }

    fn service(
        llm: Arc<MockLlmAdapter>,
        search: Arc<MockSearchAdapter>,
        dir: &Path,
        max_refinements: usize,
    ) -> PathwayAnalysisService {
        PathwayAnalysisService::new(
            llm,
            search,
            Arc::new(PromptManager::new()),
            Arc::new(FsArtifactStore::new(dir)),
            PathwayOptions {
                number_of_queries: 2,
                max_refinements,
            },
        )
    }

    /// Section writer replies keyed by the section title inside the writer prompt.
    fn with_writers(llm: MockLlmAdapter) -> MockLlmAdapter {
        llm.on(
            "<Section to Write>\nMain Signaling Pathway",
            r#"{"content": "EGFR-MAPK cascade (EGF -> EGFR -> ERK)", "sources": ["https://a"]}"#,
        )
        .on(
            "<Section to Write>\nExpected Readouts",
            r#"{"content": "- p-ERK (T202/Y204)", "sources": []}"#,
        )
    }

    #[tokio::test]
    async fn test_analysis_without_refinement() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(with_writers(scripted()).on(
            "<Current Expected Readouts>",
            r#"{"should_refine": false, "reasoning": "fine", "suggested_improvements": ""}"#,
        ));
        let search = Arc::new(MockSearchAdapter::new("Content from sources: EGFR"));
        let svc = service(llm.clone(), search.clone(), tmp.path(), 3);

        let reactions_path = tmp.path().join("reactions.txt");
        std::fs::write(&reactions_path, REACTIONS).unwrap();
        let report = svc.run_pathway_analysis(&reactions_path, None).await.unwrap();

        assert_eq!(report.main_signaling_pathway, "EGFR-MAPK cascade (EGF -> EGFR -> ERK)");
        assert_eq!(report.expected_readouts, "- p-ERK (T202/Y204)");
        assert_eq!(report.experimental_condition, None);
        let mut queries = search.queries();
        queries.sort();
        assert_eq!(queries, vec!["EGFR ERK cascade", "ERK phosphorylation readout"]);

        let saved: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(tmp.path().join(PATHWAY_REPORT_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(saved["Expected Readouts"], "- p-ERK (T202/Y204)");
        assert!(saved["Experimental Condition"].is_null());
    }

    #[tokio::test]
    async fn test_refinement_loop_is_bounded() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(
            with_writers(scripted())
                .on(
                    "Evaluate the readouts.",
                    r#"{"should_refine": true, "reasoning": "add MEK", "suggested_improvements": "p-MEK"}"#,
                )
                .on("Refine the readouts.", "- p-MEK (S217/221)\n- p-ERK (T202/Y204)"),
        );
        let search = Arc::new(MockSearchAdapter::new("digest"));
        let svc = service(llm.clone(), search, tmp.path(), 2);

        let report = svc.analyze(REACTIONS, Some("EGF 10 ng/mL, 15 min")).await.unwrap();
        assert_eq!(report.expected_readouts, "- p-MEK (S217/221)\n- p-ERK (T202/Y204)");
        assert_eq!(report.experimental_condition.as_deref(), Some("EGF 10 ng/mL, 15 min"));

        let requests = llm.requests();
        let evaluations = requests.iter().filter(|r| r.id.starts_with("evaluate-")).count();
        let refinements = requests.iter().filter(|r| r.id.starts_with("refine-")).count();
        assert_eq!((evaluations, refinements), (2, 2));
        let query_prompt = &requests
            .iter()
            .find(|r| r.id == "queries-main_signaling_pathway")
            .unwrap()
            .messages[0]
            .content;
        assert!(query_prompt.contains("<Experimental Condition>\nEGF 10 ng/mL, 15 min"));
        assert!(query_prompt.contains("4. Consider the specific experimental condition"));
        assert!(requests.iter().all(|r| r.tier == ModelTier::Writer));
    }

    #[tokio::test]
    async fn test_empty_reactions_file_is_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(
            Arc::new(MockLlmAdapter::new()),
            Arc::new(MockSearchAdapter::new("")),
            tmp.path(),
            3,
        );
        let path = tmp.path().join("empty.txt");
        std::fs::write(&path, "  \n").unwrap();
        let res = svc.run_pathway_analysis(&path, None).await;
        assert!(matches!(res, Err(DomainError::Input(_))));
    }

    #[tokio::test]
    async fn test_empty_condition_file_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(with_writers(scripted()).on(
            "Evaluate the readouts.",
            r#"{"should_refine": false}"#,
        ));
        let svc = service(llm, Arc::new(MockSearchAdapter::new("d")), tmp.path(), 3);
        let reactions_path = tmp.path().join("reactions.txt");
        let condition_path = tmp.path().join("condition.txt");
        std::fs::write(&reactions_path, REACTIONS).unwrap();
        std::fs::write(&condition_path, "\n").unwrap();

        let report = svc
            .run_pathway_analysis(&reactions_path, Some(&condition_path))
            .await
            .unwrap();
        assert_eq!(report.experimental_condition, None);
    }
}
