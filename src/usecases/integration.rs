//! Merge generated equations into one connected network steered by the
//! pathway overview: merge, format check, dedupe, connectivity repair.

use crate::domain::{DomainError, IntegrationOutcome, ReactionNetwork, ReactionOverview};
use crate::ports::{ArtifactPort, ChatMessage, CompletionRequest, LlmPort, ModelTier};
use crate::shared::prompts::{self, PromptManager};
use crate::usecases::inputs::{read_equations, read_json};
use crate::usecases::validation::{response_lines, EquationValidator};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const FIRST_ROUND_FILE: &str = "integrated_equations_first_round.txt";
pub const DROPPED_DUPLICATES_FILE: &str = "integrated_equations_dropped_duplicates.txt";
pub const INTEGRATED_FILE: &str = "integrated_equations_final.txt";

#[derive(Debug, Clone)]
pub struct IntegrationOptions {
    pub max_format_iterations: usize,
    pub max_connectivity_iterations: usize,
    /// Write the per-phase intermediate files.
    pub save_intermediate: bool,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            max_format_iterations: 3,
            max_connectivity_iterations: 10,
            save_intermediate: true,
        }
    }
}

pub struct IntegrationService {
    llm: Arc<dyn LlmPort>,
    prompts: Arc<PromptManager>,
    validator: Arc<EquationValidator>,
    artifacts: Arc<dyn ArtifactPort>,
    options: IntegrationOptions,
}

impl IntegrationService {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        prompts: Arc<PromptManager>,
        validator: Arc<EquationValidator>,
        artifacts: Arc<dyn ArtifactPort>,
        options: IntegrationOptions,
    ) -> Self {
        Self {
            llm,
            prompts,
            validator,
            artifacts,
            options,
        }
    }

    /// Equations file plus a pathway report (or overview) JSON.
    pub async fn integrate_reactions_from_files(
        &self,
        equations_path: &Path,
        overview_path: &Path,
    ) -> Result<IntegrationOutcome, DomainError> {
        let equations = read_equations(equations_path).await?;
        let overview: ReactionOverview = read_json(overview_path).await?;
        self.integrate_reactions(&equations, &overview).await
    }

    pub async fn integrate_reactions(
        &self,
        equations: &[String],
        overview: &ReactionOverview,
    ) -> Result<IntegrationOutcome, DomainError> {
        if !overview.is_complete() {
            return Err(DomainError::Input(
                "reaction overview needs both a main signaling pathway and expected readouts"
                    .to_string(),
            ));
        }
        if equations.iter().all(|e| e.trim().is_empty()) {
            return Err(DomainError::Input("no equations to integrate".to_string()));
        }
        info!(count = equations.len(), "starting reaction integration");

        // Merge
        let merged = self.merge(equations, overview).await?;
        info!(count = merged.len(), "equations merged");

        // The first-round file holds the merged set as the model wrote it.
        let first_round = match self
            .validator
            .validate_equations_format(&merged, self.options.max_format_iterations)
            .await
        {
            Some(validated) => {
                self.save_intermediate(FIRST_ROUND_FILE, &merged).await;
                validated
            }
            None => {
                warn!("merged equations failed format validation, keeping merged result");
                merged
            }
        };

        // Dedupe. A reply that fails the format check is still kept.
        let deduplicated = match self.drop_duplicates(&first_round).await {
            Some(lines) => {
                let deduplicated = match self
                    .validator
                    .validate_equations_format(&lines, self.options.max_format_iterations)
                    .await
                {
                    Some(validated) => validated,
                    None => {
                        warn!("deduplicated equations failed format validation, keeping them as is");
                        lines
                    }
                };
                info!(count = deduplicated.len(), "duplicates dropped");
                self.save_intermediate(DROPPED_DUPLICATES_FILE, &deduplicated).await;
                deduplicated
            }
            None => {
                warn!("duplicate removal failed, keeping merged result");
                first_round
            }
        };

        // Connect
        let connected = match self
            .validator
            .validate_equations_connectivity(
                &deduplicated,
                &overview.expected_readouts,
                &overview.main_signaling_pathway,
                self.options.max_connectivity_iterations,
            )
            .await
        {
            Some(lines) => lines,
            None => {
                warn!("connectivity repair failed, keeping previous set");
                deduplicated
            }
        };

        self.artifacts.write_lines(INTEGRATED_FILE, &connected).await?;
        let terminal_nodes = ReactionNetwork::from_lines(&connected).find_terminal_nodes();
        info!(
            count = connected.len(),
            sources = terminal_nodes.source.len(),
            sinks = terminal_nodes.sink.len(),
            "integration completed"
        );
        Ok(IntegrationOutcome {
            equations: connected,
            terminal_nodes,
        })
    }

    async fn merge(
        &self,
        equations: &[String],
        overview: &ReactionOverview,
    ) -> Result<Vec<String>, DomainError> {
        let joined = equations.join("\n");
        let user = self.prompts.render(
            prompts::INTEGRATE_MODEL_PROMPT,
            &[
                ("equations", joined.as_str()),
                ("main_signaling_pathways", overview.main_signaling_pathway.as_str()),
                ("expected_readouts", overview.expected_readouts.as_str()),
            ],
        )?;
        let request = CompletionRequest::new(
            "integrate",
            ModelTier::Planner,
            vec![
                ChatMessage::system(self.prompts.require(prompts::SYSTEM_PROMPT)?),
                ChatMessage::user(user),
            ],
        );
        let merged = response_lines(&self.llm.complete(&request).await?);
        if merged.is_empty() {
            return Err(DomainError::Stage(
                "integration produced no equations".to_string(),
            ));
        }
        Ok(merged)
    }

    /// `None` when the request fails or returns nothing.
    async fn drop_duplicates(&self, equations: &[String]) -> Option<Vec<String>> {
        let joined = equations.join("\n");
        let prepared = self
            .prompts
            .render(prompts::DROP_DUPLICATE_PROMPT, &[("raw_reactions", joined.as_str())])
            .and_then(|user| {
                let system = self.prompts.require(prompts::SYSTEM_PROMPT)?;
                Ok(CompletionRequest::new(
                    "drop-duplicates",
                    ModelTier::Planner,
                    vec![ChatMessage::system(system), ChatMessage::user(user)],
                ))
            });
        let request = match prepared {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "deduplication prompt unavailable");
                return None;
            }
        };
        match self.llm.complete(&request).await {
            Ok(text) => Some(response_lines(&text)).filter(|l| !l.is_empty()),
            Err(e) => {
                error!(error = %e, "deduplication request failed, keeping previous set");
                None
            }
        }
    }

    async fn save_intermediate(&self, name: &str, lines: &[String]) {
        if !self.options.save_intermediate {
            return;
        }
        if let Err(e) = self.artifacts.write_lines(name, lines).await {
            warn!(file = name, error = %e, "intermediate file not written");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmAdapter;
    use crate::adapters::persistence::FsArtifactStore;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn overview() -> ReactionOverview {
        ReactionOverview {
            main_signaling_pathway: "EGFR-MAPK".to_string(),
            expected_readouts: "- ERK_p".to_string(),
        }
    }

    fn service(llm: Arc<MockLlmAdapter>, dir: &Path, save_intermediate: bool) -> IntegrationService {
        let prompts = Arc::new(PromptManager::new());
        let validator = Arc::new(EquationValidator::new(llm.clone(), prompts.clone()));
        IntegrationService::new(
            llm,
            prompts,
            validator,
            Arc::new(FsArtifactStore::new(dir)),
            IntegrationOptions {
                save_intermediate,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_full_integration_writes_phases() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on(
                    "Create a connected biological reaction network",
                    "EGF binds EGFR <--> EGF_EGFR\nEGF_EGFR phosphorylates ERK --> ERK_p\nEGF_EGFR phosphorylates ERK --> ERK_p\nRAS activates RAF",
                )
                .on(
                    "Standardize and deduplicate",
                    "EGF binds EGFR <--> EGF_EGFR\nEGF_EGFR phosphorylates ERK --> ERK_p\nRAS activates RAF",
                )
                .on(
                    "do not form a connected network",
                    "EGF binds EGFR <--> EGF_EGFR\nEGF_EGFR activates RAS\nRAS activates RAF\nRAF phosphorylates ERK --> ERK_p",
                ),
        );
        let svc = service(llm.clone(), tmp.path(), true);
        let out = svc
            .integrate_reactions(&lines(&["EGF binds EGFR <--> EGF_EGFR"]), &overview())
            .await
            .unwrap();

        assert_eq!(out.equations.len(), 4);
        assert!(out.terminal_nodes.sink.contains(&"ERK_p".to_string()));
        assert!(out.terminal_nodes.source.contains(&"EGF".to_string()));

        // Merged reply as written, repeated line included.
        let first = std::fs::read_to_string(tmp.path().join(FIRST_ROUND_FILE)).unwrap();
        assert_eq!(first.lines().count(), 4);
        assert!(tmp.path().join(DROPPED_DUPLICATES_FILE).exists());
        let last = std::fs::read_to_string(tmp.path().join(INTEGRATED_FILE)).unwrap();
        assert!(last.contains("EGF_EGFR activates RAS"));

        let requests = llm.requests();
        assert_eq!(requests[0].id, "integrate");
        assert_eq!(requests[0].tier, ModelTier::Planner);
        assert!(requests[0].messages[1].content.contains("EGFR-MAPK"));
    }

    #[tokio::test]
    async fn test_failed_dedup_and_repair_keep_previous_set() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on("Create a connected biological reaction network", "A activates B\nC activates D")
                .on_error("Standardize and deduplicate", "timeout")
                .on_error("do not form a connected network", "timeout"),
        );
        let svc = service(llm, tmp.path(), false);
        let out = svc
            .integrate_reactions(&lines(&["A activates B"]), &overview())
            .await
            .unwrap();

        assert_eq!(out.equations, lines(&["A activates B", "C activates D"]));
        assert!(!tmp.path().join(FIRST_ROUND_FILE).exists());
        assert!(tmp.path().join(INTEGRATED_FILE).exists());
    }

    #[tokio::test]
    async fn test_unvalidated_dedup_reply_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on(
                    "Create a connected biological reaction network",
                    "A activates B\nA activates B\nB activates C",
                )
                .on("Standardize and deduplicate", "A turns on B\nB turns on C")
                .on_error("Invalid lines", "timeout")
                .on_error("do not form a connected network", "timeout"),
        );
        let svc = service(llm, tmp.path(), true);
        let out = svc
            .integrate_reactions(&lines(&["A activates B"]), &overview())
            .await
            .unwrap();

        let dedup = lines(&["A turns on B", "B turns on C"]);
        assert_eq!(out.equations, dedup);
        let saved = std::fs::read_to_string(tmp.path().join(DROPPED_DUPLICATES_FILE)).unwrap();
        assert_eq!(saved.lines().collect::<Vec<_>>(), vec!["A turns on B", "B turns on C"]);
        let first = std::fs::read_to_string(tmp.path().join(FIRST_ROUND_FILE)).unwrap();
        assert_eq!(first.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_incomplete_overview_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockLlmAdapter::new());
        let svc = service(llm.clone(), tmp.path(), true);
        let partial = ReactionOverview {
            main_signaling_pathway: "EGFR".to_string(),
            expected_readouts: " ".to_string(),
        };
        let res = svc.integrate_reactions(&lines(&["A activates B"]), &partial).await;
        assert!(matches!(res, Err(DomainError::Input(_))));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_from_files_reads_pathway_report() {
        let tmp = tempfile::tempdir().unwrap();
        let eq_path = tmp.path().join("generated.txt");
        let report_path = tmp.path().join("report.json");
        std::fs::write(&eq_path, "A activates B\n\nB activates C\n").unwrap();
        std::fs::write(
            &report_path,
            r#"{"Reaction Equations": "A activates B", "Experimental Condition": null,
                "Main Signaling Pathway": "A-B-C axis", "Expected Readouts": "- C"}"#,
        )
        .unwrap();
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on("Create a connected biological reaction network", "A activates B\nB activates C")
                .on("Standardize and deduplicate", "A activates B\nB activates C"),
        );
        let svc = service(llm, tmp.path(), false);
        let out = svc
            .integrate_reactions_from_files(&eq_path, &report_path)
            .await
            .unwrap();
        assert_eq!(out.terminal_nodes.source, vec!["A".to_string()]);
        assert_eq!(out.terminal_nodes.sink, vec!["C".to_string()]);
    }
}
