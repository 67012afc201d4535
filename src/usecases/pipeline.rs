//! Full run: generation -> pathway analysis -> integration -> enhancement ->
//! finalization. Every stage output lands in the run's artifact store.

use crate::adapters::persistence::load_biomodels_csv;
use crate::domain::{BioModelsRow, DomainError, TerminalNodes};
use crate::ports::ArtifactPort;
use crate::usecases::enhancement::EnhancementService;
use crate::usecases::finalization::FinalizationService;
use crate::usecases::generation::GenerationService;
use crate::usecases::integration::IntegrationService;
use crate::usecases::pathway::PathwayAnalysisService;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const GENERATED_FILE: &str = "generated_equations.txt";
pub const TERMINAL_NODES_FILE: &str = "terminal_nodes.json";
pub const ENHANCED_FILE: &str = "enhanced_equations.txt";
pub const ENHANCEMENT_SUMMARY_FILE: &str = "enhancement_summary.md";
pub const FINAL_FILE: &str = "final_equations.txt";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub prevent_divergence: bool,
    pub rewrite_activation_inhibition: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            prevent_divergence: true,
            rewrite_activation_inhibition: true,
        }
    }
}

/// What a full run produced.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub generated: usize,
    pub integrated: usize,
    pub added: usize,
    pub final_equations: usize,
    pub terminal_nodes: TerminalNodes,
    pub final_path: PathBuf,
}

pub struct PipelineService {
    generation: Arc<GenerationService>,
    pathway: Arc<PathwayAnalysisService>,
    integration: Arc<IntegrationService>,
    enhancement: Arc<EnhancementService>,
    finalization: Arc<FinalizationService>,
    artifacts: Arc<dyn ArtifactPort>,
    options: PipelineOptions,
}

impl PipelineService {
    pub fn new(
        generation: Arc<GenerationService>,
        pathway: Arc<PathwayAnalysisService>,
        integration: Arc<IntegrationService>,
        enhancement: Arc<EnhancementService>,
        finalization: Arc<FinalizationService>,
        artifacts: Arc<dyn ArtifactPort>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generation,
            pathway,
            integration,
            enhancement,
            finalization,
            artifacts,
            options,
        }
    }

    pub async fn run_from_csv(
        &self,
        csv_path: &Path,
        condition_path: Option<&Path>,
    ) -> Result<PipelineSummary, DomainError> {
        let rows = load_biomodels_csv(csv_path)?;
        self.run(&rows, condition_path).await
    }

    pub async fn run(
        &self,
        rows: &[BioModelsRow],
        condition_path: Option<&Path>,
    ) -> Result<PipelineSummary, DomainError> {
        info!(rows = rows.len(), "full pipeline started");

        let generated = self.generation.generate_formatted_reactions(rows).await?;
        let generated_path = self.artifacts.write_lines(GENERATED_FILE, &generated).await?;
        info!(count = generated.len(), "stage 1/5 generation done");

        let report = self
            .pathway
            .run_pathway_analysis(&generated_path, condition_path)
            .await?;
        let overview = report.overview();
        info!("stage 2/5 pathway analysis done");

        let integrated = self
            .integration
            .integrate_reactions(&generated, &overview)
            .await?;
        let nodes = serde_json::to_value(&integrated.terminal_nodes)
            .map_err(|e| DomainError::Artifact(format!("terminal nodes encode failed: {}", e)))?;
        self.artifacts.write_json(TERMINAL_NODES_FILE, &nodes).await?;
        info!(count = integrated.equations.len(), "stage 3/5 integration done");

        let enhanced = self
            .enhancement
            .enhance(
                &integrated.equations.join("\n"),
                &integrated.terminal_nodes,
                &overview,
            )
            .await?;
        self.artifacts
            .write_text(ENHANCED_FILE, &enhanced.enhanced_reactions)
            .await?;
        self.artifacts
            .write_text(ENHANCEMENT_SUMMARY_FILE, &enhanced.summary)
            .await?;
        info!(added = enhanced.added_reactions.len(), "stage 4/5 enhancement done");

        let enhanced_lines: Vec<String> = enhanced
            .enhanced_reactions
            .lines()
            .map(str::to_string)
            .collect();
        let finalized = self
            .finalization
            .finalize_reactions(
                &enhanced_lines,
                self.options.prevent_divergence,
                self.options.rewrite_activation_inhibition,
            )
            .await?;
        let final_path = self.artifacts.write_lines(FINAL_FILE, &finalized).await?;
        info!(count = finalized.len(), path = %final_path.display(), "stage 5/5 finalization done");

        Ok(PipelineSummary {
            generated: generated.len(),
            integrated: integrated.equations.len(),
            added: enhanced.added_reactions.len(),
            final_equations: finalized.len(),
            terminal_nodes: integrated.terminal_nodes,
            final_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmAdapter;
    use crate::adapters::persistence::FsArtifactStore;
    use crate::adapters::search::MockSearchAdapter;
    use crate::shared::prompts::PromptManager;
    use crate::usecases::enhancement::EnhancementOptions;
    use crate::usecases::finalization::FinalizationOptions;
    use crate::usecases::generation::GenerationOptions;
    use crate::usecases::integration::IntegrationOptions;
    use crate::usecases::pathway::{PathwayOptions, PATHWAY_REPORT_FILE};
    use crate::usecases::validation::EquationValidator;
    use std::time::Duration;

    const NETWORK: &str = "EGF binds EGFR <--> EGF_EGFR\nEGF_EGFR phosphorylates ERK --> ERK_p";

    fn scripted() -> MockLlmAdapter {
        MockLlmAdapter::new()
            .on("### Genes (Reaction Components)", NETWORK)
            .on(
                "<Section to Research>",
                r#"{"queries": [{"search_query": "EGFR ERK"}]}"#,
            )
            .on(
                "<Section to Write>\nMain Signaling Pathway",
                r#"{"content": "EGFR-MAPK cascade", "sources": []}"#,
            )
            .on(
                "<Section to Write>\nExpected Readouts",
                r#"{"content": "- ERK_p", "sources": []}"#,
            )
            .on("Evaluate the readouts.", r#"{"should_refine": false}"#)
            .on("Create a connected biological reaction network", NETWORK)
            .on("Standardize and deduplicate", NETWORK)
            .on(
                "feedback loops and pathway crosstalk.",
                r#"{"queries": [{"search_query": "ERK EGFR feedback"}]}"#,
            )
            .on(
                "Add feedback loop and crosstalk reactions",
                r#"{"added_reactions": ["ERK_p inhibits EGFR"], "rationale": "ERK feedback", "sources": ["https://x"]}"#,
            )
            .on(
                "Add missing degradation reactions",
                format!("{}\nERK_p inhibits EGFR\nERK_p is degraded", NETWORK),
            )
            .on(
                "Michaelis-Menten style reaction network",
                "@rxn EGFR_act --> EGFR_inact : p[V_ERK_piEGFR] * u[ERK_p] * u[EGFR_act] / ( p[K_EGFRi] + u[EGFR_act] )\nERK_p is degraded",
            )
    }

    fn pipeline(llm: Arc<MockLlmAdapter>, dir: &Path) -> PipelineService {
        let prompts = Arc::new(PromptManager::new());
        let search = Arc::new(MockSearchAdapter::new("Content from sources: EGFR"));
        let artifacts: Arc<dyn ArtifactPort> = Arc::new(FsArtifactStore::new(dir));
        let validator = Arc::new(EquationValidator::new(llm.clone(), prompts.clone()));
        PipelineService::new(
            Arc::new(GenerationService::new(
                llm.clone(),
                prompts.clone(),
                validator.clone(),
                GenerationOptions {
                    request_delay: Duration::ZERO,
                    ..Default::default()
                },
            )),
            Arc::new(PathwayAnalysisService::new(
                llm.clone(),
                search.clone(),
                prompts.clone(),
                artifacts.clone(),
                PathwayOptions::default(),
            )),
            Arc::new(IntegrationService::new(
                llm.clone(),
                prompts.clone(),
                validator.clone(),
                artifacts.clone(),
                IntegrationOptions::default(),
            )),
            Arc::new(EnhancementService::new(
                llm.clone(),
                search,
                prompts.clone(),
                EnhancementOptions::default(),
            )),
            Arc::new(FinalizationService::new(
                llm,
                prompts,
                validator,
                artifacts.clone(),
                FinalizationOptions::default(),
            )),
            artifacts,
            PipelineOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_full_run_writes_every_stage_output() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(scripted());
        let rows = vec![BioModelsRow {
            genes: "EGF, EGFR, ERK".to_string(),
            reactions: Some(vec!["EGF + EGFR -> EGF_EGFR".to_string()]),
            rates: Some(vec!["k1*EGF*EGFR".to_string()]),
            model: None,
        }];

        let summary = pipeline(llm, tmp.path()).run(&rows, None).await.unwrap();

        assert_eq!(summary.generated, 2);
        assert_eq!(summary.integrated, 2);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.final_equations, 2);
        assert_eq!(summary.terminal_nodes.sink, vec!["ERK_p".to_string()]);
        for name in [
            GENERATED_FILE,
            PATHWAY_REPORT_FILE,
            TERMINAL_NODES_FILE,
            ENHANCED_FILE,
            ENHANCEMENT_SUMMARY_FILE,
            FINAL_FILE,
        ] {
            assert!(tmp.path().join(name).exists(), "{name} missing");
        }
        let enhanced = std::fs::read_to_string(tmp.path().join(ENHANCED_FILE)).unwrap();
        assert!(enhanced.ends_with("ERK_p inhibits EGFR"));
        let final_text = std::fs::read_to_string(&summary.final_path).unwrap();
        assert!(final_text.starts_with("@rxn EGFR_act --> EGFR_inact"));
    }

    #[tokio::test]
    async fn test_generation_failure_stops_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockLlmAdapter::new().on_error("### Genes (Reaction Components)", "down"));
        let rows = vec![BioModelsRow {
            genes: "EGFR".to_string(),
            ..Default::default()
        }];
        let res = pipeline(llm, tmp.path()).run(&rows, None).await;
        assert!(matches!(res, Err(DomainError::Stage(_))));
        assert!(!tmp.path().join(GENERATED_FILE).exists());
    }
}
