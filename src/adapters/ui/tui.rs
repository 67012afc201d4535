//! Implements InputPort. Inquire menu over the stage services.

use crate::adapters::ui::progress::StageSpinner;
use crate::domain::{DomainError, FormatValidator, ReactionNetwork};
use crate::ports::{ArtifactPort, InputPort};
use crate::usecases::enhancement::EnhancementService;
use crate::usecases::finalization::FinalizationService;
use crate::usecases::generation::GenerationService;
use crate::usecases::inputs::read_equations;
use crate::usecases::integration::IntegrationService;
use crate::usecases::pathway::PathwayAnalysisService;
use crate::usecases::pipeline::{
    ENHANCED_FILE, ENHANCEMENT_SUMMARY_FILE, FINAL_FILE, GENERATED_FILE, PipelineService,
    TERMINAL_NODES_FILE,
};
use async_trait::async_trait;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::validator::Validation;
use inquire::{Confirm, CustomUserError, InquireError, Select, Text};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Teal/green theme for every inquire prompt.
pub fn apply_theme() {
    let mut config = RenderConfig::default_colored();
    config.prompt_prefix = Styled::new("⚗").with_fg(Color::LightCyan);
    config.highlighted_option_prefix = Styled::new("➤").with_fg(Color::LightGreen);
    config.selected_option = Some(StyleSheet::new().with_fg(Color::LightGreen));
    config.answer = StyleSheet::new().with_fg(Color::LightCyan);
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    FullPipeline,
    Generate,
    PathwayAnalysis,
    Integrate,
    Enhance,
    Finalize,
    Inspect,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 8] = [
        MenuAction::FullPipeline,
        MenuAction::Generate,
        MenuAction::PathwayAnalysis,
        MenuAction::Integrate,
        MenuAction::Enhance,
        MenuAction::Finalize,
        MenuAction::Inspect,
        MenuAction::Exit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::FullPipeline => "Full pipeline (CSV -> final equations)",
            MenuAction::Generate => "Generate reactions from BioModels CSV",
            MenuAction::PathwayAnalysis => "Pathway analysis",
            MenuAction::Integrate => "Integrate reactions",
            MenuAction::Enhance => "Enhance with feedback loops and crosstalk",
            MenuAction::Finalize => "Finalize reactions",
            MenuAction::Inspect => "Inspect equations (format, continuity, terminal nodes)",
            MenuAction::Exit => "Exit",
        };
        f.write_str(label)
    }
}

fn prompt_error(e: InquireError) -> DomainError {
    DomainError::Input(format!("prompt failed: {}", e))
}

/// Esc or Ctrl-C at the main menu ends the session.
fn is_cancel(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

fn ask_path(message: &str) -> Result<PathBuf, DomainError> {
    let answer = Text::new(message)
        .with_validator(|input: &str| -> Result<Validation, CustomUserError> {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("a path is required".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .map_err(prompt_error)?;
    Ok(PathBuf::from(answer.trim()))
}

fn ask_optional_path(message: &str) -> Result<Option<PathBuf>, DomainError> {
    let answer = Text::new(message)
        .with_help_message("leave empty to skip")
        .prompt()
        .map_err(prompt_error)?;
    let trimmed = answer.trim();
    Ok((!trimmed.is_empty()).then(|| PathBuf::from(trimmed)))
}

fn ask_confirm(message: &str, default: bool) -> Result<bool, DomainError> {
    Confirm::new(message)
        .with_default(default)
        .prompt()
        .map_err(prompt_error)
}

/// Await a stage with a spinner running.
async fn with_spinner<T, F>(label: &str, fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    let spinner = StageSpinner::start(label);
    let result = fut.await;
    spinner.finish(result.is_ok());
    result
}

pub struct TuiInputPort {
    pipeline: Arc<PipelineService>,
    generation: Arc<GenerationService>,
    pathway: Arc<PathwayAnalysisService>,
    integration: Arc<IntegrationService>,
    enhancement: Arc<EnhancementService>,
    finalization: Arc<FinalizationService>,
    artifacts: Arc<dyn ArtifactPort>,
}

impl TuiInputPort {
    pub fn new(
        pipeline: Arc<PipelineService>,
        generation: Arc<GenerationService>,
        pathway: Arc<PathwayAnalysisService>,
        integration: Arc<IntegrationService>,
        enhancement: Arc<EnhancementService>,
        finalization: Arc<FinalizationService>,
        artifacts: Arc<dyn ArtifactPort>,
    ) -> Self {
        Self {
            pipeline,
            generation,
            pathway,
            integration,
            enhancement,
            finalization,
            artifacts,
        }
    }

    async fn dispatch(&self, action: MenuAction) -> Result<String, DomainError> {
        match action {
            MenuAction::FullPipeline => {
                let csv = ask_path("BioModels CSV:")?;
                let condition = ask_optional_path("Experimental condition file:")?;
                let summary = with_spinner(
                    "Full pipeline",
                    self.pipeline.run_from_csv(&csv, condition.as_deref()),
                )
                .await?;
                Ok(format!(
                    "{} generated, {} integrated, {} added, {} final -> {}",
                    summary.generated,
                    summary.integrated,
                    summary.added,
                    summary.final_equations,
                    summary.final_path.display()
                ))
            }
            MenuAction::Generate => {
                let csv = ask_path("BioModels CSV:")?;
                let equations =
                    with_spinner("Generating reactions", self.generation.generate_from_csv(&csv))
                        .await?;
                let path = self.artifacts.write_lines(GENERATED_FILE, &equations).await?;
                Ok(format!("{} equations -> {}", equations.len(), path.display()))
            }
            MenuAction::PathwayAnalysis => {
                let reactions = ask_path("Reactions file:")?;
                let condition = ask_optional_path("Experimental condition file:")?;
                let report = with_spinner(
                    "Pathway analysis",
                    self.pathway.run_pathway_analysis(&reactions, condition.as_deref()),
                )
                .await?;
                Ok(format!(
                    "Main Signaling Pathway:\n{}\n\nExpected Readouts:\n{}",
                    report.main_signaling_pathway, report.expected_readouts
                ))
            }
            MenuAction::Integrate => {
                let equations = ask_path("Equations file:")?;
                let report = ask_path("Pathway analysis JSON:")?;
                let outcome = with_spinner(
                    "Integrating reactions",
                    self.integration.integrate_reactions_from_files(&equations, &report),
                )
                .await?;
                let nodes = serde_json::to_value(&outcome.terminal_nodes)
                    .map_err(|e| DomainError::Artifact(e.to_string()))?;
                let path = self.artifacts.write_json(TERMINAL_NODES_FILE, &nodes).await?;
                Ok(format!(
                    "{} equations; terminal nodes -> {}",
                    outcome.equations.len(),
                    path.display()
                ))
            }
            MenuAction::Enhance => {
                let reactions = ask_path("Reactions file:")?;
                let terminal = ask_path("Terminal nodes JSON:")?;
                let overview = ask_optional_path("Pathway analysis JSON:")?;
                let outcome = with_spinner(
                    "Enhancing network",
                    self.enhancement.run_enhance_feedback_crosstalk(
                        &reactions,
                        &terminal,
                        overview.as_deref(),
                    ),
                )
                .await?;
                let path = self
                    .artifacts
                    .write_text(ENHANCED_FILE, &outcome.enhanced_reactions)
                    .await?;
                self.artifacts
                    .write_text(ENHANCEMENT_SUMMARY_FILE, &outcome.summary)
                    .await?;
                Ok(format!(
                    "{} reactions added -> {}\n{}",
                    outcome.added_reactions.len(),
                    path.display(),
                    outcome.summary
                ))
            }
            MenuAction::Finalize => {
                let equations = ask_path("Equations file:")?;
                let prevent_divergence = ask_confirm("Add degradation reactions?", true)?;
                let rewrite = ask_confirm("Rewrite activation/inhibition as @rxn?", true)?;
                let finalized = with_spinner(
                    "Finalizing reactions",
                    self.finalization
                        .finalize_reactions_from_file(&equations, prevent_divergence, rewrite),
                )
                .await?;
                let path = self.artifacts.write_lines(FINAL_FILE, &finalized).await?;
                Ok(format!("{} equations -> {}", finalized.len(), path.display()))
            }
            MenuAction::Inspect => {
                let path = ask_path("Equations file:")?;
                let equations = read_equations(&path).await?;
                Ok(inspect(&equations))
            }
            MenuAction::Exit => Ok(String::new()),
        }
    }
}

/// Offline report: invalid lines, continuity, terminal nodes.
fn inspect(equations: &[String]) -> String {
    let (valid, invalid) = FormatValidator::new().check_format(&equations.join("\n"));
    let network = ReactionNetwork::from_lines(equations);
    let continuity = network.check_continuity();
    let terminal = network.find_terminal_nodes();

    let mut report = format!(
        "{} equations, {} species/reaction nodes, {} edges\n",
        equations.len(),
        network.node_count(),
        network.edge_count()
    );
    if valid {
        report.push_str("Format: OK\n");
    } else {
        report.push_str(&format!("Format: {} invalid line(s)\n", invalid.len()));
        for line in &invalid {
            report.push_str(&format!("  - {}\n", line));
        }
    }
    if continuity.connected {
        report.push_str("Continuity: connected\n");
    } else {
        report.push_str(&format!(
            "Continuity: {} subnetworks\n",
            continuity.subnetworks.len()
        ));
    }
    report.push_str(&format!(
        "Sources: {}\nSinks: {}",
        terminal.source.join(", "),
        terminal.sink.join(", ")
    ));
    report
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let action = match Select::new("What do you want to run?", MenuAction::ALL.to_vec())
                .prompt()
            {
                Ok(action) => action,
                Err(e) if is_cancel(&e) => break,
                Err(e) => return Err(prompt_error(e)),
            };
            if action == MenuAction::Exit {
                break;
            }

            match self.dispatch(action).await {
                Ok(message) => {
                    info!(action = %action, "menu action finished");
                    println!("\n{}\n", message);
                }
                Err(e) => {
                    error!(action = %action, error = %e, "menu action failed");
                    println!("\nError: {}\n", e);
                }
            }
        }
        info!("session ended");
        Ok(())
    }
}
