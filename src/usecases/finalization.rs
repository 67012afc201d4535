//! Final model preparation: degradation reactions against divergence, then
//! activation/inhibition rewritten into `@rxn` rate laws.

use crate::domain::DomainError;
use crate::ports::{ArtifactPort, ChatMessage, CompletionRequest, LlmPort, ModelTier};
use crate::shared::prompts::{self, PromptManager};
use crate::usecases::inputs::read_equations;
use crate::usecases::validation::{response_lines, EquationValidator};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const DIVERGENCE_PREVENTED_FILE: &str = "finalized_equations_divergence_prevented.txt";
pub const COMPLETE_FILE: &str = "finalized_equations_complete.txt";

#[derive(Debug, Clone)]
pub struct FinalizationOptions {
    pub max_format_iterations: usize,
    pub save_intermediate: bool,
}

impl Default for FinalizationOptions {
    fn default() -> Self {
        Self {
            max_format_iterations: 3,
            save_intermediate: true,
        }
    }
}

pub struct FinalizationService {
    llm: Arc<dyn LlmPort>,
    prompts: Arc<PromptManager>,
    validator: Arc<EquationValidator>,
    artifacts: Arc<dyn ArtifactPort>,
    options: FinalizationOptions,
}

impl FinalizationService {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        prompts: Arc<PromptManager>,
        validator: Arc<EquationValidator>,
        artifacts: Arc<dyn ArtifactPort>,
        options: FinalizationOptions,
    ) -> Self {
        Self {
            llm,
            prompts,
            validator,
            artifacts,
            options,
        }
    }

    pub async fn finalize_reactions_from_file(
        &self,
        path: &Path,
        prevent_divergence: bool,
        rewrite_activation_inhibition: bool,
    ) -> Result<Vec<String>, DomainError> {
        let equations = read_equations(path).await?;
        self.finalize_reactions(&equations, prevent_divergence, rewrite_activation_inhibition)
            .await
    }

    /// Both phases are optional. A failing phase logs and hands its input on;
    /// a degradation reply that never passes the format check is kept unchecked.
    pub async fn finalize_reactions(
        &self,
        equations: &[String],
        prevent_divergence: bool,
        rewrite_activation_inhibition: bool,
    ) -> Result<Vec<String>, DomainError> {
        let mut current: Vec<String> = equations
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        if current.is_empty() {
            return Err(DomainError::Input("no equations to finalize".to_string()));
        }
        info!(count = current.len(), "starting finalization");

        if prevent_divergence {
            match self.add_degradations(&current).await {
                Ok(lines) => {
                    current = lines;
                    self.save(DIVERGENCE_PREVENTED_FILE, &current).await;
                }
                Err(e) => error!(error = %e, "divergence prevention failed, continuing with input"),
            }
        }

        if rewrite_activation_inhibition {
            match self.rewrite_regulation(&current).await {
                Ok(lines) => {
                    current = lines;
                    self.save(COMPLETE_FILE, &current).await;
                }
                Err(e) => error!(error = %e, "activation/inhibition rewrite failed, keeping previous result"),
            }
        }

        info!(count = current.len(), "finalization completed");
        Ok(current)
    }

    async fn add_degradations(&self, equations: &[String]) -> Result<Vec<String>, DomainError> {
        let joined = equations.join("\n");
        let user = self
            .prompts
            .render(prompts::PREVENT_DIVERGENCE_PROMPT, &[("reactions", joined.as_str())])?;
        let request = CompletionRequest::new(
            "prevent-divergence",
            ModelTier::Planner,
            vec![
                ChatMessage::system(self.prompts.require(prompts::SYSTEM_PROMPT)?),
                ChatMessage::user(user),
            ],
        );
        let lines = response_lines(&self.llm.complete(&request).await?);
        if lines.is_empty() {
            return Err(DomainError::Stage(
                "divergence prevention returned no equations".to_string(),
            ));
        }
        match self
            .validator
            .validate_equations_format(&lines, self.options.max_format_iterations)
            .await
        {
            Some(validated) => Ok(validated),
            None => {
                warn!("degradation reactions failed format validation, keeping them as is");
                Ok(lines)
            }
        }
    }

    /// Sent without the notation system prompt: the reply mixes `@rxn` rate laws
    /// with ordinary reactions.
    async fn rewrite_regulation(&self, equations: &[String]) -> Result<Vec<String>, DomainError> {
        let joined = equations.join("\n");
        let user = self.prompts.render(
            prompts::REWRITE_ACTIVATION_INHIBITION_PROMPT,
            &[("reactions", joined.as_str())],
        )?;
        let request = CompletionRequest::new(
            "rewrite-activation-inhibition",
            ModelTier::Planner,
            vec![ChatMessage::user(user)],
        );
        let lines = response_lines(&self.llm.complete(&request).await?);
        if lines.is_empty() {
            return Err(DomainError::Stage(
                "activation/inhibition rewrite returned no equations".to_string(),
            ));
        }
        Ok(lines)
    }

    async fn save(&self, name: &str, lines: &[String]) {
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
    use crate::ports::ChatRole;

    const DEGRADE: &str = "Add missing degradation reactions";
    const REWRITE: &str = "Michaelis-Menten style reaction network";

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn service(llm: Arc<MockLlmAdapter>, dir: &Path) -> FinalizationService {
        let prompts = Arc::new(PromptManager::new());
        let validator = Arc::new(EquationValidator::new(llm.clone(), prompts.clone()));
        FinalizationService::new(
            llm,
            prompts,
            validator,
            Arc::new(FsArtifactStore::new(dir)),
            FinalizationOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_both_phases() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on(DEGRADE, "A activates B\nB_p is dephosphorylated --> B\nB is degraded")
                .on(
                    REWRITE,
                    "@rxn B_inact --> B_act : p[V_A_B] * u[A] * u[B_inact] / ( p[K_A_B] + u[B_inact] )\nB_act is degraded",
                ),
        );
        let svc = service(llm.clone(), tmp.path());
        let out = svc
            .finalize_reactions(&lines(&["A activates B"]), true, true)
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("@rxn B_inact --> B_act"));
        let phase1 = std::fs::read_to_string(tmp.path().join(DIVERGENCE_PREVENTED_FILE)).unwrap();
        assert!(phase1.contains("B is degraded"));
        assert!(tmp.path().join(COMPLETE_FILE).exists());

        let requests = llm.requests();
        assert_eq!(requests[0].messages[0].role, ChatRole::System);
        assert_eq!(requests[1].messages.len(), 1);
        assert_eq!(requests[1].messages[0].role, ChatRole::User);
        assert!(requests.iter().all(|r| r.tier == ModelTier::Planner));
    }

    #[tokio::test]
    async fn test_failed_phases_pass_input_through() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on_error(DEGRADE, "rate limited")
                .on(REWRITE, "```\n```"),
        );
        let svc = service(llm, tmp.path());
        let input = lines(&["A activates B", "B is degraded"]);
        let out = svc.finalize_reactions(&input, true, true).await.unwrap();
        assert_eq!(out, input);
        assert!(!tmp.path().join(DIVERGENCE_PREVENTED_FILE).exists());
        assert!(!tmp.path().join(COMPLETE_FILE).exists());
    }

    #[tokio::test]
    async fn test_unvalidated_degradation_reply_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on(DEGRADE, "A switches on B\nB fades away")
                .on_error("Invalid lines", "timeout"),
        );
        let svc = service(llm.clone(), tmp.path());
        let out = svc
            .finalize_reactions(&lines(&["A activates B"]), true, false)
            .await
            .unwrap();

        assert_eq!(out, lines(&["A switches on B", "B fades away"]));
        let saved = std::fs::read_to_string(tmp.path().join(DIVERGENCE_PREVENTED_FILE)).unwrap();
        assert!(saved.contains("B fades away"));
        assert_eq!(llm.requests()[1].tier, ModelTier::Writer);
    }

    #[tokio::test]
    async fn test_phases_can_be_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("enhanced.txt");
        std::fs::write(&path, "A activates B\n\n").unwrap();
        let llm = Arc::new(MockLlmAdapter::new().on(REWRITE, "@rxn A --> B : p[k] * u[A]"));
        let svc = service(llm.clone(), tmp.path());
        let out = svc.finalize_reactions_from_file(&path, false, true).await.unwrap();
        assert_eq!(out, lines(&["@rxn A --> B : p[k] * u[A]"]));
        assert_eq!(llm.requests().len(), 1);
    }
}
