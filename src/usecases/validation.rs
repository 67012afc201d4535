//! Equation repair loops: notation format and network connectivity.
//!
//! Both loops hand broken equations back to a model and re-check its answer.

use crate::domain::network::describe_subnetworks;
use crate::domain::notation::is_comment_or_blank;
use crate::domain::{FormatValidator, ReactionNetwork};
use crate::ports::{ChatMessage, CompletionRequest, LlmPort, ModelTier};
use crate::shared::prompts::{self, PromptManager};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Non-blank, non-comment lines of a model reply, trimmed, code fences removed.
pub fn response_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !is_comment_or_blank(l) && !l.starts_with("```"))
        .map(str::to_string)
        .collect()
}

/// Collapse repeated equations, keeping first occurrences. `None` when empty.
fn finish(lines: Vec<String>) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = lines.into_iter().filter(|l| seen.insert(l.clone())).collect();
    if unique.is_empty() {
        None
    } else {
        Some(unique)
    }
}

pub struct EquationValidator {
    llm: Arc<dyn LlmPort>,
    prompts: Arc<PromptManager>,
    format: FormatValidator,
    max_format_iterations: usize,
}

impl EquationValidator {
    pub fn new(llm: Arc<dyn LlmPort>, prompts: Arc<PromptManager>) -> Self {
        Self {
            llm,
            prompts,
            format: FormatValidator::new(),
            max_format_iterations: 3,
        }
    }

    /// Correction rounds used inside the connectivity loop.
    pub fn with_max_format_iterations(mut self, iterations: usize) -> Self {
        self.max_format_iterations = iterations.max(1);
        self
    }

    /// Keep valid equations, ask the writer model to rewrite the rest, repeat.
    ///
    /// Returns `None` when no valid equation is left. Repeated equations collapse.
    pub async fn validate_equations_format(
        &self,
        equations: &[String],
        max_iterations: usize,
    ) -> Option<Vec<String>> {
        let mut valid_lines: Vec<String> = Vec::new();
        let mut current: Vec<String> = equations
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        info!(count = current.len(), "validating reaction equation format");

        for iteration in 1..=max_iterations {
            info!(round = iteration, max_iterations, "format validation round");
            let (is_valid, invalid) = self.format.check_format(&current.join("\n"));
            if is_valid {
                valid_lines.append(&mut current);
                return finish(valid_lines);
            }

            for line in &invalid {
                warn!(line = %line, "invalid reaction line");
            }
            valid_lines.extend(
                current
                    .iter()
                    .filter(|e| !invalid.contains(e))
                    .cloned(),
            );

            match self.attempt_correction(&invalid, iteration).await {
                Some(corrected) if !corrected.is_empty() => current = corrected,
                _ => {
                    current.clear();
                    break;
                }
            }
        }

        if !current.is_empty() {
            warn!(max_iterations, "format correction budget spent");
            let invalid = self.format.find_invalid_lines(&current.join("\n"));
            for line in &invalid {
                error!(line = %line, "line could not be corrected");
            }
            valid_lines.extend(current.into_iter().filter(|e| !invalid.contains(e)));
        }

        finish(valid_lines)
    }

    async fn attempt_correction(&self, invalid: &[String], iteration: usize) -> Option<Vec<String>> {
        info!(lines = invalid.len(), "requesting correction of invalid lines");
        let messages = match (
            self.prompts.require(prompts::SYSTEM_PROMPT),
            self.prompts
                .render(prompts::REWRITE_PROMPT, &[("invalid_lines", invalid.join("\n").as_str())]),
        ) {
            (Ok(system), Ok(user)) => vec![ChatMessage::system(system), ChatMessage::user(user)],
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "correction prompt unavailable");
                return None;
            }
        };
        let request = CompletionRequest::new(
            format!("rewrite-{}", iteration),
            ModelTier::Writer,
            messages,
        );
        match self.llm.complete(&request).await {
            Ok(text) => {
                let corrected = response_lines(&text);
                info!(count = corrected.len(), "received corrected equations");
                Some(corrected)
            }
            Err(e) => {
                error!(error = %e, "correction request failed");
                None
            }
        }
    }

    /// Ask the planner model to bridge disconnected subnetworks until the
    /// network is weakly connected. Returns `None` on failure or when the
    /// iteration budget runs out.
    pub async fn validate_equations_connectivity(
        &self,
        equations: &[String],
        expected_readouts: &str,
        main_signaling_pathways: &str,
        max_iterations: usize,
    ) -> Option<Vec<String>> {
        let mut current = equations.to_vec();
        info!(count = current.len(), "validating network connectivity");

        for iteration in 1..=max_iterations {
            info!(round = iteration, max_iterations, "connectivity check round");
            let network = ReactionNetwork::from_lines(&current);
            if network.node_count() == 0 {
                error!("no parseable reactions, connectivity cannot be repaired");
                return None;
            }
            let continuity = network.check_continuity();
            if continuity.connected {
                info!("network continuity is maintained");
                return Some(current);
            }

            warn!(
                subnetworks = continuity.subnetworks.len(),
                "network continuity is broken"
            );
            let description = describe_subnetworks(&continuity.subnetworks);
            let bridged = self
                .connect_subnetworks(
                    &current,
                    &description,
                    main_signaling_pathways,
                    expected_readouts,
                    iteration,
                )
                .await;
            let Some(bridged) = bridged else {
                error!("failed to connect subnetworks, stopping");
                return None;
            };
            match self
                .validate_equations_format(&bridged, self.max_format_iterations)
                .await
            {
                Some(validated) => current = validated,
                None => {
                    error!("bridged network failed format validation");
                    return None;
                }
            }
        }

        error!(max_iterations, "connectivity not reached within budget");
        None
    }

    async fn connect_subnetworks(
        &self,
        equations: &[String],
        description: &str,
        main_signaling_pathways: &str,
        expected_readouts: &str,
        iteration: usize,
    ) -> Option<Vec<String>> {
        let joined = equations.join("\n");
        let user = self.prompts.render(
            prompts::REWRITE_CONTINUITY_PROMPT,
            &[
                ("equations", joined.as_str()),
                ("subnetworks", description),
                ("main_signaling_pathways", main_signaling_pathways),
                ("expected_readouts", expected_readouts),
            ],
        );
        let (system, user) = match (self.prompts.require(prompts::SYSTEM_PROMPT), user) {
            (Ok(system), Ok(user)) => (system, user),
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "continuity prompt unavailable");
                return None;
            }
        };
        let request = CompletionRequest::new(
            format!("continuity-{}", iteration),
            ModelTier::Planner,
            vec![ChatMessage::system(system), ChatMessage::user(user)],
        );
        match self.llm.complete(&request).await {
            Ok(text) => Some(response_lines(&text)).filter(|l| !l.is_empty()),
            Err(e) => {
                error!(error = %e, "continuity repair request failed");
                None
            }
        }
    }
}
