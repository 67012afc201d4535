//! Reaction generation from curated BioModels rows.
//!
//! One planner request per row, sent as a provider batch when possible,
//! followed by format validation of the collected equations.

use crate::adapters::persistence::{load_biomodels_csv, reaction_table};
use crate::domain::{BioModelsRow, DomainError};
use crate::ports::{ChatMessage, CompletionRequest, LlmPort, ModelTier};
use crate::shared::prompts::{self, PromptManager};
use crate::usecases::validation::EquationValidator;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const MAX_COMPLETION_TOKENS: u32 = 100_000;

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub max_rows: usize,
    pub use_batch_api: bool,
    pub validate_format: bool,
    pub max_iterations: usize,
    /// Pause between individual requests.
    pub request_delay: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_rows: 30,
            use_batch_api: true,
            validate_format: true,
            max_iterations: 3,
            request_delay: Duration::from_millis(100),
        }
    }
}

pub struct GenerationService {
    llm: Arc<dyn LlmPort>,
    prompts: Arc<PromptManager>,
    validator: Arc<EquationValidator>,
    options: GenerationOptions,
}

/// Split a `<genes>\t<equation>` line into its equation.
pub fn strip_gene_tag(line: &str) -> &str {
    line.split_once('\t').map_or(line, |(_, eq)| eq)
}

impl GenerationService {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        prompts: Arc<PromptManager>,
        validator: Arc<EquationValidator>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            llm,
            prompts,
            validator,
            options,
        }
    }

    pub async fn generate_from_csv(&self, path: &Path) -> Result<Vec<String>, DomainError> {
        let rows = load_biomodels_csv(path)?;
        self.generate_formatted_reactions(&rows).await
    }

    /// Generate reaction equations for up to `max_rows` rows.
    ///
    /// Validated equations when validation succeeds, the raw equations otherwise.
    pub async fn generate_formatted_reactions(
        &self,
        rows: &[BioModelsRow],
    ) -> Result<Vec<String>, DomainError> {
        let rows = &rows[..rows.len().min(self.options.max_rows)];
        info!(rows = rows.len(), "starting reaction generation");

        let raw = self.generate_raw(rows).await?;
        if raw.is_empty() {
            return Err(DomainError::Stage(
                "reaction generation produced no output".to_string(),
            ));
        }

        let equations: Vec<String> = raw
            .iter()
            .map(|r| strip_gene_tag(r).to_string())
            .collect();

        if !self.options.validate_format {
            info!("format validation skipped");
            return Ok(equations);
        }

        match self
            .validator
            .validate_equations_format(&equations, self.options.max_iterations)
            .await
        {
            Some(validated) => Ok(validated),
            None => {
                warn!("validation failed, returning raw equations");
                Ok(equations)
            }
        }
    }

    fn build_requests(&self, rows: &[BioModelsRow]) -> Result<Vec<CompletionRequest>, DomainError> {
        let system = self.prompts.require(prompts::SYSTEM_PROMPT)?;
        rows.iter()
            .enumerate()
            .map(|(i, row)| -> Result<CompletionRequest, DomainError> {
                let table = reaction_table(row);
                let user = self.prompts.render(
                    prompts::GENERATION_PROMPT,
                    &[("genes", row.genes.as_str()), ("reference_tbl", table.as_str())],
                )?;
                Ok(CompletionRequest::new(
                    format!("request_{}", i),
                    ModelTier::Planner,
                    vec![ChatMessage::system(system), ChatMessage::user(user)],
                )
                .with_max_completion_tokens(MAX_COMPLETION_TOKENS))
            })
            .collect()
    }

    /// Raw model lines tagged `<genes>\t<line>`, in row order.
    async fn generate_raw(&self, rows: &[BioModelsRow]) -> Result<Vec<String>, DomainError> {
        let requests = self.build_requests(rows)?;
        let tag = |row: &BioModelsRow, content: &str| -> Vec<String> {
            content
                .split('\n')
                .map(|line| format!("{}\t{}", row.genes, line))
                .collect()
        };

        if self.options.use_batch_api && requests.len() > 1 && self.llm.supports_batch() {
            info!(requests = requests.len(), "submitting batch generation");
            let results = self.llm.complete_batch(&requests).await?;
            let mut all = Vec::new();
            for (row, request) in rows.iter().zip(&requests) {
                match results.get(&request.id) {
                    Some(content) => all.extend(tag(row, content)),
                    None => error!(id = %request.id, genes = %row.genes, "no batch result for row"),
                }
            }
            info!(lines = all.len(), "batch generation finished");
            return Ok(all);
        }

        let mut all = Vec::new();
        for (i, (row, request)) in rows.iter().zip(&requests).enumerate() {
            info!(request = i + 1, total = requests.len(), "sending generation request");
            match self.llm.complete(request).await {
                Ok(content) => all.extend(tag(row, &content)),
                Err(e) => {
                    error!(request = i + 1, error = %e, "generation request failed, skipping");
                    continue;
                }
            }
            if !self.options.request_delay.is_zero() {
                tokio::time::sleep(self.options.request_delay).await;
            }
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmAdapter;

    fn row(genes: &str) -> BioModelsRow {
        BioModelsRow {
            genes: genes.to_string(),
            reactions: Some(vec![format!("{genes} -> {genes}_p")]),
            rates: Some(vec!["k1".to_string()]),
            model: None,
        }
    }

    fn service(llm: Arc<MockLlmAdapter>, options: GenerationOptions) -> GenerationService {
        let prompts = Arc::new(PromptManager::new());
        let validator = Arc::new(EquationValidator::new(llm.clone(), prompts.clone()));
        GenerationService::new(llm, prompts, validator, options)
    }

    fn quick() -> GenerationOptions {
        GenerationOptions {
            request_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn test_strip_gene_tag() {
        assert_eq!(strip_gene_tag("EGFR\tA activates B"), "A activates B");
        assert_eq!(strip_gene_tag("A activates B"), "A activates B");
    }

    #[tokio::test]
    async fn test_individual_requests_skip_failures() {
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on("EGFR", "EGF binds EGFR <--> EGF_EGFR")
                .on_error("MAPK1", "timeout")
                .on("SOS1", "SOS1 activates RAS"),
        );
        let svc = service(llm.clone(), GenerationOptions { use_batch_api: false, ..quick() });
        let out = svc
            .generate_formatted_reactions(&[row("EGFR"), row("MAPK1"), row("SOS1")])
            .await
            .unwrap();
        assert_eq!(out, vec!["EGF binds EGFR <--> EGF_EGFR", "SOS1 activates RAS"]);

        let requests = llm.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].tier, ModelTier::Planner);
        assert_eq!(requests[0].max_completion_tokens, Some(MAX_COMPLETION_TOKENS));
        assert!(requests[0].messages[1].content.contains("| EGFR -> EGFR_p | k1 |"));
    }

    #[tokio::test]
    async fn test_batch_path_and_max_rows() {
        let llm = Arc::new(
            MockLlmAdapter::new()
                .with_batch()
                .on("### Genes (Reaction Components):\nA1", "A1 activates B1")
                .on("### Genes (Reaction Components):\nA2", "A2 activates B2"),
        );
        let svc = service(llm.clone(), GenerationOptions { max_rows: 2, ..quick() });
        let out = svc
            .generate_formatted_reactions(&[row("A1"), row("A2"), row("A3")])
            .await
            .unwrap();
        assert_eq!(out, vec!["A1 activates B1", "A2 activates B2"]);
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_raw_equations_returned_when_validation_fails() {
        let llm = Arc::new(
            MockLlmAdapter::new()
                .on("GENE", "totally wrong")
                .on_error("Invalid lines", "down"),
        );
        let svc = service(llm, GenerationOptions { use_batch_api: false, ..quick() });
        let out = svc.generate_formatted_reactions(&[row("GENE")]).await.unwrap();
        assert_eq!(out, vec!["totally wrong"]);
    }

    #[tokio::test]
    async fn test_no_output_is_error() {
        let llm = Arc::new(MockLlmAdapter::new().on_error("GENE", "down"));
        let svc = service(llm, quick());
        let res = svc.generate_formatted_reactions(&[row("GENE")]).await;
        assert!(matches!(res, Err(DomainError::Stage(_))));
    }
}
