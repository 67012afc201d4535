//! Prompt registry. Built-in templates with runtime overrides.
//!
//! Overrides come from a YAML/TOML/JSON file (name -> template), a map, a text
//! file holding one template, or a plain string.

use crate::domain::DomainError;
use crate::shared::templates;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

pub const SYSTEM_PROMPT: &str = "system_prompt";
pub const GENERATION_PROMPT: &str = "generation_prompt";
pub const REWRITE_PROMPT: &str = "rewrite_prompt";
pub const INTEGRATE_MODEL_PROMPT: &str = "integrate_model_prompt";
pub const DROP_DUPLICATE_PROMPT: &str = "drop_duplicate_prompt";
pub const REWRITE_CONTINUITY_PROMPT: &str = "rewrite_continuity_prompt";
pub const PREVENT_DIVERGENCE_PROMPT: &str = "prevent_divergence_prompt";
pub const REWRITE_ACTIVATION_INHIBITION_PROMPT: &str = "rewrite_activation_inhibition_prompt";
pub const QUERY_WRITER_INSTRUCTIONS: &str = "query_writer_instructions";
pub const SECTION_WRITER_INSTRUCTIONS: &str = "section_writer_instructions";
pub const READOUT_EVALUATION_INSTRUCTIONS: &str = "readout_evaluation_instructions";
pub const READOUT_REFINEMENT_INSTRUCTIONS: &str = "readout_refinement_instructions";
pub const FEEDBACK_CROSSTALK_QUERY_WRITER: &str = "feedback_crosstalk_query_writer";
pub const REACTION_ENHANCEMENT_PROMPT: &str = "reaction_enhancement_prompt";

#[derive(Debug, Clone)]
pub struct PromptManager {
    prompts: HashMap<String, String>,
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptManager {
    pub fn new() -> Self {
        let prompts = [
            (SYSTEM_PROMPT, templates::SYSTEM_PROMPT),
            (GENERATION_PROMPT, templates::GENERATION_PROMPT),
            (REWRITE_PROMPT, templates::REWRITE_PROMPT),
            (INTEGRATE_MODEL_PROMPT, templates::INTEGRATE_MODEL_PROMPT),
            (DROP_DUPLICATE_PROMPT, templates::DROP_DUPLICATE_PROMPT),
            (REWRITE_CONTINUITY_PROMPT, templates::REWRITE_CONTINUITY_PROMPT),
            (PREVENT_DIVERGENCE_PROMPT, templates::PREVENT_DIVERGENCE_PROMPT),
            (
                REWRITE_ACTIVATION_INHIBITION_PROMPT,
                templates::REWRITE_ACTIVATION_INHIBITION_PROMPT,
            ),
            (QUERY_WRITER_INSTRUCTIONS, templates::QUERY_WRITER_INSTRUCTIONS),
            (SECTION_WRITER_INSTRUCTIONS, templates::SECTION_WRITER_INSTRUCTIONS),
            (
                READOUT_EVALUATION_INSTRUCTIONS,
                templates::READOUT_EVALUATION_INSTRUCTIONS,
            ),
            (
                READOUT_REFINEMENT_INSTRUCTIONS,
                templates::READOUT_REFINEMENT_INSTRUCTIONS,
            ),
            (
                FEEDBACK_CROSSTALK_QUERY_WRITER,
                templates::FEEDBACK_CROSSTALK_QUERY_WRITER,
            ),
            (REACTION_ENHANCEMENT_PROMPT, templates::REACTION_ENHANCEMENT_PROMPT),
        ]
        .into_iter()
        .map(|(name, text)| (name.to_string(), text.trim().to_string()))
        .collect();
        Self { prompts }
    }

    /// Merge templates from a structured file. Format follows the extension.
    pub fn update_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), DomainError> {
        let path = path.as_ref();
        let overrides: HashMap<String, String> = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| DomainError::Prompt(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), count = overrides.len(), "loaded prompt overrides");
        self.update_from_map(overrides);
        Ok(())
    }

    pub fn update_from_map(&mut self, overrides: HashMap<String, String>) {
        for (name, text) in overrides {
            self.prompts.insert(name, text.trim().to_string());
        }
    }

    /// Replace one template with the contents of a text file.
    pub fn update_from_txt(&mut self, name: &str, path: impl AsRef<Path>) -> Result<(), DomainError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Prompt(format!("{}: {}", path.display(), e)))?;
        self.prompts.insert(name.to_string(), text.trim().to_string());
        Ok(())
    }

    pub fn update_from_text(&mut self, name: &str, text: impl Into<String>) {
        self.prompts.insert(name.to_string(), text.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.prompts
            .get(name)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Template by name, or a `Prompt` error when it is missing or empty.
    pub fn require(&self, name: &str) -> Result<&str, DomainError> {
        self.get(name)
            .ok_or_else(|| DomainError::Prompt(format!("prompt not found: {}", name)))
    }

    /// Fill `{key}` placeholders in one left-to-right pass. Braces that name no
    /// variable are left alone, so JSON examples inside templates survive.
    /// Inserted values are never scanned again.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String, DomainError> {
        let template = self.require(name)?;
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let hit = after.find('}').and_then(|close| {
                let key = &after[..close];
                vars.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, value)| (*value, close))
            });
            match hit {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_prompts_present() {
        let pm = PromptManager::new();
        for name in [
            SYSTEM_PROMPT,
            GENERATION_PROMPT,
            REWRITE_PROMPT,
            INTEGRATE_MODEL_PROMPT,
            DROP_DUPLICATE_PROMPT,
            REWRITE_CONTINUITY_PROMPT,
            PREVENT_DIVERGENCE_PROMPT,
            REWRITE_ACTIVATION_INHIBITION_PROMPT,
            QUERY_WRITER_INSTRUCTIONS,
            SECTION_WRITER_INSTRUCTIONS,
            READOUT_EVALUATION_INSTRUCTIONS,
            READOUT_REFINEMENT_INSTRUCTIONS,
            FEEDBACK_CROSSTALK_QUERY_WRITER,
            REACTION_ENHANCEMENT_PROMPT,
        ] {
            assert!(pm.get(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn test_render_fills_placeholders_and_keeps_json() {
        let pm = PromptManager::new();
        let text = pm
            .render(
                QUERY_WRITER_INSTRUCTIONS,
                &[
                    ("reactions", "RAS activates RAF"),
                    ("experimental_condition_section", ""),
                    ("experimental_condition_note", ""),
                    ("section_title", "Main Signaling Pathway"),
                    ("section_description", "desc"),
                    ("number_of_queries", "4"),
                ],
            )
            .unwrap();
        assert!(text.contains("RAS activates RAF"));
        assert!(text.contains("Generate 4 web search queries"));
        assert!(text.contains(r#"{"queries": [{"search_query": "..."}]}"#));
    }

    #[test]
    fn test_render_does_not_expand_inserted_values() {
        let mut pm = PromptManager::new();
        pm.update_from_text("pair", "R: {reactions}\nC: {context} {x}");
        let text = pm
            .render(
                "pair",
                &[("reactions", "A binds {context}"), ("context", "EGF {reactions}")],
            )
            .unwrap();
        assert_eq!(text, "R: A binds {context}\nC: EGF {reactions} {x}");
    }

    #[test]
    fn test_missing_prompt_is_an_error() {
        let mut pm = PromptManager::new();
        pm.update_from_text(SYSTEM_PROMPT, "");
        assert!(matches!(pm.require(SYSTEM_PROMPT), Err(DomainError::Prompt(_))));
        assert!(pm.render("no_such_prompt", &[]).is_err());
    }

    #[test]
    fn test_update_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"rewrite_prompt": "  Fix: {{invalid_lines}}  "}}"#).unwrap();
        let mut pm = PromptManager::new();
        pm.update_from_file(file.path()).unwrap();
        assert_eq!(pm.get(REWRITE_PROMPT), Some("Fix: {invalid_lines}"));
        let text = pm.render(REWRITE_PROMPT, &[("invalid_lines", "a b")]).unwrap();
        assert_eq!(text, "Fix: a b");
    }

    #[test]
    fn test_update_from_txt() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Only {{reactions}}").unwrap();
        let mut pm = PromptManager::new();
        pm.update_from_txt(PREVENT_DIVERGENCE_PROMPT, file.path()).unwrap();
        assert_eq!(pm.get(PREVENT_DIVERGENCE_PROMPT), Some("Only {reactions}"));
    }
}
