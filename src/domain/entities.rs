//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/IO types here; adapters map provider payloads into these.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reaction kind recognised in one line of reaction notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Dimerize,
    Bind,
    Dissociate,
    Phosphorylate,
    IsPhosphorylated,
    Dephosphorylate,
    IsDephosphorylated,
    Transcribe,
    Synthesize,
    IsSynthesized,
    Degrade,
    IsDegraded,
    Translocate,
    Activate,
    Inhibit,
    StateTransition,
    /// `@rxn LHS --> RHS : rate` line with an explicit rate law.
    Rxn,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Dimerize => "dimerize",
            Relation::Bind => "bind",
            Relation::Dissociate => "dissociate",
            Relation::Phosphorylate => "phosphorylate",
            Relation::IsPhosphorylated => "is phosphorylated",
            Relation::Dephosphorylate => "dephosphorylate",
            Relation::IsDephosphorylated => "is dephosphorylated",
            Relation::Transcribe => "transcribe",
            Relation::Synthesize => "synthesize",
            Relation::IsSynthesized => "is synthesized",
            Relation::Degrade => "degrade",
            Relation::IsDegraded => "is degraded",
            Relation::Translocate => "translocate",
            Relation::Activate => "activate",
            Relation::Inhibit => "inhibit",
            Relation::StateTransition => "state transition",
            Relation::Rxn => "rxn",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directed edge of the reaction network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub relation: Relation,
    /// Text after the `|` separator, empty when absent.
    pub parameters: String,
}

/// Network inputs and outputs. Serialized as `{"source": [...], "sink": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalNodes {
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub sink: Vec<String>,
}

/// The two report fields later stages steer by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionOverview {
    #[serde(rename = "Main Signaling Pathway", default)]
    pub main_signaling_pathway: String,
    #[serde(rename = "Expected Readouts", default)]
    pub expected_readouts: String,
}

impl ReactionOverview {
    pub fn unknown() -> Self {
        Self {
            main_signaling_pathway: "unknown".to_string(),
            expected_readouts: "unknown".to_string(),
        }
    }

    /// True when both fields carry text.
    pub fn is_complete(&self) -> bool {
        !self.main_signaling_pathway.trim().is_empty() && !self.expected_readouts.trim().is_empty()
    }
}

/// Pathway analysis report as written to `pathway_analysis_result.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwayReport {
    #[serde(rename = "Reaction Equations")]
    pub reaction_equations: String,
    #[serde(rename = "Experimental Condition")]
    pub experimental_condition: Option<String>,
    #[serde(rename = "Main Signaling Pathway")]
    pub main_signaling_pathway: String,
    #[serde(rename = "Expected Readouts")]
    pub expected_readouts: String,
}

impl PathwayReport {
    pub fn overview(&self) -> ReactionOverview {
        ReactionOverview {
            main_signaling_pathway: self.main_signaling_pathway.clone(),
            expected_readouts: self.expected_readouts.clone(),
        }
    }
}

/// One curated BioModels row: the genes involved and the reference reactions with rate laws.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BioModelsRow {
    pub genes: String,
    pub reactions: Option<Vec<String>>,
    pub rates: Option<Vec<String>>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    MainSignalingPathway,
    ExpectedReadouts,
}

/// A research task of the pathway analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSection {
    pub kind: SectionKind,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSection {
    pub kind: SectionKind,
    pub content: String,
    pub sources: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Structured model outputs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub search_query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queries {
    pub queries: Vec<SearchQuery>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    pub content: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadoutDecision {
    pub should_refine: bool,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub suggested_improvements: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionAdditions {
    #[serde(default)]
    pub added_reactions: Vec<String>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage outcomes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationOutcome {
    pub equations: Vec<String>,
    pub terminal_nodes: TerminalNodes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancementOutcome {
    /// Original reactions followed by the added ones.
    pub enhanced_reactions: String,
    pub summary: String,
    pub added_reactions: Vec<String>,
}
