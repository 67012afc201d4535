//! Core domain layer. No external I/O dependencies.
//!
//! Entities, reaction notation rules, and the reaction network live here.

pub mod entities;
pub mod errors;
pub mod network;
pub mod notation;

pub use entities::{
    AnalysisSection, BioModelsRow, CompletedSection, Edge, EnhancementOutcome, IntegrationOutcome,
    PathwayReport, Queries, ReactionAdditions, ReactionOverview, ReadoutDecision, Relation,
    SearchQuery, SectionContent, SectionKind, TerminalNodes,
};
pub use errors::DomainError;
pub use network::{Continuity, ReactionNetwork};
pub use notation::FormatValidator;
