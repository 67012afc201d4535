//! Application use cases. Orchestrate domain logic via ports.

pub mod enhancement;
pub mod finalization;
pub mod generation;
pub mod inputs;
pub mod integration;
pub mod pathway;
pub mod pipeline;
pub mod validation;

pub use enhancement::{EnhancementOptions, EnhancementService};
pub use finalization::{FinalizationOptions, FinalizationService};
pub use generation::{GenerationOptions, GenerationService};
pub use integration::{IntegrationOptions, IntegrationService};
pub use pathway::{PathwayAnalysisService, PathwayOptions};
pub use pipeline::{PipelineOptions, PipelineService, PipelineSummary};
pub use validation::EquationValidator;
