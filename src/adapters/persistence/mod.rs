//! Filesystem adapters: BioModels CSV input and stage artifact output.

pub mod biomodels_csv;
pub mod fs_artifacts;

pub use biomodels_csv::{load_biomodels_csv, reaction_table};
pub use fs_artifacts::FsArtifactStore;
