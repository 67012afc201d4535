//! biomathforge: LLM-driven biochemical reaction network builder with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
