//! Language-model collaborator.
//!
//! The model's non-determinism stays behind the [`ScoreProvider`] trait;
//! the pipeline only ever sees normalized values.

pub mod ollama;
pub mod prompts;
pub mod provider;

#[cfg(test)]
pub mod stub;

pub use ollama::{OllamaConfig, OllamaProvider};
pub use provider::{PortfolioBrief, ProjectBrief, ScoreProvider, ScoredProjectLine};
