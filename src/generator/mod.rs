//! Idea generation through a language model
//!
//! [`IdeaGenerator`] is the seam the orchestrator depends on; [`ChatClient`]
//! is the production implementation backed by an OpenAI-compatible API.

pub mod client;
pub mod prompt;
pub mod response;

use async_trait::async_trait;

use crate::error::GenerationError;

pub use client::ChatClient;
pub use prompt::build_prompt;
pub use response::{parse_generation, GenerationResult, IdeaDraft};

/// Produces one structured idea per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdeaGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult, GenerationError>;
}
