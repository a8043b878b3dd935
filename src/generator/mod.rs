//! Text generation backends.

pub mod ollama;
pub mod openai;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::{GeneratorBackend, GeneratorConfig};

pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },
    #[error("{provider} rejected the credential")]
    AuthFailed { provider: String },
    #[error("{provider} is rate limiting requests")]
    RateLimited { provider: String },
    #[error("invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Turns a prompt into free-form text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Generate text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream call fails or its response is unusable.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Build the configured backend, authenticated with `credential`.
///
/// # Errors
///
/// Returns an error if the backend's HTTP client cannot be built.
pub fn build_generator(
    config: &GeneratorConfig,
    credential: &str,
) -> Result<Arc<dyn ContentGenerator>> {
    Ok(match config.backend {
        GeneratorBackend::OpenAi => Arc::new(OpenAiGenerator::new(config, credential)?),
        GeneratorBackend::Ollama => Arc::new(OllamaGenerator::new(config)?),
    })
}
