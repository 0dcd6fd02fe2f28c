//! Text generation backends.
//!
//! The pipeline only depends on the [`TextGenerator`] trait; the Ollama
//! client is the production implementation and tests supply their own.

pub mod ollama;

use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use ollama::{OllamaClient, OllamaConfig};

/// Declared shape of the generated output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Free-form text (default)
    #[default]
    Text,
    /// Ask the backend to constrain output to JSON
    Json,
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Text => write!(f, "text"),
            ResponseFormat::Json => write!(f, "json"),
        }
    }
}

/// Parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl GenerationParams {
    /// Temperature 0, used for every call in a run.
    pub fn deterministic(response_format: ResponseFormat) -> Self {
        Self {
            temperature: 0.0,
            response_format,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::deterministic(ResponseFormat::default())
    }
}

/// Anything that turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError>;

    /// Name of the model behind this generator, for reporting.
    fn model_name(&self) -> &str;
}
