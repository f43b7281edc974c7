//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the alignment check and its
//! collaborators. Implementations live in `minimem-llm` and `minimem-store`.

use crate::DecisionRecord;
use async_trait::async_trait;

/// Converts text into a fixed-length semantic vector
///
/// Implemented by the infrastructure layer (minimem-llm, minimem-store)
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Error type for embedding operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Embed a non-empty piece of text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Dimension of the vectors this embedder produces
    fn dimension(&self) -> usize;
}

/// A single prompt-completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// The full prompt text
    pub prompt: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Ask the provider to constrain output to a JSON object
    pub json_response: bool,
}

impl CompletionRequest {
    /// A temperature-0 request for a JSON object response
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.0,
            json_response: true,
        }
    }

    /// Override the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (minimem-llm)
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Error type for completion operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Complete a prompt, returning the raw model output
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// A decision returned by nearest-neighbor search, with its cosine distance
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusMatch {
    /// The matched decision
    pub decision: DecisionRecord,

    /// Cosine distance to the query vector
    pub distance: f64,
}

/// Read-only nearest-neighbor access to the decision corpus
///
/// Implemented by the infrastructure layer (minimem-store)
#[async_trait]
pub trait DecisionCorpus: Send + Sync {
    /// Error type for corpus operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return up to `k` decisions ordered by ascending cosine distance
    async fn query_nearest(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<CorpusMatch>, Self::Error>;
}
