//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local API for both generation and
//! embeddings, so the alignment check can run without a hosted provider.
//!
//! # Features
//!
//! - Async HTTP communication with Ollama API
//! - JSON mode via the `format` field
//! - Configurable endpoint, generation model and embedding model
//! - Timeout handling (no retries; the caller owns retry policy)
//!
//! # Examples
//!
//! ```no_run
//! use minimem_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1").unwrap();
//! ```

use crate::{ensure_embeddable, send_json, LlmError};
use async_trait::async_trait;
use minimem_domain::traits::{CompletionModel, CompletionRequest, Embedder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Vector dimension of `nomic-embed-text`
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;

/// Default timeout for Ollama requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Ollama API provider for local inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    embedding_model: String,
    dimension: usize,
    client: reqwest::Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Generation model (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimension: DEFAULT_EMBEDDING_DIMENSION,
            client,
        })
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the embedding model and the dimension it produces
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.embedding_model = model.into();
        self.dimension = dimension;
        self
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        model: &str,
    ) -> Result<R, LlmError> {
        let url = format!("{}/{}", self.endpoint, path);
        debug!("POST {} (model {})", url, model);

        let request = self.client.post(&url).json(body);
        send_json(request, model).await
    }
}

#[async_trait]
impl CompletionModel for OllamaProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            format: request.json_response.then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature,
            },
        };

        let response: OllamaGenerateResponse = self.post("api/generate", &body, &self.model).await?;
        Ok(response.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaProvider {
    type Error = LlmError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        ensure_embeddable(text)?;

        let body = OllamaEmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };
        let response: OllamaEmbeddingResponse =
            self.post("api/embeddings", &body, &self.embedding_model).await?;

        if response.embedding.len() != self.dimension {
            return Err(LlmError::InvalidResponse(format!(
                "Expected {}-dimensional embedding, got {}",
                self.dimension,
                response.embedding.len()
            )));
        }
        Ok(response.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
