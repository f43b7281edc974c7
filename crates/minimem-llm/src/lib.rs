//! MiniMem LLM Provider Layer
//!
//! Completion and embedding providers implementing the `CompletionModel` and
//! `Embedder` traits from `minimem-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted provider for testing, no network
//! - `OpenAiProvider`: OpenAI-compatible chat completions and embeddings
//! - `OllamaProvider`: Local Ollama API integration
//!
//! Providers never retry. A failed or timed-out call is returned to the
//! caller as an `LlmError`.
//!
//! # Examples
//!
//! ```
//! use minimem_llm::MockProvider;
//! use minimem_domain::traits::{CompletionModel, CompletionRequest};
//!
//! # async fn example() {
//! let provider = MockProvider::new(r#"{"aligned": true}"#);
//! let result = provider.complete(&CompletionRequest::json("prompt")).await.unwrap();
//! assert_eq!(result, r#"{"aligned": true}"#);
//! # }
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use minimem_domain::traits::{CompletionModel, CompletionRequest, Embedder};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM and embedding operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request did not finish in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Invalid response from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Input rejected before calling the provider
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider misconfigured (missing key, bad client settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(e.to_string())
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else {
            LlmError::Communication(format!("Request failed: {}", e))
        }
    }
}

/// Map a non-success HTTP status to an error
pub(crate) fn status_error(status: reqwest::StatusCode, body: String, model: &str) -> LlmError {
    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        reqwest::StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

/// Send a prepared JSON request and decode the JSON reply
///
/// Non-success statuses go through `status_error` with the response body.
pub(crate) async fn send_json<R: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    model: &str,
) -> Result<R, LlmError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(status_error(status, error_text, model));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

/// Reject text that the upstream model cannot embed
pub(crate) fn ensure_embeddable(text: &str) -> Result<(), LlmError> {
    if text.trim().is_empty() {
        return Err(LlmError::InvalidInput(
            "Empty text cannot be embedded".to_string(),
        ));
    }
    Ok(())
}

const MOCK_EMBEDDING_DIMENSION: usize = 8;

/// Mock provider for deterministic testing
///
/// Returns pre-configured completions and a fixed embedding without any
/// network calls. Clones share responses and call counters.
///
/// # Examples
///
/// ```
/// use minimem_llm::MockProvider;
/// use minimem_domain::traits::{CompletionModel, CompletionRequest};
///
/// # async fn example() {
/// let mut provider = MockProvider::default();
/// provider.add_response("mobile app", r#"{"aligned": false}"#);
///
/// let out = provider.complete(&CompletionRequest::json("talk about the mobile app")).await.unwrap();
/// assert_eq!(out, r#"{"aligned": false}"#);
/// assert_eq!(provider.call_count(), 1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, MockReply>>>,
    embedding: Vec<f32>,
    fail_embeddings: bool,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
    embed_count: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            embedding: vec![0.5; MOCK_EMBEDDING_DIMENSION],
            fail_embeddings: false,
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            embed_count: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Respond with `response` whenever the prompt contains `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fragment.into(), MockReply::Text(response.into()));
    }

    /// Fail whenever the prompt contains `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fragment.into(), MockReply::Error);
    }

    /// Return this vector from `embed`
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Make every `embed` call fail
    pub fn with_failing_embeddings(mut self) -> Self {
        self.fail_embeddings = true;
        self
    }

    /// Sleep before answering each completion
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `complete` was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of times `embed` was called
    pub fn embed_count(&self) -> usize {
        self.embed_count.load(Ordering::SeqCst)
    }

    /// Reset both call counters
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        self.embed_count.store(0, Ordering::SeqCst);
    }

    /// The most recent completion request, if any
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup(&self, prompt: &str) -> Option<MockReply> {
        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        responses
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionModel for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.lookup(&request.prompt) {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl Embedder for MockProvider {
    type Error = LlmError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        self.embed_count.fetch_add(1, Ordering::SeqCst);
        ensure_embeddable(text)?;

        if self.fail_embeddings {
            return Err(LlmError::Communication("Mock embedding failure".to_string()));
        }
        Ok(self.embedding.clone())
    }

    fn dimension(&self) -> usize {
        self.embedding.len()
    }
}
