//! Runtime provider selection.
//!
//! The alignment judge is generic over its embedder and completion model;
//! the CLI picks them from configuration, so each is wrapped in an enum that
//! forwards to the chosen provider.

use crate::config::{CompletionProviderKind, Config, EmbeddingProviderKind};
use crate::error::{CliError, Result};
use async_trait::async_trait;
use minimem_alignment::AlignmentJudge;
use minimem_domain::traits::{CompletionModel, CompletionRequest, Embedder};
use minimem_llm::{LlmError, MockProvider, OllamaProvider, OpenAiProvider};
use minimem_store::{EmbeddingError, HashEmbedder, SqliteDecisionStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Default Ollama generation model
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

const MOCK_VERDICT: &str = r#"{"aligned": true, "issue": null, "relevant_decision": null, "meeting_title": null, "severity": null}"#;

/// The judge as wired by the CLI
pub type Judge = AlignmentJudge<EmbeddingBackend, SqliteDecisionStore, CompletionBackend>;

/// Errors from whichever embedder is active
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network provider error
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Offline embedder error
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Configured embedding provider
pub enum EmbeddingBackend {
    /// OpenAI-compatible API
    OpenAi(OpenAiProvider),
    /// Local Ollama
    Ollama(OllamaProvider),
    /// Offline feature hashing
    Hash(HashEmbedder),
}

#[async_trait]
impl Embedder for EmbeddingBackend {
    type Error = BackendError;

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, Self::Error> {
        match self {
            EmbeddingBackend::OpenAi(p) => Ok(p.embed(text).await?),
            EmbeddingBackend::Ollama(p) => Ok(p.embed(text).await?),
            EmbeddingBackend::Hash(p) => Ok(p.embed(text).await?),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            EmbeddingBackend::OpenAi(p) => p.dimension(),
            EmbeddingBackend::Ollama(p) => p.dimension(),
            EmbeddingBackend::Hash(p) => p.dimension(),
        }
    }
}

/// Configured completion provider
pub enum CompletionBackend {
    /// OpenAI-compatible API
    OpenAi(OpenAiProvider),
    /// Local Ollama
    Ollama(OllamaProvider),
    /// Canned "aligned" answers
    Mock(MockProvider),
}

#[async_trait]
impl CompletionModel for CompletionBackend {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, Self::Error> {
        match self {
            CompletionBackend::OpenAi(p) => p.complete(request).await,
            CompletionBackend::Ollama(p) => p.complete(request).await,
            CompletionBackend::Mock(p) => p.complete(request).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            CompletionBackend::OpenAi(p) => p.model_name(),
            CompletionBackend::Ollama(p) => p.model_name(),
            CompletionBackend::Mock(p) => p.model_name(),
        }
    }
}

fn openai(config: &Config, base_url: Option<&String>) -> Result<OpenAiProvider> {
    let provider = OpenAiProvider::from_env(&config.api_key_env)?;
    Ok(match base_url {
        Some(url) => provider.with_base_url(url.as_str()),
        None => provider,
    })
}

fn ollama(base_url: Option<&String>, model: &str) -> Result<OllamaProvider> {
    let endpoint = base_url
        .map(String::as_str)
        .unwrap_or(minimem_llm::ollama::DEFAULT_ENDPOINT);
    Ok(OllamaProvider::new(endpoint, model)?)
}

/// Build the configured embedder.
pub fn build_embedder(config: &Config) -> Result<EmbeddingBackend> {
    let settings = &config.embedding;
    let dimension = settings.dimension();
    debug!("Embedding provider {:?} ({} dims)", settings.provider, dimension);

    Ok(match settings.provider {
        EmbeddingProviderKind::OpenAi => {
            let model = settings
                .model
                .as_deref()
                .unwrap_or(minimem_llm::openai::DEFAULT_EMBEDDING_MODEL);
            EmbeddingBackend::OpenAi(
                openai(config, settings.base_url.as_ref())?.with_embedding_model(model, dimension),
            )
        }
        EmbeddingProviderKind::Ollama => {
            let model = settings
                .model
                .as_deref()
                .unwrap_or(minimem_llm::ollama::DEFAULT_EMBEDDING_MODEL);
            let chat_model = config
                .completion
                .model
                .as_deref()
                .unwrap_or(DEFAULT_OLLAMA_MODEL);
            EmbeddingBackend::Ollama(
                ollama(settings.base_url.as_ref(), chat_model)?.with_embedding_model(model, dimension),
            )
        }
        EmbeddingProviderKind::Hash => EmbeddingBackend::Hash(HashEmbedder::new(dimension)),
    })
}

/// Build the configured completion model.
pub fn build_completion(config: &Config) -> Result<CompletionBackend> {
    let settings = &config.completion;
    debug!("Completion provider {:?}", settings.provider);

    Ok(match settings.provider {
        CompletionProviderKind::OpenAi => {
            let model = settings
                .model
                .as_deref()
                .unwrap_or(minimem_llm::openai::DEFAULT_CHAT_MODEL);
            CompletionBackend::OpenAi(openai(config, settings.base_url.as_ref())?.with_chat_model(model))
        }
        CompletionProviderKind::Ollama => {
            let model = settings.model.as_deref().unwrap_or(DEFAULT_OLLAMA_MODEL);
            CompletionBackend::Ollama(ollama(settings.base_url.as_ref(), model)?)
        }
        CompletionProviderKind::Mock => CompletionBackend::Mock(MockProvider::new(MOCK_VERDICT)),
    })
}

/// Open the decision store for vectors of `dimension` floats.
pub fn open_store(config: &Config, dimension: usize) -> Result<SqliteDecisionStore> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    debug!("Opening decision store at {}", path.display());
    SqliteDecisionStore::open(&path, dimension).map_err(|e| {
        CliError::Config(format!(
            "Cannot open {} with {}-dimensional embeddings: {}. Run `minimem seed --reset` after changing the embedding provider.",
            path.display(),
            dimension,
            e
        ))
    })
}

/// Wire the configured providers and store into a judge.
pub fn build_judge(config: &Config) -> Result<Judge> {
    let embedder = build_embedder(config)?;
    let store = open_store(config, embedder.dimension())?;
    let llm = build_completion(config)?;

    Ok(AlignmentJudge::new(
        embedder,
        Arc::new(store),
        llm,
        config.alignment.clone(),
    )?)
}
