//! Error types for the alignment check

use thiserror::Error;

/// Errors that can occur during an alignment check
///
/// None of these are retried or replaced with a fallback verdict.
#[derive(Error, Debug)]
pub enum AlignmentError {
    /// Embedding provider failed or timed out
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Decision corpus failed or timed out
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// LLM call failed or timed out
    #[error("Judgment unavailable: {0}")]
    JudgmentUnavailable(String),

    /// LLM output is not a valid verdict
    #[error("Judgment malformed: {0}")]
    JudgmentMalformed(String),

    /// Invalid judge configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AlignmentError {
    fn from(e: serde_json::Error) -> Self {
        AlignmentError::JudgmentMalformed(format!("JSON parse error: {}", e))
    }
}
