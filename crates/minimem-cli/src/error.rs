//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider could not be set up
    #[error("Provider error: {0}")]
    Provider(#[from] minimem_llm::LlmError),

    /// Decision store error
    #[error("Store error: {0}")]
    Store(#[from] minimem_store::StoreError),

    /// Alignment check failed
    #[error("Alignment check failed: {0}")]
    Alignment(#[from] minimem_alignment::AlignmentError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
