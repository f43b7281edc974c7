//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use minimem_alignment::AlignmentConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Environment variable holding the OpenAI API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Where the decision store lives
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding provider
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Completion provider used for adjudication
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Alignment check tuning
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Database location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path; defaults to `~/.minimem/minimem.db`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Embedding provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/embeddings`
    OpenAi,
    /// Local Ollama `/api/embeddings`
    Ollama,
    /// Offline feature hashing
    Hash,
}

/// Completion provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProviderKind {
    /// OpenAI-compatible `/chat/completions`
    OpenAi,
    /// Local Ollama `/api/generate`
    Ollama,
    /// Always answers "aligned"; no network
    Mock,
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Which provider to use
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,

    /// Model name; provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Vector dimension; provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    /// API base URL or Ollama endpoint; provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Completion provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Which provider to use
    #[serde(default = "default_completion_provider")]
    pub provider: CompletionProviderKind,

    /// Model name; provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API base URL or Ollama endpoint; provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// REPL history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// The `~/.minimem` directory.
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".minimem"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load configuration from `path`, or the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            config
                .alignment
                .validate()
                .map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, or the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::path()?,
        };

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Resolved database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home_dir()?.join("minimem.db")),
        }
    }
}

impl EmbeddingConfig {
    /// Vector dimension the configured provider produces.
    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(match self.provider {
            EmbeddingProviderKind::OpenAi => minimem_llm::openai::DEFAULT_EMBEDDING_DIMENSION,
            EmbeddingProviderKind::Ollama => minimem_llm::ollama::DEFAULT_EMBEDDING_DIMENSION,
            EmbeddingProviderKind::Hash => minimem_store::embedding::DEFAULT_HASH_DIMENSION,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            database: DatabaseConfig::default(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
            alignment: AlignmentConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dimension: None,
            base_url: None,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_completion_provider(),
            model: None,
            base_url: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::OpenAi
}

fn default_completion_provider() -> CompletionProviderKind {
    CompletionProviderKind::OpenAi
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}
