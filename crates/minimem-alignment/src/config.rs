//! Configuration for the alignment check

use crate::error::AlignmentError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the alignment judge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Minimum top-hit similarity that triggers adjudication (inclusive)
    pub similarity_threshold: f64,

    /// Number of most recent turns rendered into the query
    pub window_turns: usize,

    /// Number of decisions retrieved per check
    pub top_k: usize,

    /// Sampling temperature for the adjudication call
    pub temperature: f32,

    /// Maximum time for the embedding call (seconds)
    pub embedding_timeout_secs: u64,

    /// Maximum time for the corpus query (seconds)
    pub retrieval_timeout_secs: u64,

    /// Maximum time for the adjudication call (seconds)
    pub judgment_timeout_secs: u64,
}

impl AlignmentConfig {
    /// Get the embedding timeout as a Duration
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs)
    }

    /// Get the retrieval timeout as a Duration
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs)
    }

    /// Get the judgment timeout as a Duration
    pub fn judgment_timeout(&self) -> Duration {
        Duration::from_secs(self.judgment_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AlignmentError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(AlignmentError::Config(
                "similarity_threshold must be between -1.0 and 1.0".to_string(),
            ));
        }
        if self.window_turns == 0 {
            return Err(AlignmentError::Config(
                "window_turns must be greater than 0".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(AlignmentError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AlignmentError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.embedding_timeout_secs == 0
            || self.retrieval_timeout_secs == 0
            || self.judgment_timeout_secs == 0
        {
            return Err(AlignmentError::Config(
                "timeouts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Strict preset: flags more conversations for adjudication
    pub fn strict() -> Self {
        Self {
            similarity_threshold: 0.70,
            window_turns: 6,
            top_k: 6,
            ..Self::default()
        }
    }

    /// Lenient preset: only near-verbatim matches reach the LLM
    pub fn lenient() -> Self {
        Self {
            similarity_threshold: 0.85,
            window_turns: 2,
            top_k: 3,
            judgment_timeout_secs: 120,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, AlignmentError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| AlignmentError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, AlignmentError> {
        toml::to_string_pretty(self)
            .map_err(|e| AlignmentError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            window_turns: 4,
            top_k: 4,
            temperature: 0.0,
            embedding_timeout_secs: 30,
            retrieval_timeout_secs: 10,
            judgment_timeout_secs: 60,
        }
    }
}
