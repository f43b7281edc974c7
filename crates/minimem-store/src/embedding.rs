//! Offline Text Embedding
//!
//! A feature-hashing embedder that needs no model files or network access.
//! Each lowercase word (minus common stopwords) is hashed into one of
//! `dimension` buckets with a hashed sign, and the result is normalized to
//! unit length. Texts sharing vocabulary get high cosine similarity, which is
//! enough to exercise the full alignment pipeline in development and tests.
//!
//! Hashing uses the standard library's `DefaultHasher`, which is stable for a
//! given toolchain. Re-seed the store after a toolchain upgrade.
//!
//! # Examples
//!
//! ```rust
//! use minimem_store::embedding::{cosine_similarity, HashEmbedder};
//!
//! let model = HashEmbedder::new(256);
//! let a = model.embed_text("Mobile app redesign is on hold").unwrap();
//! let b = model.embed_text("relaunch the mobile app").unwrap();
//! assert_eq!(a.len(), 256);
//! assert!(cosine_similarity(&a, &b) > 0.2);
//! ```

use async_trait::async_trait;
use minimem_domain::traits::Embedder;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Default dimension for the offline embedder
pub const DEFAULT_HASH_DIMENSION: usize = 384;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is", "it",
    "its", "let", "lets", "of", "on", "or", "our", "s", "so", "that", "the", "this", "to", "us",
    "was", "we", "were", "what", "will", "with",
];

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Zero-dimension model
    #[error("Embedding dimension must be greater than 0")]
    ZeroDimension,
}

/// Deterministic bag-of-words feature-hashing embedder
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a new hashing embedder
    ///
    /// # Parameters
    ///
    /// - `dimension`: The embedding dimension (e.g., 384)
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_token(token: &str, seed: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        token.hash(&mut hasher);
        hasher.finish()
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
    }

    /// Embed text synchronously
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::ZeroDimension);
        }
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in Self::tokens(text) {
            let bucket = (Self::hash_token(&token, 0) % self.dimension as u64) as usize;
            let sign = if Self::hash_token(&token, 1) & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        // Text made only of stopwords or punctuation still gets a vector
        if embedding.iter().all(|v| *v == 0.0) {
            let bucket = (Self::hash_token(text.trim(), 2) % self.dimension as u64) as usize;
            embedding[bucket] = 1.0;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        for value in &mut embedding {
            *value /= magnitude;
        }

        Ok(embedding)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    type Error = EmbeddingError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        self.embed_text(text)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in [-1, 1]; 0.0 when either vector has zero magnitude or
/// the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
