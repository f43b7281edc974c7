//! HNSW Vector Index for Nearest-Decision Search
//!
//! A wrapper around the HNSW algorithm for nearest-neighbor search over
//! decision embeddings, using cosine distance.
//!
//! # Architecture
//!
//! - In-memory only; SQLite holds the vectors
//! - Rebuilt from SQLite when the store opens
//! - Keyed directly by the decision row id
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//! - **efConstruction**: Candidate list size during construction (default: 200)
//! - **efSearch**: Candidate list size during search, chosen per query by the
//!   store (at least `k`)

use hnsw_rs::prelude::*;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Decision ids must be non-negative to be used as HNSW ids
    #[error("Invalid decision id: {0}")]
    InvalidId(i64),

    /// Internal HNSW or locking error
    #[error("HNSW error: {0}")]
    Internal(String),
}

struct IndexState {
    hnsw: Hnsw<'static, f32, DistCosine>,
    len: usize,
}

impl IndexState {
    fn empty() -> Self {
        let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            DEFAULT_M,
            DEFAULT_MAX_ELEMENTS,
            nb_layer,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );
        Self { hnsw, len: 0 }
    }
}

/// Cosine-distance HNSW index over decision embeddings
///
/// # Examples
///
/// ```no_run
/// use minimem_store::vector_index::VectorIndex;
///
/// let index = VectorIndex::new(3);
/// index.add(1, &[1.0, 0.0, 0.0]).unwrap();
///
/// let results = index.search(&[1.0, 0.0, 0.0], 5, 64).unwrap();
/// assert_eq!(results[0].0, 1);
/// ```
pub struct VectorIndex {
    dimension: usize,
    state: Mutex<IndexState>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension` floats
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: Mutex::new(IndexState::empty()),
        }
    }

    /// Expected vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexState>, VectorIndexError> {
        self.state
            .lock()
            .map_err(|_| VectorIndexError::Internal("index lock poisoned".to_string()))
    }

    /// Add a decision embedding to the index
    pub fn add(&self, decision_id: i64, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;
        let id = usize::try_from(decision_id).map_err(|_| VectorIndexError::InvalidId(decision_id))?;

        let embedding_vec = embedding.to_vec();
        let mut state = self.lock()?;
        state.hnsw.insert((&embedding_vec, id));
        state.len += 1;
        Ok(())
    }

    /// Search for the `k` nearest decisions to `query`
    ///
    /// Returns `(decision_id, cosine_distance)` pairs sorted by ascending
    /// distance.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(i64, f32)>, VectorIndexError> {
        self.check_dimension(query)?;

        let state = self.lock()?;
        if state.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<(i64, f32)> = state
            .hnsw
            .search(query, k, ef_search)
            .into_iter()
            .filter_map(|neighbour| {
                i64::try_from(neighbour.d_id)
                    .ok()
                    .map(|id| (id, neighbour.distance))
            })
            .collect();

        results.sort_by(|a, b| a.1.total_cmp(&b.1));
        results.truncate(k);
        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.len).unwrap_or(0)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all vectors from the index
    pub fn clear(&self) -> Result<(), VectorIndexError> {
        let mut state = self.lock()?;
        *state = IndexState::empty();
        Ok(())
    }
}
