//! Nearest-decision retrieval over a `DecisionCorpus`

use crate::error::AlignmentError;
use minimem_domain::traits::{CorpusMatch, DecisionCorpus};
use minimem_domain::RetrievalHit;
use std::sync::Arc;
use tracing::debug;

/// Retrieves the decisions most similar to a query vector
pub struct Retriever<C>
where
    C: DecisionCorpus,
{
    corpus: Arc<C>,
}

impl<C> Retriever<C>
where
    C: DecisionCorpus,
{
    /// Create a retriever over a shared corpus
    pub fn new(corpus: Arc<C>) -> Self {
        Self { corpus }
    }

    /// Return up to `k` hits ordered by descending similarity
    ///
    /// `k` larger than the corpus returns every decision.
    pub async fn retrieve(
        &self,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalHit>, AlignmentError> {
        if k == 0 {
            return Err(AlignmentError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }

        let matches = self
            .corpus
            .query_nearest(query_vector, k)
            .await
            .map_err(|e| AlignmentError::CorpusUnavailable(e.to_string()))?;

        let hits = to_hits(matches, k);
        debug!("Retrieved {} decisions (k = {})", hits.len(), k);
        Ok(hits)
    }
}

impl<C> Clone for Retriever<C>
where
    C: DecisionCorpus,
{
    fn clone(&self) -> Self {
        Self {
            corpus: Arc::clone(&self.corpus),
        }
    }
}

/// Convert distances to similarities, best first
fn to_hits(matches: Vec<CorpusMatch>, k: usize) -> Vec<RetrievalHit> {
    let mut hits: Vec<RetrievalHit> = matches
        .into_iter()
        .map(|m| RetrievalHit {
            similarity: 1.0 - m.distance,
            decision: m.decision,
        })
        .collect();

    hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    hits.truncate(k);
    hits
}
