//! Similarity gate between retrieval and adjudication
//!
//! The gate is computed from retrieval hits alone, before any LLM client is
//! touched.

use minimem_domain::RetrievalHit;

/// Outcome of the similarity gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Nothing close enough; the conversation is aligned
    Skip {
        /// Best similarity seen, or 0.0 with no hits
        best: f64,
    },
    /// Top hit is at or above the threshold; ask the LLM
    Judge {
        /// Similarity of the top hit
        best: f64,
    },
}

impl GateDecision {
    /// Evaluate the gate over hits ordered by descending similarity
    pub fn evaluate(hits: &[RetrievalHit], threshold: f64) -> Self {
        match hits.first() {
            None => GateDecision::Skip { best: 0.0 },
            Some(top) if top.similarity >= threshold => GateDecision::Judge {
                best: top.similarity,
            },
            Some(top) => GateDecision::Skip {
                best: top.similarity,
            },
        }
    }

    /// Best similarity the decision was based on
    pub fn best(&self) -> f64 {
        match self {
            GateDecision::Skip { best } | GateDecision::Judge { best } => *best,
        }
    }

    /// True when adjudication should run
    pub fn should_judge(&self) -> bool {
        matches!(self, GateDecision::Judge { .. })
    }
}
