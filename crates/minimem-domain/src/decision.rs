//! Recorded decisions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A decision recorded in a meeting, with its precomputed embedding
///
/// Records are produced by ingestion and never change afterwards, so the
/// fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    text: String,
    meeting_title: String,
    meeting_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    embedding: Vec<f32>,
}

impl DecisionRecord {
    /// Create a decision record
    pub fn new(
        text: impl Into<String>,
        meeting_title: impl Into<String>,
        meeting_date: NaiveDate,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            text: text.into(),
            meeting_title: meeting_title.into(),
            meeting_date,
            embedding,
        }
    }

    /// The decision statement
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Title of the meeting the decision came from
    pub fn meeting_title(&self) -> &str {
        &self.meeting_title
    }

    /// Date of the meeting the decision came from
    pub fn meeting_date(&self) -> NaiveDate {
        self.meeting_date
    }

    /// The stored embedding (may be empty when a corpus omits vectors)
    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }
}
