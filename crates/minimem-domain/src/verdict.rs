//! Retrieval hits and alignment verdicts
//!
//! A verdict either carries a [`Contradiction`] or it does not. The flat wire
//! shape (`issue`, `relevant_decision`, `meeting_title`, `severity` all null or
//! all present) is derived from that, so a verdict that mixes the two cannot
//! be constructed or deserialized.

use crate::DecisionRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How serious a contradiction is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Minor drift
    Low,
    /// Noticeable drift
    Medium,
    /// Direct opposition to a decision
    High,
}

impl Severity {
    /// Lowercase name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = VerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(VerdictError::UnknownSeverity(other.to_string())),
        }
    }
}

/// A decision retrieved for a query, with its cosine similarity
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalHit {
    /// The retrieved decision
    pub decision: DecisionRecord,

    /// Cosine similarity to the query, in [-1, 1]
    pub similarity: f64,
}

/// Details of a detected contradiction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contradiction {
    /// One sentence describing the contradiction
    pub issue: String,

    /// The decision text being contradicted
    pub relevant_decision: String,

    /// The meeting the decision came from
    pub meeting_title: String,

    /// How serious the contradiction is
    pub severity: Severity,
}

/// Errors raised when a verdict shape is inconsistent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerdictError {
    /// `aligned = false` without the full contradiction detail
    #[error("Misaligned verdict is missing field '{0}'")]
    MissingField(&'static str),

    /// `aligned = true` while carrying contradiction detail
    #[error("Aligned verdict must not carry field '{0}'")]
    UnexpectedField(&'static str),

    /// Severity outside low/medium/high
    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),
}

/// The aligned/misaligned judgment for a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "VerdictRepr", try_from = "VerdictRepr")]
pub struct AlignmentVerdict {
    contradiction: Option<Contradiction>,
    meeting_date: Option<NaiveDate>,
    similarity: f64,
}

impl AlignmentVerdict {
    /// A verdict with no contradiction
    pub fn no_contradiction(similarity: f64) -> Self {
        Self {
            contradiction: None,
            meeting_date: None,
            similarity,
        }
    }

    /// A verdict reporting a contradiction
    pub fn contradiction(contradiction: Contradiction, similarity: f64) -> Self {
        Self {
            contradiction: Some(contradiction),
            meeting_date: None,
            similarity,
        }
    }

    /// Replace similarity and meeting date with the values from retrieval
    ///
    /// Whatever the model reported for these fields is discarded; the index
    /// is the only trusted source for them.
    pub fn with_retrieval_metadata(mut self, similarity: f64, meeting_date: NaiveDate) -> Self {
        self.similarity = similarity;
        self.meeting_date = Some(meeting_date);
        self
    }

    /// True when no contradiction was found
    pub fn aligned(&self) -> bool {
        self.contradiction.is_none()
    }

    /// The contradiction detail, if any
    pub fn details(&self) -> Option<&Contradiction> {
        self.contradiction.as_ref()
    }

    /// Description of the contradiction
    pub fn issue(&self) -> Option<&str> {
        self.contradiction.as_ref().map(|c| c.issue.as_str())
    }

    /// The contradicted decision text
    pub fn relevant_decision(&self) -> Option<&str> {
        self.contradiction.as_ref().map(|c| c.relevant_decision.as_str())
    }

    /// The meeting the contradicted decision came from
    pub fn meeting_title(&self) -> Option<&str> {
        self.contradiction.as_ref().map(|c| c.meeting_title.as_str())
    }

    /// Severity of the contradiction
    pub fn severity(&self) -> Option<Severity> {
        self.contradiction.as_ref().map(|c| c.severity)
    }

    /// Meeting date of the top retrieval hit, when adjudication ran
    pub fn meeting_date(&self) -> Option<NaiveDate> {
        self.meeting_date
    }

    /// Similarity of the best retrieval hit considered
    pub fn similarity(&self) -> f64 {
        self.similarity
    }
}

/// Flat wire shape of a verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VerdictRepr {
    aligned: bool,
    issue: Option<String>,
    relevant_decision: Option<String>,
    meeting_title: Option<String>,
    meeting_date: Option<NaiveDate>,
    similarity: f64,
    severity: Option<Severity>,
}

impl From<AlignmentVerdict> for VerdictRepr {
    fn from(verdict: AlignmentVerdict) -> Self {
        let aligned = verdict.aligned();
        let (issue, relevant_decision, meeting_title, severity) = match verdict.contradiction {
            Some(c) => (
                Some(c.issue),
                Some(c.relevant_decision),
                Some(c.meeting_title),
                Some(c.severity),
            ),
            None => (None, None, None, None),
        };

        VerdictRepr {
            aligned,
            issue,
            relevant_decision,
            meeting_title,
            meeting_date: verdict.meeting_date,
            similarity: verdict.similarity,
            severity,
        }
    }
}

impl TryFrom<VerdictRepr> for AlignmentVerdict {
    type Error = VerdictError;

    fn try_from(repr: VerdictRepr) -> Result<Self, Self::Error> {
        let contradiction = if repr.aligned {
            if repr.issue.is_some() {
                return Err(VerdictError::UnexpectedField("issue"));
            }
            if repr.relevant_decision.is_some() {
                return Err(VerdictError::UnexpectedField("relevant_decision"));
            }
            if repr.meeting_title.is_some() {
                return Err(VerdictError::UnexpectedField("meeting_title"));
            }
            if repr.severity.is_some() {
                return Err(VerdictError::UnexpectedField("severity"));
            }
            None
        } else {
            Some(Contradiction {
                issue: repr.issue.ok_or(VerdictError::MissingField("issue"))?,
                relevant_decision: repr
                    .relevant_decision
                    .ok_or(VerdictError::MissingField("relevant_decision"))?,
                meeting_title: repr
                    .meeting_title
                    .ok_or(VerdictError::MissingField("meeting_title"))?,
                severity: repr.severity.ok_or(VerdictError::MissingField("severity"))?,
            })
        };

        Ok(AlignmentVerdict {
            contradiction,
            meeting_date: repr.meeting_date,
            similarity: repr.similarity,
        })
    }
}
