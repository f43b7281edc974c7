//! Corpus seeding from TOML
//!
//! A seed file lists meetings with their transcript, decisions and
//! participants. Seeding replaces the whole corpus: every transcript and
//! decision is embedded first, then the old rows are swapped for the new ones
//! in a single transaction.
//!
//! ```toml
//! [[meetings]]
//! title = "Q1 All-Hands: Strategic Pivot"
//! date = "2025-01-15"
//! transcript = "Sarah (CEO): ..."
//! decisions = ["Mobile app redesign is on hold indefinitely"]
//!
//! [[meetings.participants]]
//! name = "Sarah Chen"
//! role = "CEO"
//! ```

use crate::{CorpusStats, NewDecision, NewMeeting, Participant, SqliteDecisionStore, StoreError};
use chrono::NaiveDate;
use minimem_domain::traits::Embedder;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const DEMO_SEED: &str = include_str!("../data/demo_seed.toml");

/// Parsed seed file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedFile {
    /// Meetings to load
    #[serde(default)]
    pub meetings: Vec<SeedMeeting>,
}

/// One meeting in a seed file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedMeeting {
    /// Meeting title
    pub title: String,
    /// ISO date, quoted (`"2025-01-15"`)
    pub date: NaiveDate,
    /// Transcript text
    #[serde(default)]
    pub transcript: String,
    /// Decision statements
    #[serde(default)]
    pub decisions: Vec<String>,
    /// Attendees
    #[serde(default)]
    pub participants: Vec<SeedParticipant>,
}

/// One participant in a seed file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedParticipant {
    /// Display name
    pub name: String,
    /// Role, if known
    pub role: Option<String>,
}

impl SeedFile {
    /// Parse seed TOML
    pub fn from_toml(content: &str) -> Result<Self, StoreError> {
        let seed: SeedFile =
            toml::from_str(content).map_err(|e| StoreError::Seed(e.to_string()))?;
        seed.validate()?;
        Ok(seed)
    }

    /// Load seed TOML from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Seed(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// The bundled demo corpus
    pub fn demo() -> Result<Self, StoreError> {
        Self::from_toml(DEMO_SEED)
    }

    /// Total number of decisions across all meetings
    pub fn decision_count(&self) -> usize {
        self.meetings.iter().map(|m| m.decisions.len()).sum()
    }

    fn validate(&self) -> Result<(), StoreError> {
        for meeting in &self.meetings {
            if meeting.title.trim().is_empty() {
                return Err(StoreError::Seed("Meeting title cannot be empty".to_string()));
            }
            if meeting.decisions.iter().any(|d| d.trim().is_empty()) {
                return Err(StoreError::Seed(format!(
                    "Meeting '{}' has an empty decision",
                    meeting.title
                )));
            }
        }
        Ok(())
    }
}

async fn embed<E: Embedder>(embedder: &E, text: &str) -> Result<Vec<f32>, StoreError> {
    embedder
        .embed(text)
        .await
        .map_err(|e| StoreError::Embedding(e.to_string()))
}

/// Replace the corpus with the contents of `seed`
///
/// The embedder must produce vectors of the store's dimension. Returns the
/// row counts after seeding.
pub async fn seed_corpus<E: Embedder>(
    store: &SqliteDecisionStore,
    embedder: &E,
    seed: &SeedFile,
) -> Result<CorpusStats, StoreError> {
    if embedder.dimension() != store.dimension() {
        return Err(StoreError::DimensionMismatch {
            expected: store.dimension(),
            actual: embedder.dimension(),
        });
    }

    let mut meetings = Vec::with_capacity(seed.meetings.len());
    for (idx, meeting) in seed.meetings.iter().enumerate() {
        debug!(
            "Embedding meeting {}/{}: {}",
            idx + 1,
            seed.meetings.len(),
            meeting.title
        );

        let transcript_embedding = if meeting.transcript.trim().is_empty() {
            None
        } else {
            Some(embed(embedder, &meeting.transcript).await?)
        };

        let mut decisions = Vec::with_capacity(meeting.decisions.len());
        for text in &meeting.decisions {
            decisions.push(NewDecision {
                text: text.clone(),
                embedding: embed(embedder, text).await?,
            });
        }

        meetings.push(NewMeeting {
            title: meeting.title.clone(),
            date: meeting.date,
            transcript: meeting.transcript.clone(),
            transcript_embedding,
            decisions,
            participants: meeting
                .participants
                .iter()
                .map(|p| Participant {
                    name: p.name.clone(),
                    role: p.role.clone(),
                })
                .collect(),
        });
    }

    let stats = store.replace_corpus(&meetings)?;
    info!(
        "Seed complete: {} meetings, {} decisions, {} participants",
        stats.meetings, stats.decisions, stats.participants
    );
    Ok(stats)
}
