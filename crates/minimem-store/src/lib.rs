//! MiniMem Storage Layer
//!
//! The decision corpus: SQLite for meetings, decisions and participants, plus
//! an in-memory HNSW index for nearest-decision search. Implements the
//! `DecisionCorpus` trait consumed by the alignment check.
//!
//! # Architecture
//!
//! - SQLite holds every record, including decision embeddings as BLOBs
//! - HNSW (cosine distance) is rebuilt from SQLite on open
//! - Clones share one connection and index; retrievals run on the blocking
//!   thread pool so callers can time them out
//!
//! # Examples
//!
//! ```no_run
//! use minimem_store::SqliteDecisionStore;
//!
//! let store = SqliteDecisionStore::in_memory(384).unwrap();
//! assert_eq!(store.stats().unwrap().decisions, 0);
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod seed;
pub mod vector_index;

use async_trait::async_trait;
use chrono::NaiveDate;
use minimem_domain::traits::{CorpusMatch, DecisionCorpus};
use minimem_domain::DecisionRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

pub use embedding::{cosine_similarity, EmbeddingError, HashEmbedder};
pub use seed::{seed_corpus, SeedFile, SeedMeeting, SeedParticipant};
pub use vector_index::{VectorIndex, VectorIndexError};

const DATE_FORMAT: &str = "%Y-%m-%d";
const MIN_EF_SEARCH: usize = 64;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Vector index error
    #[error("Vector index error: {0}")]
    Index(#[from] VectorIndexError),

    /// Vector length does not match the store dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Store dimension
        expected: usize,
        /// Dimension provided
        actual: usize,
    },

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Embedding failed while ingesting
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Seed file could not be parsed
    #[error("Seed error: {0}")]
    Seed(String),

    /// Connection lock poisoned by a panicking thread
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A decision to insert, with its embedding
#[derive(Debug, Clone)]
pub struct NewDecision {
    /// Decision statement
    pub text: String,
    /// Embedding of the statement
    pub embedding: Vec<f32>,
}

/// A participant of a meeting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Display name
    pub name: String,
    /// Role, if known
    pub role: Option<String>,
}

/// A meeting to insert together with its decisions and participants
#[derive(Debug, Clone)]
pub struct NewMeeting {
    /// Meeting title
    pub title: String,
    /// Meeting date
    pub date: NaiveDate,
    /// Full transcript
    pub transcript: String,
    /// Optional transcript embedding
    pub transcript_embedding: Option<Vec<f32>>,
    /// Decisions recorded in the meeting
    pub decisions: Vec<NewDecision>,
    /// Who attended
    pub participants: Vec<Participant>,
}

/// A stored meeting with its decisions, for listing
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingSummary {
    /// Row id
    pub id: i64,
    /// Meeting title
    pub title: String,
    /// Meeting date
    pub date: NaiveDate,
    /// Decision statements in insertion order
    pub decisions: Vec<String>,
    /// Participants in insertion order
    pub participants: Vec<Participant>,
}

/// Row counts of the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorpusStats {
    /// Number of meetings
    pub meetings: usize,
    /// Number of decisions
    pub decisions: usize,
    /// Number of participants
    pub participants: usize,
}

/// SQLite + HNSW implementation of `DecisionCorpus`
///
/// # Thread Safety
///
/// The connection sits behind a mutex and, like the index, is reference
/// counted: cloning the store is cheap and every clone sees the same corpus.
/// `query_nearest` moves its work onto `tokio::task::spawn_blocking`, so a
/// slow disk or a held lock never stalls the async executor.
#[derive(Clone)]
pub struct SqliteDecisionStore {
    conn: Arc<Mutex<Connection>>,
    index: Arc<VectorIndex>,
    dimension: usize,
}

impl SqliteDecisionStore {
    /// Open (or create) a store at `path` for embeddings of `dimension` floats
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn open<P: AsRef<Path>>(path: P, dimension: usize) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, dimension)
    }

    /// Open an in-memory store
    pub fn in_memory(dimension: usize) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, dimension)
    }

    fn from_connection(conn: Connection, dimension: usize) -> Result<Self, StoreError> {
        if dimension == 0 {
            return Err(StoreError::InvalidData(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }

        conn.execute_batch(include_str!("schema.sql"))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            index: Arc::new(VectorIndex::new(dimension)),
            dimension,
        };
        store.rebuild_index()?;
        Ok(store)
    }

    /// Embedding dimension this store accepts
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Rebuild the vector index from the decisions table
    pub fn rebuild_index(&self) -> Result<usize, StoreError> {
        self.index.clear()?;

        let rows: Vec<(i64, Vec<u8>)> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare("SELECT id, embedding FROM decisions ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        for (id, bytes) in &rows {
            let embedding = bytes_to_embedding(bytes)?;
            self.index.add(*id, &embedding)?;
        }

        info!("Vector index rebuilt with {} decisions", rows.len());
        Ok(rows.len())
    }

    fn check_meeting(&self, meeting: &NewMeeting) -> Result<(), StoreError> {
        if let Some(embedding) = &meeting.transcript_embedding {
            self.check_dimension(embedding)?;
        }
        for decision in &meeting.decisions {
            self.check_dimension(&decision.embedding)?;
        }
        Ok(())
    }

    /// Insert a meeting with its decisions and participants
    ///
    /// All rows are written in one transaction; the index is updated after
    /// the commit succeeds.
    pub fn insert_meeting(&self, meeting: &NewMeeting) -> Result<i64, StoreError> {
        self.check_meeting(meeting)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let (meeting_id, decision_ids) = write_meeting(&tx, meeting)?;
        tx.commit()?;
        drop(conn);

        for (id, decision) in decision_ids.into_iter().zip(&meeting.decisions) {
            self.index.add(id, &decision.embedding)?;
        }

        debug!(
            "Inserted meeting {} '{}' with {} decisions",
            meeting_id,
            meeting.title,
            meeting.decisions.len()
        );
        Ok(meeting_id)
    }

    /// Replace the whole corpus with `meetings`
    ///
    /// The delete and every insert share one transaction: if any row fails,
    /// the previous corpus is left untouched. The index is rebuilt only
    /// after the commit.
    pub fn replace_corpus(&self, meetings: &[NewMeeting]) -> Result<CorpusStats, StoreError> {
        for meeting in meetings {
            self.check_meeting(meeting)?;
        }

        {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;
            tx.execute_batch(
                "DELETE FROM participants; DELETE FROM decisions; DELETE FROM meetings;",
            )?;
            for meeting in meetings {
                write_meeting(&tx, meeting)?;
            }
            tx.commit()?;
        }

        self.rebuild_index()?;
        self.stats()
    }

    /// Delete every meeting, decision and participant
    pub fn clear(&self) -> Result<(), StoreError> {
        {
            let conn = self.lock()?;
            conn.execute_batch(
                "DELETE FROM participants; DELETE FROM decisions; DELETE FROM meetings;",
            )?;
        }
        self.index.clear()?;
        Ok(())
    }

    /// Check that the database answers
    pub fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Row counts
    pub fn stats(&self) -> Result<CorpusStats, StoreError> {
        let conn = self.lock()?;
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };

        Ok(CorpusStats {
            meetings: count("meetings")?,
            decisions: count("decisions")?,
            participants: count("participants")?,
        })
    }

    /// All meetings ordered by date, with their decisions and participants
    pub fn meetings(&self) -> Result<Vec<MeetingSummary>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT id, title, date FROM meetings ORDER BY date, id")?;
        let heads = stmt
            .query_map([], |row| {
                let date: String = row.get(2)?;
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, parse_date(2, &date)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut decisions_stmt =
            conn.prepare("SELECT content FROM decisions WHERE meeting_id = ?1 ORDER BY id")?;
        let mut participants_stmt =
            conn.prepare("SELECT name, role FROM participants WHERE meeting_id = ?1 ORDER BY id")?;

        let mut meetings = Vec::with_capacity(heads.len());
        for (id, title, date) in heads {
            let decisions = decisions_stmt
                .query_map(params![id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            let participants = participants_stmt
                .query_map(params![id], |row| {
                    Ok(Participant {
                        name: row.get(0)?,
                        role: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            meetings.push(MeetingSummary {
                id,
                title,
                date,
                decisions,
                participants,
            });
        }

        Ok(meetings)
    }

    /// Load one decision with its meeting metadata
    pub fn decision(&self, id: i64) -> Result<Option<DecisionRecord>, StoreError> {
        let conn = self.lock()?;
        load_decision(&conn, id)
    }

    fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<CorpusMatch>, StoreError> {
        let neighbours = self.index.search(vector, k, k.max(MIN_EF_SEARCH))?;
        if neighbours.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut matches = Vec::with_capacity(neighbours.len());
        for (id, distance) in neighbours {
            match load_decision(&conn, id)? {
                Some(decision) => matches.push(CorpusMatch {
                    decision,
                    distance: f64::from(distance),
                }),
                None => debug!("Decision {} is indexed but no longer stored", id),
            }
        }

        Ok(matches)
    }
}

/// Write one meeting's rows, returning its id and the new decision ids in order
fn write_meeting(conn: &Connection, meeting: &NewMeeting) -> Result<(i64, Vec<i64>), StoreError> {
    conn.execute(
        "INSERT INTO meetings (title, date, transcript, embedding) VALUES (?1, ?2, ?3, ?4)",
        params![
            &meeting.title,
            meeting.date.format(DATE_FORMAT).to_string(),
            &meeting.transcript,
            meeting.transcript_embedding.as_deref().map(embedding_to_bytes),
        ],
    )?;
    let meeting_id = conn.last_insert_rowid();

    for participant in &meeting.participants {
        conn.execute(
            "INSERT INTO participants (meeting_id, name, role) VALUES (?1, ?2, ?3)",
            params![meeting_id, &participant.name, &participant.role],
        )?;
    }

    let mut decision_ids = Vec::with_capacity(meeting.decisions.len());
    for decision in &meeting.decisions {
        conn.execute(
            "INSERT INTO decisions (meeting_id, content, embedding) VALUES (?1, ?2, ?3)",
            params![meeting_id, &decision.text, embedding_to_bytes(&decision.embedding)],
        )?;
        decision_ids.push(conn.last_insert_rowid());
    }

    Ok((meeting_id, decision_ids))
}

fn load_decision(conn: &Connection, id: i64) -> Result<Option<DecisionRecord>, StoreError> {
    let row = conn
        .query_row(
            "SELECT d.content, m.title, m.date, d.embedding
             FROM decisions d JOIN meetings m ON d.meeting_id = m.id
             WHERE d.id = ?1",
            params![id],
            |row| {
                let date: String = row.get(2)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    parse_date(2, &date)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(text, title, date, bytes)| {
        Ok(DecisionRecord::new(text, title, date, bytes_to_embedding(&bytes)?))
    })
    .transpose()
}

fn parse_date(column: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Encode an embedding as little-endian f32 bytes
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode little-endian f32 bytes
fn bytes_to_embedding(bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::InvalidData(format!(
            "Embedding blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[async_trait]
impl DecisionCorpus for SqliteDecisionStore {
    type Error = StoreError;

    async fn query_nearest(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<CorpusMatch>, Self::Error> {
        self.check_dimension(vector)?;

        let store = self.clone();
        let vector = vector.to_vec();
        tokio::task::spawn_blocking(move || store.nearest(&vector, k))
            .await
            .map_err(|e| StoreError::Unavailable(format!("retrieval task failed: {}", e)))?
    }
}
