//! MiniMem Alignment Check
//!
//! Decides whether the recent turns of a conversation contradict decisions
//! recorded in past meetings.
//!
//! # Architecture
//!
//! ```text
//! last N turns → Embedder → DecisionCorpus (top K) → gate → LLM → AlignmentVerdict
//! ```
//!
//! The gate sends the conversation to the LLM only when the best retrieved
//! decision reaches the similarity threshold (0.75 by default). Below it the
//! verdict is `aligned` without any model call. When the LLM does run, the
//! verdict's `similarity` and `meeting_date` come from the top retrieval hit,
//! never from the model.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use minimem_alignment::{AlignmentConfig, AlignmentJudge};
//! use minimem_domain::ConversationTurn;
//! use minimem_llm::MockProvider;
//! use minimem_store::{HashEmbedder, SqliteDecisionStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = HashEmbedder::default();
//! let store = Arc::new(SqliteDecisionStore::in_memory(384)?);
//! let llm = MockProvider::new(r#"{"aligned": true}"#);
//!
//! let judge = AlignmentJudge::new(embedder, store, llm, AlignmentConfig::default())?;
//!
//! let history = vec![ConversationTurn::user("let's relaunch the old mobile app")];
//! let verdict = judge.check_alignment(&history).await?;
//! println!("aligned: {}, similarity: {:.2}", verdict.aligned(), verdict.similarity());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;
mod judge;
mod parser;
mod prompt;
mod retriever;
mod window;

#[cfg(test)]
mod tests;

pub use config::AlignmentConfig;
pub use error::AlignmentError;
pub use gate::GateDecision;
pub use judge::AlignmentJudge;
pub use parser::parse_judgment;
pub use prompt::PromptBuilder;
pub use retriever::Retriever;
pub use window::ConversationWindow;
