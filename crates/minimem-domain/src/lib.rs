//! MiniMem Domain Layer
//!
//! This crate contains the data model shared by every other MiniMem crate and
//! the trait interfaces for the external collaborators of the alignment check.
//!
//! ## Key Concepts
//!
//! - **Decision record**: a statement of organizational intent, recorded in a
//!   meeting and stored with a precomputed embedding
//! - **Conversation turn**: one message of the chat being checked
//! - **Retrieval hit**: a decision paired with its similarity to a query
//! - **Alignment verdict**: the aligned/misaligned judgment for a conversation
//!
//! ## Architecture
//!
//! - Pure data and invariants only, no I/O
//! - Infrastructure implementations live in `minimem-llm` and `minimem-store`
//! - Trait definitions for every external interaction (embedding, completion,
//!   nearest-neighbor search)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conversation;
pub mod decision;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use conversation::{ConversationTurn, Speaker};
pub use decision::DecisionRecord;
pub use verdict::{AlignmentVerdict, Contradiction, RetrievalHit, Severity, VerdictError};
