//! Persistence collaborators: the question repository and the profile store.
//!
//! Both are traits so the quiz core can be exercised against fakes; the
//! in-memory implementations here back the server and are snapshotted to disk
//! by [`crate::persist`].

mod profiles;
mod questions;
mod report;

pub use profiles::{MemoryProfileStore, ProfileStore};
pub use questions::{MemoryQuestionStore, QuestionRepository, SuggestionDraft};
pub use report::spawn_score_report;

/// Errors surfaced by store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
