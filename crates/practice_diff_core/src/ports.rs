//! crates/practice_diff_core/src/ports.rs
//!
//! Defines the contracts (traits) the reconciliation logic depends on.
//! The document store and the HTTP API each sit behind these, so the core
//! never knows which backend produced a record.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Assignment, EntityId, RemainingRights, Student, SuggestedStory};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The credential exchange, or a bearer token, was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The network or the store could not be reached.
    #[error("Transport failure: {0}")]
    Transport(String),
    /// An identifier that cannot be converted to an `EntityId`.
    #[error("Malformed reference: {0}")]
    MalformedReference(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PortError::Unauthorized(_) => FailureKind::Unauthorized,
            PortError::NotFound(_) => FailureKind::NotFound,
            PortError::Transport(_) => FailureKind::Transport,
            PortError::MalformedReference(_) => FailureKind::MalformedReference,
            PortError::Unexpected(_) => FailureKind::Unexpected,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// The category of a failure, kept in rendered output so the operator can
/// tell an auth problem from a connectivity problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unauthorized,
    NotFound,
    Transport,
    MalformedReference,
    Unexpected,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait StudentDirectory: Send + Sync {
    /// Every known student, in store order. An empty store is not an error.
    async fn fetch_students(&self) -> PortResult<Vec<Student>>;
}

#[async_trait]
pub trait TitleLookup: Send + Sync {
    /// Resolves a story to its title. `Ok(None)` when the story is gone.
    async fn fetch_story_title(&self, story_id: &EntityId) -> PortResult<Option<String>>;
}

/// The four reads that make up one bundle, already scoped to one student.
#[async_trait]
pub trait BundleSource: Send + Sync {
    async fn fetch_remaining_rights(&self) -> PortResult<Option<RemainingRights>>;

    async fn fetch_incomplete_assignments(&self) -> PortResult<Vec<Assignment>>;

    async fn fetch_completed_assignments(&self) -> PortResult<Vec<Assignment>>;

    async fn fetch_suggested_stories(&self) -> PortResult<Vec<SuggestedStory>>;
}

/// Opens a student-scoped `BundleSource` on one backend.
///
/// Opening may itself fail (e.g. the API's credential exchange); in that case
/// none of the bundle reads are issued.
#[async_trait]
pub trait BundleProvider: Send + Sync {
    async fn open(&self, student: &Student) -> PortResult<Box<dyn BundleSource>>;
}
