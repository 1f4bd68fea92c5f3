//! SLA error types.

use oficio_core::{FileId, ValidationError};
use thiserror::Error;

/// Failures reported by an [`SlaStore`](crate::store::SlaStore).
///
/// Store failures belong to the persistence collaborator and are surfaced
/// to callers unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The record changed since it was read.
    #[error("revision conflict for {file_id}: expected {expected}, found {actual}")]
    Conflict {
        file_id: FileId,
        expected: u64,
        actual: u64,
    },

    /// Insert of a file that already has a status.
    #[error("status for {file_id} already exists")]
    AlreadyExists { file_id: FileId },

    /// Update of a file with no status.
    #[error("no status stored for {file_id}")]
    NotFound { file_id: FileId },

    /// The backing store could not be reached.
    #[error("SLA store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from SLA computation and tracking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlaError {
    /// Input rejected before computation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// `days_plazo` must be at least one business day.
    #[error("days_plazo must be positive, got {days}")]
    InvalidDaysPlazo { days: i64 },

    /// The file is already tracked with a different intake date or term.
    #[error("{file_id} is already tracked with a different clock; correct the deadline instead")]
    AlreadyTracked { file_id: FileId },

    /// The file has no SLA status.
    #[error("{file_id} is not tracked")]
    NotTracked { file_id: FileId },

    /// The SLA was already resolved.
    #[error("{file_id} was resolved at {resolved_at}")]
    AlreadyResolved { file_id: FileId, resolved_at: String },

    /// Optimistic writes kept losing to concurrent writers.
    #[error("gave up updating {file_id} after {attempts} conflicting writes")]
    ContentionExhausted { file_id: FileId, attempts: u32 },

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
