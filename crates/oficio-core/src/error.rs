//! # Error Types
//!
//! Validation and canonicalization errors shared by every crate in the
//! workspace. Higher-level crates wrap these in their own `thiserror` enums.

use thiserror::Error;

/// Input rejected before any computation ran.
///
/// Validation failures are never retried: the same input would fail again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A file identifier was empty or whitespace-only.
    #[error("file identifier must not be empty")]
    EmptyFileId,

    /// A confidence score outside 0..=100.
    #[error("confidence {value} for {context} is outside 0..=100")]
    ConfidenceOutOfRange {
        /// Where the value came from (field name, rule name).
        context: String,
        /// The offending value.
        value: i64,
    },

    /// A source tag that does not name a known rendition.
    #[error("unknown source kind {0:?}")]
    UnknownSource(String),

    /// A category name outside the closed taxonomy.
    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    /// A timestamp that is not RFC 3339 UTC.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Ratios must be carried as integer basis points.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
