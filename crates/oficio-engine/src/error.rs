//! Errors raised by the decision orchestrator.
//!
//! Ambiguous outcomes are not errors: they produce a [`ReviewCase`]
//! alongside a normal decision. Only rejected input, store failures, and a
//! lost worker end a decision early.
//!
//! [`ReviewCase`]: crate::review::ReviewCase

use oficio_core::{FileId, ValidationError};
use oficio_sla::SlaError;
use thiserror::Error;

/// Failure to produce a decision.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The case was rejected before any computation.
    #[error("invalid case: {0}")]
    Validation(#[from] ValidationError),

    /// Intake validation or SLA persistence failed.
    #[error(transparent)]
    Sla(#[from] SlaError),

    /// The review collaborator dropped its receiver.
    #[error("review queue closed; case for {file_id} was not delivered")]
    ReviewQueueClosed {
        /// File whose case was lost.
        file_id: FileId,
    },

    /// A batch worker panicked or was cancelled.
    #[error("batch worker for case #{index} did not complete")]
    WorkerLost {
        /// Position of the case in the batch.
        index: usize,
    },
}

impl EngineError {
    /// Whether the input itself was at fault. Such cases must not be retried.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Sla(SlaError::Validation(_))
                | Self::Sla(SlaError::InvalidDaysPlazo { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_input_errors() {
        assert!(EngineError::Validation(ValidationError::EmptyFileId).is_rejection());
        assert!(EngineError::Sla(SlaError::InvalidDaysPlazo { days: 0 }).is_rejection());
        assert!(!EngineError::WorkerLost { index: 3 }.is_rejection());
    }

    #[test]
    fn messages_name_the_case() {
        let err = EngineError::WorkerLost { index: 7 };
        assert!(err.to_string().contains("#7"));
    }
}
