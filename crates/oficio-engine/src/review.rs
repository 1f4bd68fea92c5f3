//! Manual review hand-off.
//!
//! An ambiguous decision still completes; it additionally yields a
//! [`ReviewCase`] keyed by file id that carries every reason and the full
//! per-field provenance trail. Cases travel to the review collaborator over
//! a [`ReviewQueue`].

use oficio_classify::ClassificationResult;
use oficio_core::{Category, Confidence, DecisionId, FileId, Timestamp};
use oficio_reconcile::{FieldMatchResult, ReviewFlag, UnifiedRecord};
use oficio_sla::{EscalationLevel, SlaStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::EngineError;

/// Why a decision was routed to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "detail", rename_all = "snake_case")]
pub enum ReviewReason {
    /// Raised while reconciling fields.
    Reconciliation(ReviewFlag),
    /// No category reached the acceptance threshold.
    BelowThreshold {
        /// Best-scoring category.
        top_candidate: Category,
        /// Its score.
        confidence: Confidence,
        /// Points missing to the threshold.
        gap: u8,
    },
}

impl std::fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reconciliation(flag) => flag.fmt(f),
            Self::BelowThreshold {
                top_candidate,
                confidence,
                gap,
            } => write!(
                f,
                "classification below threshold: best {top_candidate} at {confidence}, {gap} short"
            ),
        }
    }
}

/// A decision awaiting a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCase {
    /// The file under review.
    pub file_id: FileId,
    /// The decision that raised the case.
    pub decision_id: DecisionId,
    /// Every reason, reconciliation first.
    pub reasons: Vec<ReviewReason>,
    /// Per-field results with all source values.
    pub provenance: Vec<FieldMatchResult>,
    /// Classification as computed, `unknown` included.
    pub category: Category,
    /// Classification confidence.
    pub classification_confidence: Confidence,
    /// Deadline reviewers are working against.
    pub deadline: Timestamp,
    /// Escalation level when the case was raised.
    pub escalation_level: EscalationLevel,
    /// When the case was raised.
    pub opened_at: Timestamp,
}

impl ReviewCase {
    /// Build a case when the outcome is ambiguous; `None` otherwise.
    pub fn for_outcome(
        decision_id: DecisionId,
        record: &UnifiedRecord,
        classification: &ClassificationResult,
        sla: &SlaStatus,
        now: Timestamp,
    ) -> Option<Self> {
        let mut reasons: Vec<ReviewReason> = record
            .review_flags
            .iter()
            .cloned()
            .map(ReviewReason::Reconciliation)
            .collect();
        if classification.is_ambiguous() {
            reasons.push(ReviewReason::BelowThreshold {
                top_candidate: classification.top_candidate,
                confidence: classification.confidence,
                gap: classification.threshold_gap.unwrap_or_default(),
            });
        }
        if reasons.is_empty() {
            return None;
        }
        tracing::warn!(
            file_id = %sla.file_id,
            reasons = reasons.len(),
            first = %reasons[0],
            "decision routed to manual review"
        );
        Some(Self {
            file_id: sla.file_id.clone(),
            decision_id,
            reasons,
            provenance: record.fields.clone(),
            category: classification.level1,
            classification_confidence: classification.confidence,
            deadline: sla.deadline,
            escalation_level: sla.escalation_level,
            opened_at: now,
        })
    }
}

/// Sending half of the review channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReviewQueue {
    tx: mpsc::UnboundedSender<ReviewCase>,
}

impl ReviewQueue {
    /// A queue and the receiver the review collaborator drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReviewCase>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Whether the collaborator dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Hand a case to the collaborator.
    pub fn submit(&self, case: ReviewCase) -> Result<(), EngineError> {
        self.tx
            .send(case)
            .map_err(|mpsc::error::SendError(case)| EngineError::ReviewQueueClosed {
                file_id: case.file_id,
            })
    }
}
