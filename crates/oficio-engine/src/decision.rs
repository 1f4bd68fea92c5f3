//! The decision orchestrator.
//!
//! A decision runs in two phases. [`DecisionEngine::analyze`] validates the
//! case and runs the two pure, CPU-bound stages (reconciliation and
//! classification); it needs no clock and no store, so batches can fan it
//! out on a worker pool. [`DecisionEngine::finish`] then joins the analysis
//! with an SLA status and assembles the review case and audit entries.
//!
//! [`DecisionEngine::decide`] runs both phases with a previewed SLA status
//! and touches no shared state. [`DecisionService`] does the same against
//! a persistent SLA tracker.
//!
//! [`DecisionService`]: crate::service::DecisionService

use std::sync::Arc;

use chrono::NaiveDate;
use oficio_classify::{classify, ClassificationResult};
use oficio_core::{DecisionId, FileId, Timestamp};
use oficio_policy::EngineConfig;
use oficio_reconcile::{reconcile_raw, RawFieldCandidate, UnifiedRecord};
use oficio_sla::{compute_status, validate_intake, BusinessCalendar, SlaStatus};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditEntry, AuditPayload};
use crate::case::DecisionCase;
use crate::error::EngineError;
use crate::review::ReviewCase;

/// Output of the pure stages for one validated case.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Run identifier, shared by every audit entry of the decision.
    pub decision_id: DecisionId,
    /// Validated file identifier.
    pub file_id: FileId,
    /// Date the oficio was received.
    pub intake_date: NaiveDate,
    /// Validated business-day term.
    pub days_plazo: u32,
    /// Reconciled record.
    pub record: UnifiedRecord,
    /// Classification of the record.
    pub classification: ClassificationResult,
}

impl Analysis {
    /// Whether the decision will carry a review case.
    pub fn needs_review(&self) -> bool {
        self.record.needs_review() || self.classification.is_ambiguous()
    }
}

/// The final artifact handed to review and export collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Run identifier.
    pub decision_id: DecisionId,
    /// The decided file.
    pub file_id: FileId,
    /// When the decision was assembled.
    pub decided_at: Timestamp,
    /// Reconciled record.
    pub record: UnifiedRecord,
    /// Classification.
    pub classification: ClassificationResult,
    /// Deadline status.
    pub sla: SlaStatus,
    /// Review case, when the outcome is ambiguous.
    pub review: Option<ReviewCase>,
    /// One entry per produced result.
    pub audit: Vec<AuditEntry>,
}

impl Decision {
    /// Whether a human must look at this decision.
    pub fn needs_review(&self) -> bool {
        self.review.is_some()
    }
}

/// Stateless orchestrator over a loaded configuration. Cheap to share.
#[derive(Debug)]
pub struct DecisionEngine {
    config: Arc<EngineConfig>,
    calendar: BusinessCalendar,
}

impl DecisionEngine {
    /// Engine over a validated configuration.
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let calendar = BusinessCalendar::with_holidays(config.sla().holidays.iter().copied());
        Self { config, calendar }
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconcile wire candidates under the configured fields and policy.
    pub fn reconcile(&self, candidates: &[RawFieldCandidate]) -> UnifiedRecord {
        reconcile_raw(candidates, self.config.fields(), self.config.matching())
    }

    /// Classify a record under the configured rule set.
    pub fn classify(&self, record: &UnifiedRecord) -> ClassificationResult {
        classify(record, self.config.rules())
    }

    /// Fresh SLA status for a validated intake, without persistence.
    pub fn evaluate_sla(
        &self,
        file_id: FileId,
        intake_date: NaiveDate,
        days_plazo: u32,
        now: Timestamp,
    ) -> SlaStatus {
        let deadline_date = self.calendar.compute_deadline(intake_date, days_plazo);
        let deadline = Timestamp::at(deadline_date, self.config.sla().cutoff_time);
        compute_status(
            file_id,
            intake_date,
            days_plazo,
            deadline_date,
            deadline,
            now,
            &self.config.sla().thresholds(),
        )
    }

    /// Validate `case` and run reconciliation and classification.
    ///
    /// Invalid identifiers and non-positive terms are rejected before any
    /// stage runs.
    pub fn analyze(&self, case: &DecisionCase) -> Result<Analysis, EngineError> {
        let (file_id, days_plazo) = validate_intake(&case.file_id, case.days_plazo)?;
        let record = self.reconcile(&case.candidates);
        let classification = self.classify(&record);
        tracing::debug!(
            file_id = %file_id,
            agreement_bps = record.agreement_bps(),
            category = %classification.level1,
            confidence = %classification.confidence,
            "case analyzed"
        );
        Ok(Analysis {
            decision_id: DecisionId::new(),
            file_id,
            intake_date: case.intake_date,
            days_plazo,
            record,
            classification,
        })
    }

    /// Join an analysis with its SLA status into the final decision.
    pub fn finish(&self, analysis: Analysis, sla: SlaStatus, now: Timestamp) -> Decision {
        let Analysis {
            decision_id,
            file_id,
            record,
            classification,
            ..
        } = analysis;
        let review = ReviewCase::for_outcome(decision_id, &record, &classification, &sla, now);

        let mut audit = vec![
            AuditEntry::new(
                decision_id,
                file_id.clone(),
                now,
                AuditPayload::reconciled(&record),
            ),
            AuditEntry::new(
                decision_id,
                file_id.clone(),
                now,
                AuditPayload::DocumentClassified {
                    classification: classification.clone(),
                },
            ),
            AuditEntry::new(
                decision_id,
                file_id.clone(),
                now,
                AuditPayload::SlaEvaluated {
                    status: sla.clone(),
                },
            ),
        ];
        if let Some(case) = &review {
            audit.push(AuditEntry::new(
                decision_id,
                file_id.clone(),
                now,
                AuditPayload::ReviewRequested { case: case.clone() },
            ));
        }

        Decision {
            decision_id,
            file_id,
            decided_at: now,
            record,
            classification,
            sla,
            review,
            audit,
        }
    }

    /// Decide `case` at `now` with a previewed, unpersisted SLA status.
    pub fn decide(&self, case: &DecisionCase, now: Timestamp) -> Result<Decision, EngineError> {
        let analysis = self.analyze(case)?;
        let sla = self.evaluate_sla(
            analysis.file_id.clone(),
            analysis.intake_date,
            analysis.days_plazo,
            now,
        );
        Ok(self.finish(analysis, sla, now))
    }
}
