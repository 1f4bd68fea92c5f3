//! Decision service: the orchestrator wired to its collaborators.
//!
//! On top of [`DecisionEngine`], the service opens (or refreshes) the file's
//! SLA clock in the shared tracker, hands review cases to the review queue,
//! forwards audit entries to the configured sink, and counts decisions.

use std::sync::Arc;

use oficio_core::Timestamp;
use oficio_sla::SlaTracker;
use tokio::task::JoinSet;

use crate::audit::{AuditSink, TracingAuditSink};
use crate::case::DecisionCase;
use crate::decision::{Analysis, Decision, DecisionEngine};
use crate::error::EngineError;
use crate::review::ReviewQueue;

/// Orchestrator with persistent SLA tracking. Cheap to clone.
#[derive(Clone)]
pub struct DecisionService {
    engine: Arc<DecisionEngine>,
    tracker: SlaTracker,
    review: Option<ReviewQueue>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for DecisionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionService")
            .field("tracker", &self.tracker)
            .field("review_queue", &self.review.is_some())
            .finish_non_exhaustive()
    }
}

impl DecisionService {
    /// Service logging audit entries through `tracing` and keeping review
    /// cases on the returned decisions only.
    pub fn new(engine: Arc<DecisionEngine>, tracker: SlaTracker) -> Self {
        Self {
            engine,
            tracker,
            review: None,
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Deliver review cases to `queue`.
    pub fn with_review_queue(mut self, queue: ReviewQueue) -> Self {
        self.review = Some(queue);
        self
    }

    /// Send audit entries to `sink`.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<DecisionEngine> {
        &self.engine
    }

    /// The SLA tracker.
    pub fn tracker(&self) -> &SlaTracker {
        &self.tracker
    }

    /// Decide one case on the calling thread.
    pub fn decide(&self, case: &DecisionCase, now: Timestamp) -> Result<Decision, EngineError> {
        let analysis = self.engine.analyze(case)?;
        self.complete(analysis, now)
    }

    /// Decide many cases. Reconciliation and classification run on the
    /// blocking pool; SLA writes and hand-offs follow in input order.
    ///
    /// The output has one result per input case, in input order. A failed
    /// case does not affect the others.
    pub async fn decide_batch(
        &self,
        cases: Vec<DecisionCase>,
        now: Timestamp,
    ) -> Vec<Result<Decision, EngineError>> {
        let total = cases.len();
        let mut workers = JoinSet::new();
        for (index, case) in cases.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            workers.spawn_blocking(move || (index, engine.analyze(&case)));
        }

        let mut analyses: Vec<Option<Result<Analysis, EngineError>>> =
            (0..total).map(|_| None).collect();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, result)) => analyses[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "batch analysis worker failed"),
            }
        }

        analyses
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Some(Ok(analysis)) => self.complete(analysis, now),
                Some(Err(e)) => Err(e),
                None => Err(EngineError::WorkerLost { index }),
            })
            .collect()
    }

    /// Open the SLA clock, assemble the decision, hand off the review case
    /// and only then record audit entries. A refused hand-off records nothing.
    fn complete(&self, analysis: Analysis, now: Timestamp) -> Result<Decision, EngineError> {
        if let Some(queue) = &self.review {
            if analysis.needs_review() && queue.is_closed() {
                return Err(EngineError::ReviewQueueClosed {
                    file_id: analysis.file_id,
                });
            }
        }
        let sla = self.tracker.open(
            analysis.file_id.as_str(),
            analysis.intake_date,
            i64::from(analysis.days_plazo),
            now,
        )?;
        let decision = self.engine.finish(analysis, sla, now);

        if let Some(case) = &decision.review {
            if let Some(queue) = &self.review {
                if let Err(e) = queue.submit(case.clone()) {
                    tracing::warn!(
                        file_id = %decision.file_id,
                        decision_id = %decision.decision_id,
                        "review hand-off refused, decision not recorded"
                    );
                    return Err(e);
                }
            }
            metrics::counter!("oficio_review_cases_total").increment(1);
        }
        for entry in &decision.audit {
            self.audit.record(entry);
        }
        metrics::counter!(
            "oficio_decisions_total",
            "category" => decision.classification.level1.as_str()
        )
        .increment(1);
        tracing::info!(
            file_id = %decision.file_id,
            decision_id = %decision.decision_id,
            category = %decision.classification.level1,
            review = decision.needs_review(),
            level = %decision.sla.escalation_level,
            "decision completed"
        );
        Ok(decision)
    }
}
