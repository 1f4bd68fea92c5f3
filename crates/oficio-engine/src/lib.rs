//! # oficio-engine — Decision Orchestrator
//!
//! Sequences the three stages of an oficio decision and packages the result
//! for downstream review and export collaborators.
//!
//! ## Design
//!
//! - [`DecisionEngine`] is stateless: reconciliation, then classification
//!   and SLA evaluation, each depending only on the reconciled record or the
//!   intake metadata. [`DecisionEngine::decide`] touches no shared state.
//! - [`DecisionService`] adds the collaborators: a persistent
//!   [`SlaTracker`](oficio_sla::SlaTracker), a [`ReviewQueue`] for
//!   ambiguous outcomes, and an [`AuditSink`] for content-addressed
//!   [`AuditEntry`] payloads. Batches run the pure stages on the blocking
//!   pool and return results in input order.
//! - Ambiguity is a result, not an error. Low agreement, conflicting or
//!   low-confidence fields, and sub-threshold classifications produce a
//!   [`ReviewCase`] next to a complete [`Decision`].
//!
//! ## Crate Policy
//!
//! - The engine emits audit payloads; persistence belongs to the sink.
//! - No `.unwrap()` outside tests.

pub mod audit;
pub mod case;
pub mod decision;
pub mod error;
pub mod review;
pub mod service;

pub use audit::{AuditEntry, AuditEntryType, AuditPayload, AuditSink, AuditTrail, TracingAuditSink};
pub use case::DecisionCase;
pub use decision::{Analysis, Decision, DecisionEngine};
pub use error::EngineError;
pub use review::{ReviewCase, ReviewQueue, ReviewReason};
pub use service::DecisionService;
