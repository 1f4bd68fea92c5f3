//! # oficio-reconcile — Field Reconciliation
//!
//! Merges the field candidates extracted from each rendition of an oficio
//! (structured markup, office document, OCR'd scan) into one
//! [`UnifiedRecord`] with per-field provenance and confidence.
//!
//! ## Rules
//!
//! For each defined field, in definition order:
//!
//! - no present value: `missing`, confidence 0, no origin;
//! - one present value: taken as is, with its extraction confidence;
//! - several values that agree after normalization: the most trusted
//!   source's value, with the best extraction confidence plus an agreement
//!   bonus proportional to the number of agreeing sources;
//! - disagreeing values: the most trusted source's value, flagged as a
//!   conflict, with that source's confidence minus the conflict penalty.
//!
//! Trust order is the field's effective priority from the
//! [`MatchingPolicy`](oficio_policy::MatchingPolicy); ties fall to the higher
//! extraction confidence and then to [`SourceKind`](oficio_core::SourceKind)
//! order.
//!
//! The engine never blocks on bad data. Low agreement, low confidence,
//! conflicts and missing required fields become [`ReviewFlag`]s; malformed
//! candidates become [`CandidateAnomaly`] entries.

pub mod candidate;
pub mod engine;
pub mod record;

pub use candidate::{ingest, AnomalyKind, CandidateAnomaly, FieldCandidate, Ingested, RawFieldCandidate};
pub use engine::{reconcile, reconcile_raw};
pub use record::{FieldMatchResult, ReviewFlag, SourceValue, UnifiedRecord};
