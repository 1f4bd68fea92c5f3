//! # oficio-classify — Compliance Classification
//!
//! Scores a [`UnifiedRecord`](oficio_reconcile::UnifiedRecord) against the
//! configured [`RuleSet`](oficio_policy::RuleSet) to produce a level-one
//! [`Category`](oficio_core::Category), an optional authority
//! [`SubCategory`](oficio_core::SubCategory), and a confidence.
//!
//! Classification is pure and idempotent. Low-confidence outcomes are a
//! first-class `unknown` result carrying the distance to the acceptance
//! threshold, never an error.

pub mod classifier;
pub mod signals;

pub use classifier::{classify, ClassificationResult};
pub use signals::{contains_any, evaluate};
