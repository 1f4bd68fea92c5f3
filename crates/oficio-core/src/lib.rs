//! # oficio-core — Foundational Types for the Compliance Engine
//!
//! Every other crate in the workspace depends on `oficio-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `FileId` and `Confidence`
//!    have validated constructors. No bare strings for file identifiers, no
//!    bare integers for confidence scores.
//!
//! 2. **Closed enums.** `SourceKind` (three document renditions) and
//!    `Category` (six legal categories plus `Unknown`) are fixed sets; adding
//!    a variant forces every `match` in the workspace to handle it.
//!
//! 3. **Comparison keys are derived, never stored.** `normalize()` produces
//!    a comparison key for a field value. The original value travels with the
//!    candidate untouched.
//!
//! 4. **`CanonicalBytes` newtype.** Audit digests are computed only over
//!    canonical JSON (sorted keys, no floats) via `sha256_digest()`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `oficio-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod category;
pub mod confidence;
pub mod digest;
pub mod error;
pub mod identity;
pub mod normalize;
pub mod source;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use category::{Category, SubCategory, SCORED_CATEGORY_COUNT};
pub use confidence::Confidence;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{DecisionId, FileId};
pub use normalize::{normalize, FieldKind};
pub use source::{SourceKind, SOURCE_KIND_COUNT};
pub use temporal::Timestamp;
