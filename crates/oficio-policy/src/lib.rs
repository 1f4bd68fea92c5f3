//! # oficio-policy — Engine Configuration
//!
//! Everything the engine is told rather than computes: which fields exist
//! and how to compare them, which sources to trust, how categories are
//! scored, and when deadlines escalate.
//!
//! ## Design
//!
//! Configuration is loaded once at process start from a single YAML document
//! and validated as a whole. Any inconsistency (a duplicate field, a category
//! without a rule, a tie-break list that skips a category) is a
//! [`ConfigError`] at load time, never a runtime surprise. The validated
//! structs are immutable and shared by reference.

pub mod config;
pub mod error;
pub mod fields;
pub mod matching;
pub mod rules;
pub mod sla;

pub use config::{EngineConfig, BUILTIN_CONFIG};
pub use error::{ConfigError, ConfigResult};
pub use fields::{FieldSpec, FieldSpecSet};
pub use matching::MatchingPolicy;
pub use rules::{default_tie_break, RuleSet, SignalSpec, SubcategoryRules, WeightedSignal};
pub use sla::{EscalationThresholds, SlaPolicy};
