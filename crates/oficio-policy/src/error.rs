//! Configuration error types.
//!
//! Every variant names the offending key, field, signal or category so an
//! operator can fix the file without reading code. Configuration errors are
//! fatal at process start.

use std::path::PathBuf;

use oficio_core::{Category, SourceKind};
use thiserror::Error;

/// Errors raised while loading or validating engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// I/O error other than not-found.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No field definitions were supplied.
    #[error("at least one field definition is required")]
    NoFields,

    /// A field definition with an empty name.
    #[error("field definition #{index} has an empty name")]
    EmptyFieldName { index: usize },

    /// Two field definitions share a name.
    #[error("duplicate field definition {name:?}")]
    DuplicateField { name: String },

    /// A section references a field that is not defined.
    #[error("{context} references undefined field {field:?}")]
    UndefinedField { context: String, field: String },

    /// The default source priority does not list every source exactly once.
    #[error("matching.source_priority must list every source exactly once: {detail}")]
    IncompletePriority { detail: String },

    /// A per-field override lists a source twice or is empty.
    #[error("matching.per_field_overrides.{field}: {detail}")]
    InvalidOverride { field: String, detail: String },

    /// A ratio outside 0.0..=1.0.
    #[error("{key} must be within 0.0..=1.0, got {value}")]
    RatioOutOfRange { key: &'static str, value: f64 },

    /// An integer score outside 0..=100.
    #[error("{key} must be within 0..=100, got {value}")]
    ScoreOutOfRange { key: String, value: u32 },

    /// A scored category without a rule.
    #[error("rules.categories has no rule for category {category}")]
    MissingCategoryRule { category: Category },

    /// A rule for `unknown`, which is never scored.
    #[error("rules.categories must not define a rule for {category}")]
    UnscoredCategoryRule { category: Category },

    /// A category rule references an undefined signal.
    #[error("rule for {category} references undefined signal {signal:?}")]
    UndefinedSignal { category: Category, signal: String },

    /// A signal definition is unusable.
    #[error("signal {signal:?}: {detail}")]
    InvalidSignal { signal: String, detail: String },

    /// A weighted signal with zero weight.
    #[error("rule for {category} gives signal {signal:?} zero weight")]
    ZeroWeight { category: Category, signal: String },

    /// The tie-break list is not a permutation of the scored categories.
    #[error("rules.tie_break must list every scored category exactly once: {detail}")]
    InvalidTieBreak { detail: String },

    /// Subcategory rules reference a category that is not subdivided.
    #[error("rules.subcategories: {category} does not admit subcategories")]
    NotSubdivided { category: Category },

    /// SLA thresholds or timings are inconsistent.
    #[error("sla.{key}: {detail}")]
    InvalidSla { key: &'static str, detail: String },
}

impl ConfigError {
    pub(crate) fn missing_sources(present: &[SourceKind]) -> Self {
        let missing: Vec<&str> = SourceKind::all()
            .iter()
            .filter(|s| !present.contains(s))
            .map(SourceKind::as_str)
            .collect();
        Self::IncompletePriority {
            detail: format!("missing {}", missing.join(", ")),
        }
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
