//! The unified record and its per-field results.

use oficio_core::{Confidence, FieldKind, SourceKind};
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateAnomaly;

/// One source's contribution to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceValue {
    /// Rendition that produced the value.
    pub source: SourceKind,
    /// Value as extracted, untouched by normalization.
    pub value: Option<String>,
    /// Extractor's confidence.
    pub extraction_confidence: Confidence,
}

/// Reconciliation outcome for one logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatchResult {
    /// Logical field name.
    pub field_name: String,
    /// Comparison semantics the field was reconciled under.
    pub kind: FieldKind,
    /// Chosen value, `None` when missing.
    pub unified_value: Option<String>,
    /// Every candidate seen for the field, most trusted source first.
    pub sources: Vec<SourceValue>,
    /// Final confidence after agreement bonus or conflict penalty.
    pub confidence: Confidence,
    /// Present sources disagreed after normalization.
    pub conflict: bool,
    /// No source produced a value.
    pub missing: bool,
    /// Source of `unified_value`. `None` only when `missing`.
    pub origin: Option<SourceKind>,
    /// Whether the field counts toward agreement and review.
    pub required: bool,
}

impl FieldMatchResult {
    /// Whether the field takes part in agreement and confidence checks.
    /// Optional fields only count when some source produced them.
    pub fn counted(&self) -> bool {
        self.required || !self.missing
    }
}

/// Reason a record needs human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum ReviewFlag {
    /// Overall agreement below the policy minimum. Ratios are basis points.
    LowAgreement { agreement_bps: u32, minimum_bps: u32 },
    /// A present field scored below the high-confidence threshold.
    LowConfidence { field: String, confidence: Confidence },
    /// Sources disagreed on a field.
    FieldConflict { field: String },
    /// A required field had no value from any source.
    MissingField { field: String },
}

impl ReviewFlag {
    /// Snake_case name of the flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowAgreement { .. } => "low_agreement",
            Self::LowConfidence { .. } => "low_confidence",
            Self::FieldConflict { .. } => "field_conflict",
            Self::MissingField { .. } => "missing_field",
        }
    }
}

impl std::fmt::Display for ReviewFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowAgreement {
                agreement_bps,
                minimum_bps,
            } => write!(
                f,
                "agreement {agreement_bps} bps below minimum {minimum_bps} bps"
            ),
            Self::LowConfidence { field, confidence } => {
                write!(f, "field {field} has low confidence {confidence}")
            }
            Self::FieldConflict { field } => write!(f, "sources disagree on field {field}"),
            Self::MissingField { field } => write!(f, "required field {field} is missing"),
        }
    }
}

/// Immutable snapshot of a reconciled oficio. Superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    /// Per-field results in field-definition order.
    pub fields: Vec<FieldMatchResult>,
    /// Share of counted fields that are present and conflict-free.
    pub overall_agreement: f64,
    /// Names of fields with a conflict, in field order.
    pub conflicting_fields: Vec<String>,
    /// Names of counted fields with no value, in field order. An optional
    /// field nobody produced is marked missing on its own result only.
    pub missing_fields: Vec<String>,
    /// Review reasons, empty when the record can proceed unattended.
    pub review_flags: Vec<ReviewFlag>,
    /// Candidates skipped during reconciliation.
    pub anomalies: Vec<CandidateAnomaly>,
}

impl UnifiedRecord {
    /// Result for `name`, if defined.
    pub fn field(&self, name: &str) -> Option<&FieldMatchResult> {
        self.fields.iter().find(|f| f.field_name == name)
    }

    /// Unified value of `name`, if defined and present.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(|f| f.unified_value.as_deref())
    }

    /// Overall agreement in basis points (0..=10000).
    pub fn agreement_bps(&self) -> u32 {
        ratio_to_bps(self.overall_agreement)
    }

    /// Whether any review flag is set.
    pub fn needs_review(&self) -> bool {
        !self.review_flags.is_empty()
    }
}

pub(crate) fn ratio_to_bps(ratio: f64) -> u32 {
    (ratio.clamp(0.0, 1.0) * 10_000.0).round() as u32
}
