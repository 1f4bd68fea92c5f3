//! Field candidates and ingestion.
//!
//! Extraction adapters hand over [`RawFieldCandidate`]s with a free-form
//! source tag and an unchecked confidence. [`ingest`] turns them into typed
//! [`FieldCandidate`]s, skipping anything malformed with a logged
//! [`CandidateAnomaly`]. Ingestion never fails as a whole.

use oficio_core::{Confidence, SourceKind};
use serde::{Deserialize, Serialize};

/// One extracted value for one logical field from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCandidate {
    /// Logical field name.
    pub field_name: String,
    /// Extracted value. `None` when the source had no value for the field.
    pub value: Option<String>,
    /// Rendition that produced the value.
    pub source: SourceKind,
    /// Extractor's own confidence in the value.
    pub extraction_confidence: Confidence,
}

impl FieldCandidate {
    /// Convenience constructor for a present value.
    pub fn new(
        field_name: impl Into<String>,
        value: impl Into<String>,
        source: SourceKind,
        extraction_confidence: Confidence,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            value: Some(value.into()),
            source,
            extraction_confidence,
        }
    }

    /// The value if it has any non-whitespace content.
    pub fn present_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// Candidate as emitted on the wire by an extraction adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFieldCandidate {
    /// Logical field name.
    pub field_name: String,
    /// Extracted value.
    #[serde(default)]
    pub value: Option<String>,
    /// Source tag (`structured_markup`, `xml`, `docx`, `ocr`, ...).
    pub source: String,
    /// Unchecked confidence score.
    pub extraction_confidence: i64,
}

/// Why a candidate was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// The source tag names no known rendition.
    UnknownSource,
    /// The field name is not in the field definitions.
    UnknownField,
    /// The confidence is outside 0..=100.
    ConfidenceOutOfRange { value: i64 },
    /// A second candidate for the same (field, source) pair.
    DuplicateCandidate,
}

/// A skipped candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAnomaly {
    /// Field name as received.
    pub field_name: String,
    /// Source tag as received.
    pub source: String,
    /// Reason for skipping.
    #[serde(flatten)]
    pub kind: AnomalyKind,
}

impl CandidateAnomaly {
    pub(crate) fn new(field_name: &str, source: &str, kind: AnomalyKind) -> Self {
        tracing::warn!(
            field = field_name,
            source = source,
            anomaly = ?kind,
            "skipping field candidate"
        );
        Self {
            field_name: field_name.to_string(),
            source: source.to_string(),
            kind,
        }
    }
}

/// Result of [`ingest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
    /// Well-formed candidates in input order.
    pub candidates: Vec<FieldCandidate>,
    /// Candidates skipped because of a malformed source tag or confidence.
    pub anomalies: Vec<CandidateAnomaly>,
}

/// Convert wire candidates to typed candidates.
///
/// Field-name and duplicate screening happens in reconciliation, where the
/// field definitions are known; this step only checks what can be checked
/// per candidate.
pub fn ingest(raw: &[RawFieldCandidate]) -> Ingested {
    let mut out = Ingested::default();
    for r in raw {
        let source = match r.source.parse::<SourceKind>() {
            Ok(s) => s,
            Err(_) => {
                out.anomalies.push(CandidateAnomaly::new(
                    &r.field_name,
                    &r.source,
                    AnomalyKind::UnknownSource,
                ));
                continue;
            }
        };
        let confidence = match Confidence::new(r.extraction_confidence, &r.field_name) {
            Ok(c) => c,
            Err(_) => {
                out.anomalies.push(CandidateAnomaly::new(
                    &r.field_name,
                    &r.source,
                    AnomalyKind::ConfidenceOutOfRange {
                        value: r.extraction_confidence,
                    },
                ));
                continue;
            }
        };
        out.candidates.push(FieldCandidate {
            field_name: r.field_name.clone(),
            value: r.value.clone(),
            source,
            extraction_confidence: confidence,
        });
    }
    out
}
