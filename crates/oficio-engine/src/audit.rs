//! # Audit Payloads
//!
//! Every decision emits one [`AuditEntry`] per produced result: the
//! reconciled record, the classification, the SLA evaluation, and the
//! review case when one is raised. Entries are content-addressed through
//! [`CanonicalBytes`] and SHA-256 so a persistence collaborator can store
//! them immutably and detect tampering.
//!
//! Canonicalization rejects floats, so the record's agreement ratio is
//! carried as basis points.
//!
//! The engine does not persist entries. It hands them to an [`AuditSink`];
//! [`AuditTrail`] keeps a bounded in-memory buffer and [`TracingAuditSink`]
//! logs each entry with its digest.

use oficio_classify::ClassificationResult;
use oficio_core::{sha256_digest, CanonicalBytes, ContentDigest, DecisionId, FileId, Timestamp};
use oficio_reconcile::{CandidateAnomaly, FieldMatchResult, ReviewFlag, UnifiedRecord};
use oficio_sla::SlaStatus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::review::ReviewCase;

// ─── Entry Types ────────────────────────────────────────────────────────

/// The kind of result an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntryType {
    /// Field candidates merged into a unified record.
    RecordReconciled,
    /// The record was classified.
    DocumentClassified,
    /// The SLA clock was evaluated or opened.
    SlaEvaluated,
    /// The decision was routed to manual review.
    ReviewRequested,
}

impl AuditEntryType {
    /// Return the string representation of this entry type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordReconciled => "record_reconciled",
            Self::DocumentClassified => "document_classified",
            Self::SlaEvaluated => "sla_evaluated",
            Self::ReviewRequested => "review_requested",
        }
    }
}

impl std::fmt::Display for AuditEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Payloads ───────────────────────────────────────────────────────────

/// Result-specific body of an audit entry. Float-free by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditPayload {
    /// Reconciliation outcome with full provenance.
    RecordReconciled {
        /// Overall agreement in basis points.
        agreement_bps: u32,
        /// Per-field results, every source value included.
        fields: Vec<FieldMatchResult>,
        /// Fields whose sources disagreed.
        conflicting_fields: Vec<String>,
        /// Fields no source produced.
        missing_fields: Vec<String>,
        /// Reconciliation review flags.
        review_flags: Vec<ReviewFlag>,
        /// Skipped candidates.
        anomalies: Vec<CandidateAnomaly>,
    },
    /// Classification outcome with every category score.
    DocumentClassified {
        /// The full result.
        classification: ClassificationResult,
    },
    /// SLA status as persisted or previewed.
    SlaEvaluated {
        /// The status snapshot.
        status: SlaStatus,
    },
    /// The review case handed to the collaborator.
    ReviewRequested {
        /// The case.
        case: ReviewCase,
    },
}

impl AuditPayload {
    /// Payload for a reconciled record.
    pub fn reconciled(record: &UnifiedRecord) -> Self {
        Self::RecordReconciled {
            agreement_bps: record.agreement_bps(),
            fields: record.fields.clone(),
            conflicting_fields: record.conflicting_fields.clone(),
            missing_fields: record.missing_fields.clone(),
            review_flags: record.review_flags.clone(),
            anomalies: record.anomalies.clone(),
        }
    }

    /// The entry type this payload records.
    pub fn entry_type(&self) -> AuditEntryType {
        match self {
            Self::RecordReconciled { .. } => AuditEntryType::RecordReconciled,
            Self::DocumentClassified { .. } => AuditEntryType::DocumentClassified,
            Self::SlaEvaluated { .. } => AuditEntryType::SlaEvaluated,
            Self::ReviewRequested { .. } => AuditEntryType::ReviewRequested,
        }
    }
}

// ─── Audit Entry ────────────────────────────────────────────────────────

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The decision run that produced the result.
    pub decision_id: DecisionId,
    /// The file the result belongs to.
    pub file_id: FileId,
    /// When the result was produced.
    pub timestamp: Timestamp,
    /// The result itself.
    pub payload: AuditPayload,
}

impl AuditEntry {
    /// Create a new audit entry.
    pub fn new(
        decision_id: DecisionId,
        file_id: FileId,
        timestamp: Timestamp,
        payload: AuditPayload,
    ) -> Self {
        Self {
            decision_id,
            file_id,
            timestamp,
            payload,
        }
    }

    /// The kind of result recorded.
    pub fn entry_type(&self) -> AuditEntryType {
        self.payload.entry_type()
    }

    /// Canonical bytes of the whole entry.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, oficio_core::CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    /// Compute the content digest of this entry.
    ///
    /// Returns `None` and logs a warning if canonicalization fails. Entries
    /// built from engine results never contain floats, so a failure points
    /// at a corrupted payload.
    pub fn digest(&self) -> Option<ContentDigest> {
        match self.canonical_bytes() {
            Ok(canonical) => Some(sha256_digest(&canonical)),
            Err(e) => {
                tracing::warn!(
                    entry_type = %self.entry_type(),
                    file_id = %self.file_id,
                    error = %e,
                    "audit entry canonicalization failed; digest unavailable"
                );
                None
            }
        }
    }
}

// ─── Sinks ──────────────────────────────────────────────────────────────

/// Receiver of audit entries. Implementations own persistence.
pub trait AuditSink: Send + Sync {
    /// Record one entry. Must not block on slow I/O.
    fn record(&self, entry: &AuditEntry);
}

/// Logs every entry at `info` with its digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: &AuditEntry) {
        let digest = entry
            .digest()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unavailable".to_string());
        tracing::info!(
            entry_type = %entry.entry_type(),
            file_id = %entry.file_id,
            decision_id = %entry.decision_id,
            digest = %digest,
            "audit entry"
        );
    }
}

/// Bounded in-memory audit buffer.
///
/// When capacity is exceeded the oldest 10% of entries are dropped.
pub struct AuditTrail {
    entries: Mutex<Vec<AuditEntry>>,
    max_entries: usize,
}

impl AuditTrail {
    /// Create a trail holding at most `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Append an entry, trimming the oldest when full.
    pub fn append(&self, entry: AuditEntry) {
        let mut entries = self.entries.lock();
        entries.push(entry);
        if entries.len() > self.max_entries {
            let trim_count = (self.max_entries / 10).max(1);
            entries.drain(..trim_count);
        }
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Entries recorded for `file_id`.
    pub fn entries_for_file(&self, file_id: &FileId) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| &e.file_id == file_id)
            .cloned()
            .collect()
    }

    /// Entries of one type.
    pub fn entries_by_type(&self, entry_type: AuditEntryType) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.entry_type() == entry_type)
            .cloned()
            .collect()
    }

    /// `(index, digest)` for every entry that canonicalizes.
    pub fn compute_digests(&self) -> Vec<(usize, ContentDigest)> {
        self.entries
            .lock()
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.digest().map(|d| (i, d)))
            .collect()
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl AuditSink for AuditTrail {
    fn record(&self, entry: &AuditEntry) {
        self.append(entry.clone());
    }
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail")
            .field("entries", &self.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use oficio_core::{Confidence, FieldKind, SourceKind};
    use oficio_reconcile::SourceValue;

    use super::*;

    fn record() -> UnifiedRecord {
        UnifiedRecord {
            fields: vec![FieldMatchResult {
                field_name: "nombre_titular".into(),
                kind: FieldKind::Text,
                unified_value: Some("Juan Pérez".into()),
                sources: vec![SourceValue {
                    source: SourceKind::StructuredMarkup,
                    value: Some("Juan Pérez".into()),
                    extraction_confidence: Confidence::clamped(95),
                }],
                confidence: Confidence::clamped(95),
                conflict: false,
                missing: false,
                origin: Some(SourceKind::StructuredMarkup),
                required: true,
            }],
            overall_agreement: 2.0 / 3.0,
            conflicting_fields: Vec::new(),
            missing_fields: Vec::new(),
            review_flags: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    fn entry(file: &str) -> AuditEntry {
        AuditEntry::new(
            DecisionId::new(),
            FileId::new(file).unwrap(),
            Timestamp::parse("2025-01-15T10:00:00Z").unwrap(),
            AuditPayload::reconciled(&record()),
        )
    }

    #[test]
    fn ratio_is_carried_in_basis_points() {
        let e = entry("OF-1");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["payload"]["type"], "record_reconciled");
        assert_eq!(json["payload"]["agreement_bps"], 6667);
    }

    #[test]
    fn digest_is_stable_for_identical_entries() {
        let e = entry("OF-1");
        let again = e.clone();
        let d1 = e.digest().unwrap();
        let d2 = again.digest().unwrap();
        assert_eq!(d1, d2);
        assert!(d1.to_string().starts_with("sha256:"));
    }

    #[test]
    fn digest_changes_with_content() {
        let e = entry("OF-1");
        let mut other = e.clone();
        other.file_id = FileId::new("OF-2").unwrap();
        assert_ne!(e.digest().unwrap(), other.digest().unwrap());
    }

    #[test]
    fn entry_type_follows_payload() {
        assert_eq!(entry("OF-1").entry_type(), AuditEntryType::RecordReconciled);
        assert_eq!(AuditEntryType::SlaEvaluated.to_string(), "sla_evaluated");
    }

    #[test]
    fn trail_trims_oldest() {
        let trail = AuditTrail::new(10);
        for i in 0..11 {
            trail.append(entry(&format!("OF-{i}")));
        }
        assert_eq!(trail.len(), 10);
        let first = &trail.entries()[0];
        assert_eq!(first.file_id.as_str(), "OF-1");
    }

    #[test]
    fn trail_filters() {
        let trail = AuditTrail::default();
        trail.record(&entry("OF-1"));
        trail.record(&entry("OF-2"));
        trail.record(&entry("OF-1"));
        let id = FileId::new("OF-1").unwrap();
        assert_eq!(trail.entries_for_file(&id).len(), 2);
        assert_eq!(
            trail.entries_by_type(AuditEntryType::RecordReconciled).len(),
            3
        );
        assert!(trail.entries_by_type(AuditEntryType::ReviewRequested).is_empty());
        assert_eq!(trail.compute_digests().len(), 3);
    }
}
