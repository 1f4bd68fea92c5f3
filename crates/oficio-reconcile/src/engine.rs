//! Reconciliation engine.
//!
//! [`reconcile`] is a pure function of its inputs: the same candidates,
//! field definitions and policy always produce the same record, in the same
//! order, regardless of candidate input order.

use std::collections::HashSet;

use oficio_core::{normalize, Confidence, SourceKind};
use oficio_policy::{FieldSpec, FieldSpecSet, MatchingPolicy};

use crate::candidate::{ingest, AnomalyKind, CandidateAnomaly, FieldCandidate, RawFieldCandidate};
use crate::record::{ratio_to_bps, FieldMatchResult, ReviewFlag, SourceValue, UnifiedRecord};

/// Merge candidates into a unified record.
///
/// Candidates for undefined fields and repeated (field, source) pairs are
/// skipped with an anomaly; the first candidate for a pair wins.
pub fn reconcile(
    candidates: &[FieldCandidate],
    fields: &FieldSpecSet,
    policy: &MatchingPolicy,
) -> UnifiedRecord {
    let (accepted, anomalies) = screen(candidates, fields);
    build_record(&accepted, fields, policy, anomalies)
}

/// [`ingest`] followed by [`reconcile`]. Anomalies from both steps are kept.
pub fn reconcile_raw(
    raw: &[RawFieldCandidate],
    fields: &FieldSpecSet,
    policy: &MatchingPolicy,
) -> UnifiedRecord {
    let ingested = ingest(raw);
    let (accepted, screened) = screen(&ingested.candidates, fields);
    let mut anomalies = ingested.anomalies;
    anomalies.extend(screened);
    build_record(&accepted, fields, policy, anomalies)
}

fn screen<'a>(
    candidates: &'a [FieldCandidate],
    fields: &FieldSpecSet,
) -> (Vec<&'a FieldCandidate>, Vec<CandidateAnomaly>) {
    let mut seen: HashSet<(&str, SourceKind)> = HashSet::new();
    let mut accepted = Vec::with_capacity(candidates.len());
    let mut anomalies = Vec::new();
    for c in candidates {
        if !fields.contains(&c.field_name) {
            anomalies.push(CandidateAnomaly::new(
                &c.field_name,
                c.source.as_str(),
                AnomalyKind::UnknownField,
            ));
            continue;
        }
        if !seen.insert((c.field_name.as_str(), c.source)) {
            anomalies.push(CandidateAnomaly::new(
                &c.field_name,
                c.source.as_str(),
                AnomalyKind::DuplicateCandidate,
            ));
            continue;
        }
        accepted.push(c);
    }
    (accepted, anomalies)
}

fn build_record(
    accepted: &[&FieldCandidate],
    fields: &FieldSpecSet,
    policy: &MatchingPolicy,
    anomalies: Vec<CandidateAnomaly>,
) -> UnifiedRecord {
    let results: Vec<FieldMatchResult> = fields
        .iter()
        .map(|spec| {
            let mut for_field: Vec<&FieldCandidate> = accepted
                .iter()
                .copied()
                .filter(|c| c.field_name == spec.name)
                .collect();
            for_field.sort_by_key(|c| {
                (
                    policy.rank(&spec.name, c.source),
                    std::cmp::Reverse(c.extraction_confidence),
                    c.source,
                )
            });
            match_field(spec, &for_field, policy)
        })
        .collect();

    let counted: Vec<&FieldMatchResult> = results.iter().filter(|r| r.counted()).collect();
    let agreeing = counted
        .iter()
        .filter(|r| !r.conflict && !r.missing)
        .count();
    let overall_agreement = if counted.is_empty() {
        0.0
    } else {
        agreeing as f64 / counted.len() as f64
    };

    let conflicting_fields = results
        .iter()
        .filter(|r| r.conflict)
        .map(|r| r.field_name.clone())
        .collect();
    let missing_fields = results
        .iter()
        .filter(|r| r.missing && r.counted())
        .map(|r| r.field_name.clone())
        .collect();
    let review_flags = review_flags(&results, overall_agreement, policy);

    UnifiedRecord {
        fields: results,
        overall_agreement,
        conflicting_fields,
        missing_fields,
        review_flags,
        anomalies,
    }
}

/// Reconcile one field from its candidates, already in trust order.
fn match_field(
    spec: &FieldSpec,
    ordered: &[&FieldCandidate],
    policy: &MatchingPolicy,
) -> FieldMatchResult {
    let sources: Vec<SourceValue> = ordered
        .iter()
        .map(|c| SourceValue {
            source: c.source,
            value: c.value.clone(),
            extraction_confidence: c.extraction_confidence,
        })
        .collect();
    let present: Vec<(&FieldCandidate, &str)> = ordered
        .iter()
        .filter_map(|c| c.present_value().map(|v| (*c, v)))
        .collect();

    let (chosen, value) = match present.first() {
        Some(first) => *first,
        None => {
            tracing::debug!(field = %spec.name, "no source produced a value");
            return FieldMatchResult {
                field_name: spec.name.clone(),
                kind: spec.kind,
                unified_value: None,
                sources,
                confidence: Confidence::ZERO,
                conflict: false,
                missing: true,
                origin: None,
                required: spec.required,
            };
        }
    };

    let (confidence, conflict) = if present.len() == 1 {
        (chosen.extraction_confidence, false)
    } else {
        let key = normalize(value, spec.kind);
        let all_agree = present[1..]
            .iter()
            .all(|(_, v)| normalize(v, spec.kind) == key);
        if all_agree {
            let best = present
                .iter()
                .map(|(c, _)| c.extraction_confidence)
                .max()
                .unwrap_or(chosen.extraction_confidence);
            let bonus = policy.agreement_bonus(present.len());
            (best.saturating_add(bonus), false)
        } else {
            tracing::debug!(
                field = %spec.name,
                origin = %chosen.source,
                sources = present.len(),
                "sources disagree"
            );
            (
                chosen
                    .extraction_confidence
                    .saturating_sub(policy.conflict_penalty()),
                true,
            )
        }
    };

    FieldMatchResult {
        field_name: spec.name.clone(),
        kind: spec.kind,
        unified_value: Some(value.to_string()),
        sources,
        confidence,
        conflict,
        missing: false,
        origin: Some(chosen.source),
        required: spec.required,
    }
}

fn review_flags(
    results: &[FieldMatchResult],
    overall_agreement: f64,
    policy: &MatchingPolicy,
) -> Vec<ReviewFlag> {
    let mut flags = Vec::new();
    if overall_agreement < policy.min_agreement_ratio() {
        flags.push(ReviewFlag::LowAgreement {
            agreement_bps: ratio_to_bps(overall_agreement),
            minimum_bps: ratio_to_bps(policy.min_agreement_ratio()),
        });
    }
    let threshold = policy.high_confidence();
    for r in results.iter().filter(|r| r.counted()) {
        if r.missing {
            flags.push(ReviewFlag::MissingField {
                field: r.field_name.clone(),
            });
            continue;
        }
        if r.conflict {
            flags.push(ReviewFlag::FieldConflict {
                field: r.field_name.clone(),
            });
        }
        if r.confidence < threshold {
            flags.push(ReviewFlag::LowConfidence {
                field: r.field_name.clone(),
                confidence: r.confidence,
            });
        }
    }
    flags
}
