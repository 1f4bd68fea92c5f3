//! Shared fixtures for the cross-crate tests.

use chrono::NaiveDate;
use oficio_core::Timestamp;
use oficio_engine::DecisionCase;
use oficio_policy::EngineConfig;
use oficio_reconcile::RawFieldCandidate;

/// The configuration packaged with `oficio-policy`.
pub fn builtin_config() -> EngineConfig {
    match EngineConfig::builtin() {
        Ok(config) => config,
        Err(e) => panic!("built-in configuration must load: {e}"),
    }
}

/// A wire candidate.
pub fn candidate(field: &str, value: &str, source: &str, confidence: i64) -> RawFieldCandidate {
    RawFieldCandidate {
        field_name: field.into(),
        value: Some(value.into()),
        source: source.into(),
        extraction_confidence: confidence,
    }
}

/// Parse an ISO-8601 UTC instant.
pub fn at(s: &str) -> Timestamp {
    match Timestamp::parse(s) {
        Ok(ts) => ts,
        Err(e) => panic!("bad fixture timestamp {s}: {e}"),
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn date(s: &str) -> NaiveDate {
    match s.parse() {
        Ok(d) => d,
        Err(e) => panic!("bad fixture date {s}: {e}"),
    }
}

/// Every required field, agreed on by the markup and office renditions.
pub fn complete_candidates(asunto: &str, autoridad: &str) -> Vec<RawFieldCandidate> {
    let values = [
        ("numero_oficio", "214-SAT-2025/0042"),
        ("expediente", "EXP/0042/2025"),
        ("fecha_oficio", "14/01/2025"),
        ("autoridad", autoridad),
        ("asunto", asunto),
        ("nombre_titular", "Juan Pérez"),
        ("rfc", "PEPJ800101AB1"),
    ];
    let mut out = Vec::new();
    for source in ["structured_markup", "office_document"] {
        for (field, value) in values {
            out.push(candidate(field, value, source, 90));
        }
    }
    out
}

/// A case received on 2025-01-15 with a five-business-day term.
pub fn case(file_id: &str, candidates: Vec<RawFieldCandidate>) -> DecisionCase {
    DecisionCase {
        file_id: file_id.into(),
        intake_date: date("2025-01-15"),
        days_plazo: 5,
        candidates,
    }
}
