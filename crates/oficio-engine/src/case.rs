//! Input to one decision.

use chrono::NaiveDate;
use oficio_reconcile::RawFieldCandidate;
use serde::{Deserialize, Serialize};

/// Everything the engine needs to decide one oficio.
///
/// Fields are unchecked; [`DecisionEngine::analyze`] validates them before
/// any stage runs.
///
/// [`DecisionEngine::analyze`]: crate::decision::DecisionEngine::analyze
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionCase {
    /// File identifier.
    pub file_id: String,
    /// Date the oficio was received.
    pub intake_date: NaiveDate,
    /// Business days granted by the authority.
    pub days_plazo: i64,
    /// Extracted field candidates from every rendition.
    #[serde(default)]
    pub candidates: Vec<RawFieldCandidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_form() {
        let json = r#"{
            "file_id": "OF-2025-0001",
            "intake_date": "2025-01-15",
            "days_plazo": 5,
            "candidates": [
                {"field_name": "rfc", "value": "PEJJ800101AB1", "source": "xml", "extraction_confidence": 97}
            ]
        }"#;
        let case: DecisionCase = serde_json::from_str(json).unwrap();
        assert_eq!(case.file_id, "OF-2025-0001");
        assert_eq!(case.intake_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(case.candidates.len(), 1);
        assert_eq!(case.candidates[0].source, "xml");
    }

    #[test]
    fn candidates_default_to_empty() {
        let json = r#"{"file_id": "F", "intake_date": "2025-01-15", "days_plazo": 1}"#;
        let case: DecisionCase = serde_json::from_str(json).unwrap();
        assert!(case.candidates.is_empty());
    }

    #[test]
    fn unknown_keys_rejected() {
        let json = r#"{"file_id": "F", "intake_date": "2025-01-15", "days_plazo": 1, "extra": 1}"#;
        assert!(serde_json::from_str::<DecisionCase>(json).is_err());
    }
}
