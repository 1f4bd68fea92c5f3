//! # Identifiers
//!
//! `FileId` names one oficio across every stage. `DecisionId` names one run
//! of the decision engine over that file; a file re-decided after a deadline
//! correction gets a fresh `DecisionId` but keeps its `FileId`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Identifier of a regulatory file (oficio). Never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Validate and wrap a file identifier. Surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyFileId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FileId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one decision run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub Uuid);

impl DecisionId {
    /// Generate a new random decision identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decision:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_trims_whitespace() {
        let id = FileId::new("  OF-2025-0001 ").unwrap();
        assert_eq!(id.as_str(), "OF-2025-0001");
    }

    #[test]
    fn file_id_rejects_empty() {
        assert_eq!(FileId::new(""), Err(ValidationError::EmptyFileId));
        assert_eq!(FileId::new("   \t"), Err(ValidationError::EmptyFileId));
    }

    #[test]
    fn file_id_deserialize_validates() {
        let ok: FileId = serde_json::from_str("\"OF-1\"").unwrap();
        assert_eq!(ok.to_string(), "OF-1");
        assert!(serde_json::from_str::<FileId>("\"\"").is_err());
    }

    #[test]
    fn decision_ids_are_unique() {
        assert_ne!(DecisionId::new(), DecisionId::new());
        assert!(DecisionId::new().to_string().starts_with("decision:"));
    }
}
