//! # Source Kinds
//!
//! The three renditions an oficio arrives in. The declaration order is the
//! deterministic last-resort tie-break used by reconciliation, and is
//! independent of the configurable trust ranking in the matching policy.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A document rendition that produced field candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Structured markup (XML) emitted by the issuing authority.
    StructuredMarkup,
    /// Word-processor document.
    OfficeDocument,
    /// Scanned image run through OCR.
    ScannedImage,
}

/// Number of source kinds. Used by policy validation.
pub const SOURCE_KIND_COUNT: usize = 3;

impl SourceKind {
    /// All source kinds in declaration order.
    pub fn all() -> &'static [SourceKind; SOURCE_KIND_COUNT] {
        &[
            Self::StructuredMarkup,
            Self::OfficeDocument,
            Self::ScannedImage,
        ]
    }

    /// Canonical snake_case name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuredMarkup => "structured_markup",
            Self::OfficeDocument => "office_document",
            Self::ScannedImage => "scanned_image",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = ValidationError;

    /// Accepts the canonical names plus the file-format tags extraction
    /// adapters commonly emit (`xml`, `docx`, `pdf`, `ocr`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured_markup" | "xml" => Ok(Self::StructuredMarkup),
            "office_document" | "docx" | "doc" => Ok(Self::OfficeDocument),
            "scanned_image" | "pdf" | "ocr" => Ok(Self::ScannedImage),
            _ => Err(ValidationError::UnknownSource(s.to_string())),
        }
    }
}
