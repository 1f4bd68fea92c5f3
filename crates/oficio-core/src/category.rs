//! # Category Taxonomy
//!
//! The closed set of legally defined oficio categories. Every `match` on
//! `Category` is exhaustive, so adding a category forces the rule loader,
//! the classifier and the audit path to handle it.
//!
//! | # | Category | Typical instruction |
//! |---|----------|---------------------|
//! | 1 | InformationRequest | Report balances, movements or holders |
//! | 2 | DocumentationRequest | Deliver contracts, statements, signatures |
//! | 3 | Seizure | Freeze (asegurar) or garnish (embargar) funds |
//! | 4 | Release | Lift a previous freeze |
//! | 5 | Transfer | Move frozen funds to an authority account |
//! | 6 | FundsRemittance | Place funds at the authority's disposal by cheque or deposit |
//!
//! `Unknown` is the result of a classification that cleared no threshold. It
//! is never scored and never appears in rule sets.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Level-one compliance category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Request for account or customer information.
    InformationRequest,
    /// Request for copies of documents.
    DocumentationRequest,
    /// Freeze or garnishment order.
    Seizure,
    /// Order lifting a freeze.
    Release,
    /// Transfer of frozen funds.
    Transfer,
    /// Remittance of funds to the authority.
    FundsRemittance,
    /// No category cleared the acceptance threshold.
    Unknown,
}

/// Number of scored categories (excludes `Unknown`).
pub const SCORED_CATEGORY_COUNT: usize = 6;

impl Category {
    /// The six scored categories in declaration order.
    pub fn scored() -> &'static [Category; SCORED_CATEGORY_COUNT] {
        &[
            Self::InformationRequest,
            Self::DocumentationRequest,
            Self::Seizure,
            Self::Release,
            Self::Transfer,
            Self::FundsRemittance,
        ]
    }

    /// Snake_case name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InformationRequest => "information_request",
            Self::DocumentationRequest => "documentation_request",
            Self::Seizure => "seizure",
            Self::Release => "release",
            Self::Transfer => "transfer",
            Self::FundsRemittance => "funds_remittance",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the category is subdivided by issuing authority.
    pub fn admits_subcategories(&self) -> bool {
        match self {
            Self::InformationRequest
            | Self::DocumentationRequest
            | Self::Seizure
            | Self::Release => true,
            Self::Transfer | Self::FundsRemittance | Self::Unknown => false,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "information_request" => Ok(Self::InformationRequest),
            "documentation_request" => Ok(Self::DocumentationRequest),
            "seizure" => Ok(Self::Seizure),
            "release" => Ok(Self::Release),
            "transfer" => Ok(Self::Transfer),
            "funds_remittance" => Ok(Self::FundsRemittance),
            "unknown" => Ok(Self::Unknown),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

/// Level-two subdivision by the kind of issuing authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubCategory {
    /// Tax authority (SAT, state treasuries).
    Fiscal,
    /// Courts.
    Judicial,
    /// Public prosecutors (Fiscalía, Ministerio Público).
    Criminal,
    /// Administrative bodies (IMSS, INFONAVIT, CONDUSEF, UIF).
    Administrative,
}

impl SubCategory {
    /// All subcategories in evaluation order.
    pub fn all() -> &'static [SubCategory; 4] {
        &[Self::Fiscal, Self::Judicial, Self::Criminal, Self::Administrative]
    }

    /// Snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fiscal => "fiscal",
            Self::Judicial => "judicial",
            Self::Criminal => "criminal",
            Self::Administrative => "administrative",
        }
    }
}

impl std::fmt::Display for SubCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
