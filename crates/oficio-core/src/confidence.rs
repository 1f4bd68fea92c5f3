//! # Confidence Scores
//!
//! `Confidence` is an integer score in `0..=100`. Arithmetic saturates at both
//! ends so bonus and penalty application can never leave the range.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An integer confidence score, always within `0..=100`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    /// Zero confidence. Used for missing fields.
    pub const ZERO: Confidence = Confidence(0);
    /// Full confidence.
    pub const MAX: Confidence = Confidence(100);

    /// Validate a raw score. `context` names the field or rule for the error.
    pub fn new(value: i64, context: &str) -> Result<Self, ValidationError> {
        if !(0..=100).contains(&value) {
            return Err(ValidationError::ConfidenceOutOfRange {
                context: context.to_string(),
                value,
            });
        }
        Ok(Self(value as u8))
    }

    /// Clamp any integer into range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    /// The score as an integer.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Add points, capping at 100.
    pub fn saturating_add(self, points: u8) -> Self {
        Self::clamped(i64::from(self.0) + i64::from(points))
    }

    /// Subtract points, flooring at 0.
    pub fn saturating_sub(self, points: u8) -> Self {
        Self::clamped(i64::from(self.0) - i64::from(points))
    }
}

impl TryFrom<i64> for Confidence {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value, "confidence")
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_enforces_range() {
        assert_eq!(Confidence::new(0, "x").unwrap(), Confidence::ZERO);
        assert_eq!(Confidence::new(100, "x").unwrap(), Confidence::MAX);
        assert!(matches!(
            Confidence::new(101, "nombre"),
            Err(ValidationError::ConfidenceOutOfRange { value: 101, .. })
        ));
        assert!(Confidence::new(-1, "x").is_err());
    }

    #[test]
    fn arithmetic_saturates() {
        let c = Confidence::new(95, "x").unwrap();
        assert_eq!(c.saturating_add(15), Confidence::MAX);
        let low = Confidence::new(10, "x").unwrap();
        assert_eq!(low.saturating_sub(20), Confidence::ZERO);
        assert_eq!(low.saturating_sub(4).value(), 6);
    }

    #[test]
    fn serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Confidence>("150").is_err());
        let c: Confidence = serde_json::from_str("88").unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "88");
    }
}
