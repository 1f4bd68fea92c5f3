//! Matching policy: source trust ordering and agreement thresholds.
//!
//! The policy is loaded once and never mutated. Fields are private; a loaded
//! policy is read through accessors, and the `with_*` builders only produce
//! new values that are validated when passed to
//! [`EngineConfig::new`](crate::EngineConfig::new). Every field has an
//! *effective priority*: its override list if one is configured, followed by
//! the remaining sources in default priority order. Sources absent from an
//! override therefore rank after every listed source.

use std::collections::BTreeMap;

use oficio_core::{Confidence, SourceKind, SOURCE_KIND_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::fields::FieldSpecSet;

/// How candidates from different sources are merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingPolicy {
    /// Default trust order, most trusted first. Must list every source once.
    #[serde(default = "default_priority")]
    source_priority: Vec<SourceKind>,
    /// Per-field trust order. May list a subset of sources.
    #[serde(default)]
    per_field_overrides: BTreeMap<String, Vec<SourceKind>>,
    /// Records whose agreement ratio falls below this are flagged for review.
    #[serde(default = "default_min_agreement_ratio")]
    min_agreement_ratio: f64,
    /// Fields with a confidence below this are flagged for review.
    #[serde(default = "default_high_confidence_threshold")]
    high_confidence_threshold: u8,
    /// Points subtracted from the chosen value's confidence on conflict.
    #[serde(default = "default_conflict_penalty")]
    conflict_penalty: u8,
    /// Bonus awarded when every ranked source agrees.
    #[serde(default = "default_agreement_bonus_max")]
    agreement_bonus_max: u8,
}

fn default_priority() -> Vec<SourceKind> {
    SourceKind::all().to_vec()
}

fn default_min_agreement_ratio() -> f64 {
    0.8
}

fn default_high_confidence_threshold() -> u8 {
    80
}

fn default_conflict_penalty() -> u8 {
    20
}

fn default_agreement_bonus_max() -> u8 {
    15
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            source_priority: default_priority(),
            per_field_overrides: BTreeMap::new(),
            min_agreement_ratio: default_min_agreement_ratio(),
            high_confidence_threshold: default_high_confidence_threshold(),
            conflict_penalty: default_conflict_penalty(),
            agreement_bonus_max: default_agreement_bonus_max(),
        }
    }
}

impl MatchingPolicy {
    /// Replace the default trust order.
    pub fn with_source_priority(mut self, order: Vec<SourceKind>) -> Self {
        self.source_priority = order;
        self
    }

    /// Set the trust order for one field.
    pub fn with_override(mut self, field: impl Into<String>, order: Vec<SourceKind>) -> Self {
        self.per_field_overrides.insert(field.into(), order);
        self
    }

    /// Replace the minimum agreement ratio.
    pub fn with_min_agreement_ratio(mut self, ratio: f64) -> Self {
        self.min_agreement_ratio = ratio;
        self
    }

    /// Replace the high-confidence threshold.
    pub fn with_high_confidence_threshold(mut self, threshold: u8) -> Self {
        self.high_confidence_threshold = threshold;
        self
    }

    /// Replace the conflict penalty.
    pub fn with_conflict_penalty(mut self, penalty: u8) -> Self {
        self.conflict_penalty = penalty;
        self
    }

    /// Replace the maximum agreement bonus.
    pub fn with_agreement_bonus_max(mut self, bonus: u8) -> Self {
        self.agreement_bonus_max = bonus;
        self
    }

    /// Default trust order, most trusted first.
    pub fn source_priority(&self) -> &[SourceKind] {
        &self.source_priority
    }

    /// Per-field trust orders.
    pub fn per_field_overrides(&self) -> &BTreeMap<String, Vec<SourceKind>> {
        &self.per_field_overrides
    }

    /// Records below this agreement ratio are flagged.
    pub fn min_agreement_ratio(&self) -> f64 {
        self.min_agreement_ratio
    }

    /// Fields below this confidence are flagged.
    pub fn high_confidence_threshold(&self) -> u8 {
        self.high_confidence_threshold
    }

    /// Points taken from a conflicting field's confidence.
    pub fn conflict_penalty(&self) -> u8 {
        self.conflict_penalty
    }

    /// Bonus when every ranked source agrees.
    pub fn agreement_bonus_max(&self) -> u8 {
        self.agreement_bonus_max
    }

    /// Check internal consistency and that every override names a defined
    /// field.
    pub fn validate(&self, fields: &FieldSpecSet) -> ConfigResult<()> {
        if has_duplicates(&self.source_priority) {
            return Err(ConfigError::IncompletePriority {
                detail: "a source is listed more than once".into(),
            });
        }
        if self.source_priority.len() != SOURCE_KIND_COUNT {
            return Err(ConfigError::missing_sources(&self.source_priority));
        }

        for (field, order) in &self.per_field_overrides {
            fields.require("matching.per_field_overrides", field)?;
            if order.is_empty() {
                return Err(ConfigError::InvalidOverride {
                    field: field.clone(),
                    detail: "override list is empty".into(),
                });
            }
            if has_duplicates(order) {
                return Err(ConfigError::InvalidOverride {
                    field: field.clone(),
                    detail: "a source is listed more than once".into(),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.min_agreement_ratio) {
            return Err(ConfigError::RatioOutOfRange {
                key: "matching.min_agreement_ratio",
                value: self.min_agreement_ratio,
            });
        }
        for (key, value) in [
            ("matching.high_confidence_threshold", self.high_confidence_threshold),
            ("matching.conflict_penalty", self.conflict_penalty),
            ("matching.agreement_bonus_max", self.agreement_bonus_max),
        ] {
            if value > 100 {
                return Err(ConfigError::ScoreOutOfRange {
                    key: key.to_string(),
                    value: u32::from(value),
                });
            }
        }
        Ok(())
    }

    /// Effective trust order for `field`, most trusted first. Always lists
    /// every source exactly once.
    pub fn effective_priority(&self, field: &str) -> Vec<SourceKind> {
        let mut order = self
            .per_field_overrides
            .get(field)
            .cloned()
            .unwrap_or_default();
        for source in &self.source_priority {
            if !order.contains(source) {
                order.push(*source);
            }
        }
        order
    }

    /// Position of `source` in the effective priority of `field` (0 = most
    /// trusted).
    pub fn rank(&self, field: &str, source: SourceKind) -> usize {
        self.effective_priority(field)
            .iter()
            .position(|s| *s == source)
            .unwrap_or(SOURCE_KIND_COUNT)
    }

    /// `round(agreement_bonus_max × agreeing / ranked)` in integer arithmetic,
    /// where `ranked` is the length of the effective priority list.
    pub fn agreement_bonus(&self, agreeing: usize) -> u8 {
        let ranked = SOURCE_KIND_COUNT as u32;
        let agreeing = agreeing.min(SOURCE_KIND_COUNT) as u32;
        let max = u32::from(self.agreement_bonus_max);
        ((2 * max * agreeing + ranked) / (2 * ranked)) as u8
    }

    /// The review threshold as a [`Confidence`].
    pub fn high_confidence(&self) -> Confidence {
        Confidence::clamped(i64::from(self.high_confidence_threshold))
    }
}

fn has_duplicates(sources: &[SourceKind]) -> bool {
    sources
        .iter()
        .enumerate()
        .any(|(i, s)| sources[..i].contains(s))
}
