//! Classification rules.
//!
//! A [`RuleSet`] defines named boolean *signals* over the unified record and,
//! for each scored category, a weighted list of those signals. The loader
//! rejects any rule set that would leave a category unscored, reference an
//! undefined signal or field, or leave ties unresolvable.

use std::collections::BTreeMap;

use oficio_core::{Category, SubCategory, SCORED_CATEGORY_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::fields::FieldSpecSet;

/// A boolean test over one or more reconciled fields.
///
/// Text comparisons use the folded form (lowercase, no diacritics,
/// collapsed whitespace) of both the field value and the configured terms.
/// A missing field never satisfies a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum SignalSpec {
    /// The field reconciled to a value.
    Present { field: String },
    /// The field's value contains any of the terms.
    ContainsAny { field: String, terms: Vec<String> },
    /// The field's comparison key equals the comparison key of `value`.
    Equals { field: String, value: String },
    /// Any of the fields contains any of the terms.
    AnyContains {
        fields: Vec<String>,
        terms: Vec<String>,
    },
}

impl SignalSpec {
    /// Field names the signal reads.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Present { field }
            | Self::ContainsAny { field, .. }
            | Self::Equals { field, .. } => vec![field.as_str()],
            Self::AnyContains { fields, .. } => fields.iter().map(String::as_str).collect(),
        }
    }

    fn validate(&self, name: &str, fields: &FieldSpecSet) -> ConfigResult<()> {
        let context = format!("signal {name:?}");
        let read = self.fields();
        if read.is_empty() {
            return Err(ConfigError::InvalidSignal {
                signal: name.to_string(),
                detail: "no fields listed".into(),
            });
        }
        for field in read {
            fields.require(&context, field)?;
        }
        match self {
            Self::ContainsAny { terms, .. } | Self::AnyContains { terms, .. } => {
                if terms.is_empty() || terms.iter().any(|t| t.trim().is_empty()) {
                    return Err(ConfigError::InvalidSignal {
                        signal: name.to_string(),
                        detail: "terms must be non-empty".into(),
                    });
                }
            }
            Self::Equals { value, .. } if value.trim().is_empty() => {
                return Err(ConfigError::InvalidSignal {
                    signal: name.to_string(),
                    detail: "value must be non-empty".into(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}

/// One term of a category's scoring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightedSignal {
    /// Name of a signal in [`RuleSet::signals`].
    pub signal: String,
    /// Points added when the signal holds.
    pub weight: u8,
}

/// Level-two rules: authority keywords per subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubcategoryRules {
    /// Field holding the issuing authority's name.
    pub authority_field: String,
    /// Keywords per subcategory, applied to every subdivided category.
    pub keywords: BTreeMap<SubCategory, Vec<String>>,
    /// Category-specific keyword tables replacing `keywords`.
    #[serde(default)]
    pub overrides: BTreeMap<Category, BTreeMap<SubCategory, Vec<String>>>,
    /// Subcategory assigned when no keyword matches. `None` leaves level two
    /// unset.
    #[serde(default)]
    pub fallback: Option<SubCategory>,
}

impl SubcategoryRules {
    /// Keyword table for `category`.
    pub fn keywords_for(&self, category: Category) -> &BTreeMap<SubCategory, Vec<String>> {
        self.overrides.get(&category).unwrap_or(&self.keywords)
    }
}

/// The full classification rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    /// Winning scores below this classify as `unknown`.
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: u8,
    /// Tie resolution order, highest precedence first.
    #[serde(default = "default_tie_break")]
    pub tie_break: Vec<Category>,
    /// Named signal definitions.
    pub signals: BTreeMap<String, SignalSpec>,
    /// Scoring rule per scored category.
    pub categories: BTreeMap<Category, Vec<WeightedSignal>>,
    /// Optional level-two rules.
    #[serde(default)]
    pub subcategories: Option<SubcategoryRules>,
}

fn default_acceptance_threshold() -> u8 {
    70
}

/// Shipped tie-break order: orders that move or freeze money outrank
/// requests for information.
pub fn default_tie_break() -> Vec<Category> {
    vec![
        Category::Seizure,
        Category::Transfer,
        Category::FundsRemittance,
        Category::Release,
        Category::DocumentationRequest,
        Category::InformationRequest,
    ]
}

impl RuleSet {
    /// Validate the rule set against the defined fields.
    pub fn validate(&self, fields: &FieldSpecSet) -> ConfigResult<()> {
        if self.acceptance_threshold > 100 {
            return Err(ConfigError::ScoreOutOfRange {
                key: "rules.acceptance_threshold".into(),
                value: u32::from(self.acceptance_threshold),
            });
        }
        self.validate_tie_break()?;

        for (name, spec) in &self.signals {
            spec.validate(name, fields)?;
        }

        if self.categories.contains_key(&Category::Unknown) {
            return Err(ConfigError::UnscoredCategoryRule {
                category: Category::Unknown,
            });
        }
        for category in Category::scored() {
            let rule = match self.categories.get(category) {
                Some(rule) if !rule.is_empty() => rule,
                _ => {
                    return Err(ConfigError::MissingCategoryRule {
                        category: *category,
                    })
                }
            };
            for term in rule {
                if !self.signals.contains_key(&term.signal) {
                    return Err(ConfigError::UndefinedSignal {
                        category: *category,
                        signal: term.signal.clone(),
                    });
                }
                if term.weight == 0 {
                    return Err(ConfigError::ZeroWeight {
                        category: *category,
                        signal: term.signal.clone(),
                    });
                }
                if term.weight > 100 {
                    return Err(ConfigError::ScoreOutOfRange {
                        key: format!("rules.categories.{category}.{}", term.signal),
                        value: u32::from(term.weight),
                    });
                }
            }
        }

        if let Some(sub) = &self.subcategories {
            fields.require("rules.subcategories.authority_field", &sub.authority_field)?;
            for category in sub.overrides.keys() {
                if !category.admits_subcategories() {
                    return Err(ConfigError::NotSubdivided {
                        category: *category,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_tie_break(&self) -> ConfigResult<()> {
        if self.tie_break.contains(&Category::Unknown) {
            return Err(ConfigError::InvalidTieBreak {
                detail: "unknown is not a scored category".into(),
            });
        }
        for (i, c) in self.tie_break.iter().enumerate() {
            if self.tie_break[..i].contains(c) {
                return Err(ConfigError::InvalidTieBreak {
                    detail: format!("{c} is listed more than once"),
                });
            }
        }
        if self.tie_break.len() != SCORED_CATEGORY_COUNT {
            let missing: Vec<&str> = Category::scored()
                .iter()
                .filter(|c| !self.tie_break.contains(c))
                .map(Category::as_str)
                .collect();
            return Err(ConfigError::InvalidTieBreak {
                detail: format!("missing {}", missing.join(", ")),
            });
        }
        Ok(())
    }

    /// Precedence of `category` in the tie-break list (0 = wins every tie).
    pub fn tie_rank(&self, category: Category) -> usize {
        self.tie_break
            .iter()
            .position(|c| *c == category)
            .unwrap_or(SCORED_CATEGORY_COUNT)
    }
}
