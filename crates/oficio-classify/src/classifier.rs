//! Two-level classification.
//!
//! Every scored category is evaluated; there is no early exit. The winner is
//! the strictly highest score, with ties resolved by the rule set's
//! tie-break list. A winner below the acceptance threshold becomes
//! [`Category::Unknown`] and keeps its score as the result's confidence so
//! reviewers can see how close it came.

use std::collections::BTreeMap;

use oficio_core::{Category, Confidence, SubCategory};
use oficio_policy::RuleSet;
use oficio_reconcile::UnifiedRecord;
use serde::{Deserialize, Serialize};

use crate::signals::{contains_any, evaluate};

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Winning category, or `unknown` below threshold.
    pub level1: Category,
    /// Authority subdivision, when the category admits one.
    pub level2: Option<SubCategory>,
    /// Score of every scored category.
    pub scores: BTreeMap<Category, Confidence>,
    /// Winning score.
    pub confidence: Confidence,
    /// Points missing to reach the acceptance threshold. Set only for
    /// `unknown`.
    pub threshold_gap: Option<u8>,
    /// More than one category shared the top score.
    pub tie_broken: bool,
    /// Best-scoring category before the threshold was applied.
    pub top_candidate: Category,
    /// Signals that held, in name order.
    pub fired_signals: Vec<String>,
}

impl ClassificationResult {
    /// Whether the result needs human review.
    pub fn is_ambiguous(&self) -> bool {
        self.level1 == Category::Unknown
    }
}

/// Score `record` against `rules`.
pub fn classify(record: &UnifiedRecord, rules: &RuleSet) -> ClassificationResult {
    let fired: Vec<&str> = rules
        .signals
        .iter()
        .filter(|(_, spec)| evaluate(spec, record))
        .map(|(name, _)| name.as_str())
        .collect();

    let mut scores = BTreeMap::new();
    for category in Category::scored() {
        let total: u32 = rules
            .categories
            .get(category)
            .map(|terms| {
                terms
                    .iter()
                    .filter(|t| fired.contains(&t.signal.as_str()))
                    .map(|t| u32::from(t.weight))
                    .sum()
            })
            .unwrap_or(0);
        scores.insert(*category, Confidence::clamped(i64::from(total)));
    }

    let top_score = scores.values().copied().max().unwrap_or(Confidence::ZERO);
    let leaders: Vec<Category> = scores
        .iter()
        .filter(|(_, s)| **s == top_score)
        .map(|(c, _)| *c)
        .collect();
    let tie_broken = leaders.len() > 1;
    let top_candidate = leaders
        .iter()
        .copied()
        .min_by_key(|c| rules.tie_rank(*c))
        .unwrap_or(Category::Unknown);

    tracing::debug!(
        top = %top_candidate,
        score = top_score.value(),
        tie_broken,
        fired = fired.len(),
        "categories scored"
    );

    let fired_signals = fired.iter().map(|s| s.to_string()).collect();
    if top_score.value() < rules.acceptance_threshold {
        return ClassificationResult {
            level1: Category::Unknown,
            level2: None,
            scores,
            confidence: top_score,
            threshold_gap: Some(rules.acceptance_threshold - top_score.value()),
            tie_broken,
            top_candidate,
            fired_signals,
        };
    }

    ClassificationResult {
        level1: top_candidate,
        level2: subcategory(top_candidate, record, rules),
        scores,
        confidence: top_score,
        threshold_gap: None,
        tie_broken,
        top_candidate,
        fired_signals,
    }
}

fn subcategory(category: Category, record: &UnifiedRecord, rules: &RuleSet) -> Option<SubCategory> {
    if !category.admits_subcategories() {
        return None;
    }
    let sub = rules.subcategories.as_ref()?;
    let table = sub.keywords_for(category);
    let matched = record.value(&sub.authority_field).and_then(|authority| {
        SubCategory::all().iter().copied().find(|s| {
            table
                .get(s)
                .map(|terms| contains_any(authority, terms))
                .unwrap_or(false)
        })
    });
    matched.or(sub.fallback)
}
