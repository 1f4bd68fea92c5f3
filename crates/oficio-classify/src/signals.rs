//! Signal evaluation.
//!
//! Signals read the unified record only. A missing field, or a field that
//! is not in the record at all, never satisfies a signal; evaluation itself
//! cannot fail.
//!
//! Terms are matched word-by-word against the folded value (lowercase, no
//! diacritics). A term matches a run of consecutive whole words; a trailing
//! `*` lets its last word match any word with that prefix, so `asegur*`
//! matches "aseguramiento" and "asegurados" but not "reasegurar".

use oficio_core::normalize::{fold_text, normalize};
use oficio_policy::SignalSpec;
use oficio_reconcile::UnifiedRecord;

/// Whether `spec` holds for `record`.
pub fn evaluate(spec: &SignalSpec, record: &UnifiedRecord) -> bool {
    match spec {
        SignalSpec::Present { field } => record.value(field).is_some(),
        SignalSpec::ContainsAny { field, terms } => record
            .value(field)
            .map(|v| contains_any(v, terms))
            .unwrap_or(false),
        SignalSpec::Equals { field, value } => match record.field(field) {
            Some(f) => f
                .unified_value
                .as_deref()
                .map(|v| normalize(v, f.kind) == normalize(value, f.kind))
                .unwrap_or(false),
            None => false,
        },
        SignalSpec::AnyContains { fields, terms } => fields
            .iter()
            .filter_map(|f| record.value(f))
            .any(|v| contains_any(v, terms)),
    }
}

/// Whether any term matches `value`.
pub fn contains_any(value: &str, terms: &[String]) -> bool {
    let folded = fold_text(value);
    let words = split_words(&folded);
    terms.iter().any(|t| term_matches(&words, t))
}

fn split_words(folded: &str) -> Vec<&str> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn term_matches(words: &[&str], term: &str) -> bool {
    let trimmed = term.trim();
    let (body, prefix) = match trimmed.strip_suffix('*') {
        Some(body) => (body, true),
        None => (trimmed, false),
    };
    let folded = fold_text(body);
    let needle = split_words(&folded);
    let Some((last, init)) = needle.split_last() else {
        return false;
    };
    if words.len() < needle.len() {
        return false;
    }
    words.windows(needle.len()).any(|window| {
        let (w_last, w_init) = match window.split_last() {
            Some(parts) => parts,
            None => return false,
        };
        w_init == init
            && if prefix {
                w_last.starts_with(last)
            } else {
                w_last == last
            }
    })
}
