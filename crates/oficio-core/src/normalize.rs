//! # Field Normalization
//!
//! Produces comparison keys for field values. Two candidates agree when
//! their keys are equal; the original values are never rewritten.
//!
//! All kinds start from the same text fold: lowercase, Latin diacritics
//! folded to their base letter, surrounding whitespace trimmed and internal
//! runs collapsed to one space. Kind-specific rules then apply on top.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// How a field's values are compared across sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text such as names and addresses.
    #[default]
    Text,
    /// Identifiers (RFC, CURP, account and file numbers). Spaces, hyphens,
    /// dots and slashes are ignored.
    Identifier,
    /// Calendar dates. Parseable dates compare as `YYYY-MM-DD`.
    Date,
    /// Monetary amounts. Currency markers and thousands separators are
    /// ignored; trailing fractional zeros are dropped.
    Amount,
}

impl FieldKind {
    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Identifier => "identifier",
            Self::Date => "date",
            Self::Amount => "amount",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison key for `value` under `kind`.
pub fn normalize(value: &str, kind: FieldKind) -> String {
    let folded = fold_text(value);
    match kind {
        FieldKind::Text => folded,
        FieldKind::Identifier => folded
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '/' | '_'))
            .collect(),
        FieldKind::Date => normalize_date(&folded).unwrap_or(folded),
        FieldKind::Amount => normalize_amount(&folded).unwrap_or(folded),
    }
}

/// Lowercase, fold diacritics, trim and collapse whitespace.
///
/// Input is decomposed (NFD) and combining marks are dropped, so precomposed
/// `é` and `e` followed by U+0301 fold to the same `e`.
pub fn fold_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_space = false;
    let base = value.nfd().filter(|c| !is_combining_mark(*c));
    for c in base.flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"];

const MONTHS: &[&str] = &[
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Parse a folded date string in any accepted layout, including the long
/// Spanish form `15 de enero de 2025`.
pub fn parse_date(folded: &str) -> Option<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(folded, fmt) {
            return Some(date);
        }
    }
    let parts: Vec<&str> = folded
        .split(' ')
        .filter(|p| *p != "de" && *p != "del")
        .collect();
    if let [day, month, year] = parts.as_slice() {
        let day: u32 = day.parse().ok()?;
        let month = MONTHS.iter().position(|m| m == month)? as u32 + 1;
        let year: i32 = year.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    None
}

fn normalize_date(folded: &str) -> Option<String> {
    parse_date(folded).map(|d| d.format("%Y-%m-%d").to_string())
}

fn normalize_amount(folded: &str) -> Option<String> {
    let stripped = folded
        .replace("m.n.", "")
        .replace("mxn", "")
        .replace("pesos", "");
    let digits: String = stripped
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) if !f.contains('.') => (i, f),
        Some(_) => return None,
        None => (digits.as_str(), ""),
    };
    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        Some(int_part.to_string())
    } else {
        Some(format!("{int_part}.{frac_part}"))
    }
}
