//! Turns free-text schedule cells into [`NormalizedHours`].
//!
//! Cells are rewritten by an ordered list of [`Rule`]s into a compact
//! pipe-delimited form such as `9AM|5PM|12PM`, then split into time tokens.

use std::sync::LazyLock;

use regex::Regex;

use crate::horaire::error::CellErrorKind;
use crate::horaire::model::{NormalizedHours, TimeRange};

/// Separator placed between time tokens.
pub const TOKEN_SEPARATOR: char = '|';

/// A single rewrite step applied to the cell text.
pub struct Rule {
    pub name: &'static str,
    pub pattern: Regex,
    pub replacement: &'static str,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid normalisation regex"),
            replacement,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, self.replacement).into_owned()
    }
}

/// Rewrite rules, applied in order.
pub static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // Exports sometimes carry PowerShell style escapes instead of breaks.
        Rule::new("line-breaks", r"`r`n|\r?\n|\r", " "),
        Rule::new("authoring-zone", r" PST", ""),
        Rule::new("no-lunch", r"(?i)NO LUNCH", ""),
        Rule::new("range-dash", r"\s*[-\u{2013}]\s*", "|"),
        Rule::new("lunch-marker", r"(?i)LUNCH\s*:", "|"),
        Rule::new("whitespace", r"\s+", ""),
    ]
});

/// Applies every rule to `hours` and returns the compact form.
///
/// Running this on its own output returns the same string.
pub fn normalize_text(hours: &str) -> String {
    RULES
        .iter()
        .fold(hours.to_string(), |text, rule| rule.apply(&text))
}

/// Classifies a non-blank schedule cell.
pub fn normalize_hours(hours: &str) -> Result<NormalizedHours, CellErrorKind> {
    let trimmed = hours.trim();
    if trimmed.eq_ignore_ascii_case("off") {
        return Ok(NormalizedHours::Off);
    }
    if trimmed.eq_ignore_ascii_case("vac") {
        return Ok(NormalizedHours::Vacation);
    }

    let normalized = normalize_text(hours);
    let tokens: Vec<&str> = normalized.split(TOKEN_SEPARATOR).collect();
    if tokens.iter().any(|token| token.is_empty()) {
        return Err(CellErrorKind::Malformed { normalized });
    }

    match tokens.as_slice() {
        [start, end] => Ok(NormalizedHours::Range(TimeRange {
            start: start.to_string(),
            end: end.to_string(),
            lunch: None,
        })),
        [start, end, lunch] => Ok(NormalizedHours::Range(TimeRange {
            start: start.to_string(),
            end: end.to_string(),
            lunch: Some(lunch.to_string()),
        })),
        _ => Err(CellErrorKind::Malformed { normalized }),
    }
}
