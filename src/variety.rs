//! Canonical variety matching and grade labels.
//!
//! Rules are tried in order and the first one that fires wins, so specific
//! model numbers sit ahead of the generic brand keywords.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::CANONICAL_VARIETIES;

struct VarietyRule {
    pattern: Regex,
    /// Rejects a hit when the text right after it matches.
    not_followed_by: Option<Regex>,
    canonical: &'static str,
}

impl VarietyRule {
    fn new(pattern: &str, canonical: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            not_followed_by: None,
            canonical,
        }
    }

    fn unless_followed_by(mut self, pattern: &str) -> Self {
        self.not_followed_by = Some(Regex::new(pattern).unwrap());
        self
    }

    fn matches(&self, line: &str) -> bool {
        self.pattern.find_iter(line).any(|hit| match &self.not_followed_by {
            Some(guard) => !guard.is_match(&line[hit.end()..]),
            None => true,
        })
    }
}

static VARIETY_RULES: LazyLock<Vec<VarietyRule>> = LazyLock::new(|| {
    vec![
        VarietyRule::new(r"\b2043\b", "Syngenta 2043"),
        VarietyRule::new(r"\b5531\b", "Syngenta 5531"),
        VarietyRule::new(r"\b102\b", "Syngenta 102"),
        VarietyRule::new(r"\b(?:dabbi|kashmiri)\b", "Kashmiri (Dabbi)"),
        VarietyRule::new(r"\b(?:devanur|dd)\b", "Devanur Deluxe (DD)"),
        VarietyRule::new(r"\b(?:guntur|s-10|s10)\b", "Guntur S-10"),
        VarietyRule::new(r"\blocal\s*kdl\b", "Local KDL"),
        VarietyRule::new(r"\bbyadgi\b", "Byadgi (KDL)"),
        VarietyRule::new(r"\bkdl\b", "Byadgi (KDL)").unless_followed_by(r"^\s*fatki"),
        VarietyRule::new(r"\bseed(?:\s+quality)?\b", "Seed Quality"),
    ]
});

static GRADE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(medium\s+best|deluxe|delux|dlx|best|medium|fatki|fatky)\b").unwrap()
});

/// Returns the canonical variety named on `line`, if any.
///
/// The line is lower-cased before matching; callers may pass raw OCR text.
pub fn match_variety(line: &str) -> Option<&'static str> {
    let low = line.to_lowercase();
    VARIETY_RULES
        .iter()
        .find(|rule| rule.matches(&low))
        .map(|rule| rule.canonical)
        .filter(|canonical| CANONICAL_VARIETIES.contains(canonical))
}

/// Finds a raw grade label token on `line`.
pub fn find_grade_label(line: &str) -> Option<&str> {
    GRADE_LABEL.find(line).map(|m| m.as_str())
}

/// Maps a raw grade token (including known OCR misspellings) to its display form.
pub fn normalize_grade_label(raw: &str) -> String {
    let lab = raw.to_lowercase();
    if lab.contains("delux") || lab.contains("dlx") {
        "DLX".to_string()
    } else if lab.contains("best") && lab.contains("medium") {
        "Medium BEST".to_string()
    } else if lab.contains("best") {
        "BEST".to_string()
    } else if lab.contains("medium") {
        "Medium".to_string()
    } else if lab.contains("fatki") || lab.contains("fatky") {
        "FATKI".to_string()
    } else {
        raw.to_uppercase()
    }
}

/// `"<variety>"` or `"<variety> | <grade>"`.
pub fn record_key(variety: &str, grade: Option<&str>) -> String {
    match grade {
        Some(raw) => format!("{variety} | {}", normalize_grade_label(raw)),
        None => variety.to_string(),
    }
}
