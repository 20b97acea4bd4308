//! # Deterministic Checks Module
//!
//! ## Purpose
//! Pure, local style checks run on every citation span before any external
//! call. Violations found here carry `local.`-prefixed rule ids and are
//! prepended to whatever the external service reports.
//!
//! ## Input/Output Specification
//! - **Input**: One citation span
//! - **Output**: Zero or more violations; no I/O, no external calls
//! - **Checks**: Quote style, non-breaking separators, parenthetical case

use crate::{CitationSpan, Violation};
use regex::Regex;

/// Rule id for the straight-quote check
pub const RULE_QUOTE_STYLE: &str = "local.quote-style";
/// Rule id for the non-breaking separator check
pub const RULE_NONBREAKING_SEPARATOR: &str = "local.nonbreaking-separator";
/// Rule id for the parenthetical capitalization check
pub const RULE_PARENTHETICAL_CASE: &str = "local.parenthetical-case";

/// Short tokens that must be joined to what follows with a non-breaking space
const NONBREAKING_TOKENS: &[&str] = &[
    "§", "§§", "¶", "¶¶", "No.", "Nos.", "v.", "art.", "sec.", "cl.", "pt.", "n.", "nn.",
];

/// Fixed phrases that may open a parenthetical with a capital letter
const PARENTHETICAL_OPENERS: &[&str] = &[
    "citing", "quoting", "cleaned up", "emphasis", "internal", "en banc", "per curiam",
    "hereinafter", "citations omitted",
];

/// Deterministic style checker
pub struct DeterministicChecker {
    trailing_year: Regex,
}

impl Default for DeterministicChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicChecker {
    pub fn new() -> Self {
        Self {
            trailing_year: Regex::new(r"\b(1[6-9]\d{2}|20\d{2})\s*$")
                .expect("trailing-year regex is valid"),
        }
    }

    /// Run all checks against a span. The three checks are independent and
    /// their violations are reported in a fixed order.
    pub fn check(&self, span: &CitationSpan) -> Vec<Violation> {
        let mut violations = Vec::new();
        violations.extend(self.check_quote_style(&span.text));
        violations.extend(self.check_nonbreaking_separators(&span.text));
        violations.extend(self.check_parenthetical_case(&span.text));
        violations
    }

    /// Straight quote characters where the curly form is required
    fn check_quote_style(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        let chars: Vec<(usize, char)> = text.char_indices().collect();

        for (i, &(pos, c)) in chars.iter().enumerate() {
            let quote = match c {
                '"' => Some("straight double quote"),
                '\'' => {
                    let prev_alnum = i > 0 && chars[i - 1].1.is_alphanumeric();
                    let next_alnum = i + 1 < chars.len() && chars[i + 1].1.is_alphanumeric();
                    if prev_alnum && next_alnum {
                        Some("straight apostrophe")
                    } else {
                        Some("straight single quote")
                    }
                }
                _ => None,
            };
            if let Some(kind) = quote {
                violations.push(Violation {
                    rule_id: RULE_QUOTE_STYLE.to_string(),
                    description: format!("{} should use the curly form", kind),
                    evidence_quote: snippet_around(text, pos),
                });
            }
        }

        violations
    }

    /// A short token (section marker, "v.", enumerator) followed by a plain
    /// space and then a number or word must use a non-breaking space instead
    fn check_nonbreaking_separators(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        let words: Vec<&str> = text.split(' ').collect();

        let mut offset = 0;
        for (i, word) in words.iter().enumerate() {
            let is_token = NONBREAKING_TOKENS.contains(word);
            let next_is_content = words
                .get(i + 1)
                .map(|w| w.chars().next().is_some_and(|c| c.is_alphanumeric()))
                .unwrap_or(false);

            if is_token && next_is_content {
                violations.push(Violation {
                    rule_id: RULE_NONBREAKING_SEPARATOR.to_string(),
                    description: format!(
                        "'{}' must be joined to the following word with a non-breaking space",
                        word
                    ),
                    evidence_quote: snippet_around(text, offset),
                });
            }
            offset += word.len() + 1;
        }

        violations
    }

    /// A parenthetical must open lower-case unless its content is a direct
    /// quotation, a recognized fixed phrase, or non-prose (a bare year, page
    /// reference, or court-and-date parenthetical).
    fn check_parenthetical_case(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        let chars: Vec<(usize, char)> = text.char_indices().collect();

        for (ci, &(pos, c)) in chars.iter().enumerate() {
            if c != '(' {
                continue;
            }

            // First non-whitespace character after the open paren decides the
            // quote exception; scanning the whole body would misfire on
            // nested quotations
            let mut inner = ci + 1;
            while inner < chars.len() && chars[inner].1.is_whitespace() {
                inner += 1;
            }
            let Some(&(inner_pos, first)) = chars.get(inner) else {
                continue;
            };

            if matches!(first, '"' | '\u{201C}' | '\u{2018}' | '\'') {
                continue; // direct quotation
            }
            if !first.is_uppercase() {
                continue; // lowercase or digit opening is always fine
            }

            let body = parenthetical_body(text, inner_pos);
            let lowered = body.to_lowercase();
            if PARENTHETICAL_OPENERS.iter().any(|p| lowered.starts_with(p)) {
                continue;
            }
            // Court-and-date parentheticals ("C.D. Cal. 2022") are citation
            // matter, not prose
            if self.trailing_year.is_match(body.trim_end()) {
                continue;
            }

            violations.push(Violation {
                rule_id: RULE_PARENTHETICAL_CASE.to_string(),
                description: "parenthetical prose must open lower-case".to_string(),
                evidence_quote: snippet_around(text, pos),
            });
        }

        violations
    }
}

/// Content between an opening position and its matching close paren
fn parenthetical_body(text: &str, start: usize) -> &str {
    let mut depth = 1;
    for (pos, c) in text[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &text[start..start + pos];
                }
            }
            _ => {}
        }
    }
    &text[start..]
}

/// A short evidence window around a byte position
fn snippet_around(text: &str, around: usize) -> String {
    let around = around.min(text.len());
    let start = text[..around]
        .char_indices()
        .rev()
        .take(15)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(around);
    let end = text[around..]
        .char_indices()
        .nth(15)
        .map(|(i, _)| around + i)
        .unwrap_or(text.len());
    text[start..end].trim().to_string()
}
