//! # Narrative Splitting Strategy
//!
//! ## Purpose
//! Handles footnotes whose citations are interspersed with prose rather than
//! separated by semicolons. Citation boundaries are located by scanning for
//! signal words, full case-name patterns, short-form patterns, and standalone
//! terminal reference tokens.
//!
//! ## Key Features
//! - Abbreviation-aware sentence boundary detection (a period after a single
//!   capital, "v.", or a known abbreviation never ends a sentence)
//! - Non-signal boundaries require a sentence break since the previous
//!   boundary, so a case name right after its signal stays in one span
//! - Prose before the first boundary joins the first span (under-splitting)

use super::protection::ProtectionMap;
use super::signals::{self, SignalKind};
use crate::config::SplitterConfig;
use regex::Regex;

/// Abbreviations whose trailing period never ends a sentence
const COMMON_ABBREVIATIONS: &[&str] = &[
    "v.", "cf.", "e.g.", "i.e.", "etc.", "no.", "nos.", "ch.", "art.", "sec.", "ed.", "rev.",
    "vol.", "supp.", "cir.", "ct.", "dist.", "div.", "dep't.", "ass'n.", "inc.", "co.", "corp.",
    "u.s.", "f.", "cal.", "n.y.", "mass.", "jan.", "feb.", "mar.", "apr.", "aug.", "sept.",
    "oct.", "nov.", "dec.", "id.", "ibid.",
];

/// Compiled patterns for the narrative strategy
pub struct NarrativeSplitter {
    case_name: Regex,
    short_form: Regex,
    terminal_reference: Regex,
    min_chars: usize,
    min_sentences: usize,
}

/// A candidate citation boundary with its match kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundaryKind {
    Signal,
    CaseName,
    ShortForm,
    TerminalReference,
}

impl NarrativeSplitter {
    pub fn new(config: &SplitterConfig) -> Self {
        Self {
            // Capitalized-phrase "v." Capitalized-phrase
            case_name: Regex::new(
                r"\b(?:[A-Z][\w.’'-]*\s+){1,6}v\.\s+[A-Z][\w.’'-]*",
            )
            .expect("case-name regex is valid"),
            // Name, volume reporter-abbreviation page — the short form used
            // after a full citation appeared earlier
            short_form: Regex::new(
                r"\b[A-Z][\w’'-]+,\s+\d+\s+[A-Z][A-Za-z.]*\.?\s*(?:2d|3d|4th)?\s+(?:at\s+)?\d+",
            )
            .expect("short-form regex is valid"),
            terminal_reference: Regex::new(r"\b(?:Id\.|Ibid\.)(?:\s+at\s+\d+)?")
                .expect("terminal-reference regex is valid"),
            min_chars: config.narrative_min_chars,
            min_sentences: config.narrative_min_sentences,
        }
    }

    /// Whether a semicolon-free chunk should be split as narrative text
    pub fn is_narrative(&self, chunk: &str) -> bool {
        !chunk.contains(';')
            && !chunk.contains('\n')
            && chunk.len() >= self.min_chars
            && count_sentences(chunk) >= self.min_sentences
    }

    /// Split a narrative chunk at citation boundaries. Returns at least one
    /// span covering the whole chunk.
    pub fn split(&self, chunk: &str, protection: &ProtectionMap) -> Vec<String> {
        let mut candidates = self.collect_candidates(chunk, protection);
        candidates.sort_by_key(|(pos, _)| *pos);
        candidates.dedup_by_key(|(pos, _)| *pos);

        // A sentence end inside a protected region (a parenthetical or a
        // quotation) never licenses a new citation boundary
        let sentence_ends: Vec<usize> = sentence_end_positions(chunk)
            .into_iter()
            .filter(|&e| !protection.is_protected(e.saturating_sub(1)))
            .collect();

        // Accept a candidate only when it starts a citation of its own:
        // signals always do; pattern matches only after a sentence break,
        // otherwise they belong to the citation already in progress.
        let mut boundaries: Vec<usize> = Vec::new();
        let mut last_accepted: Option<usize> = None;
        let mut starts_with_citation = false;

        for (pos, kind) in candidates {
            // A candidate with only markup/whitespace before it opens the
            // chunk; it anchors the first span rather than splitting it
            if chunk[..pos].chars().all(|c| !c.is_alphanumeric()) {
                starts_with_citation = true;
                last_accepted = Some(pos);
                continue;
            }
            let accepted = match kind {
                BoundaryKind::Signal => true,
                _ => match last_accepted {
                    None => true,
                    Some(prev) => sentence_ends.iter().any(|&e| e > prev && e < pos),
                },
            };
            if accepted {
                boundaries.push(pos);
                last_accepted = Some(pos);
            }
        }

        // Prose before the first located citation carries no citation of its
        // own; it rides along with that citation's span instead of becoming
        // a fragment with no rule coverage
        if !starts_with_citation && !boundaries.is_empty() {
            boundaries.remove(0);
        }

        if boundaries.is_empty() {
            return vec![chunk.to_string()];
        }

        let mut spans = Vec::with_capacity(boundaries.len() + 1);
        let mut start = 0;
        for b in boundaries {
            spans.push(chunk[start..b].to_string());
            start = b;
        }
        spans.push(chunk[start..].to_string());
        spans
    }

    fn collect_candidates(
        &self,
        chunk: &str,
        protection: &ProtectionMap,
    ) -> Vec<(usize, BoundaryKind)> {
        let mut candidates = Vec::new();

        // Signal words, honoring the comparison grammar
        let words = signals::tokenize(chunk);
        let mut opener_matched = false;
        let mut wi = 0;
        while wi < words.len() {
            let Some(m) = signals::match_signal_at(&words, wi) else {
                wi += 1;
                continue;
            };
            if protection.is_protected(m.start) {
                wi += 1;
                continue;
            }
            match m.kind {
                SignalKind::Introducer => candidates.push((m.start, BoundaryKind::Signal)),
                SignalKind::PairOpener => {
                    opener_matched = true;
                    candidates.push((m.start, BoundaryKind::Signal));
                }
                SignalKind::PairCloser => {
                    if !opener_matched {
                        wi += 1;
                        continue;
                    }
                }
            }
            wi += m.word_count;
        }

        for m in self.case_name.find_iter(chunk) {
            if !protection.is_protected(m.start()) {
                candidates.push((m.start(), BoundaryKind::CaseName));
            }
        }
        for m in self.short_form.find_iter(chunk) {
            if !protection.is_protected(m.start()) {
                candidates.push((m.start(), BoundaryKind::ShortForm));
            }
        }
        for m in self.terminal_reference.find_iter(chunk) {
            if !protection.is_protected(m.start()) {
                candidates.push((m.start(), BoundaryKind::TerminalReference));
            }
        }

        candidates
    }
}

/// Count sentences, ignoring abbreviation periods
fn count_sentences(text: &str) -> usize {
    sentence_end_positions(text).len()
}

/// Byte positions one past each sentence-ending punctuation mark.
///
/// A period is a sentence end only when it is not part of an abbreviation
/// (single capital letter + period, "v.", or the fixed abbreviation list)
/// and is followed by whitespace-then-capital, a quote, or end of text.
fn sentence_end_positions(text: &str) -> Vec<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut ends = Vec::new();

    for (ci, &(pos, c)) in chars.iter().enumerate() {
        match c {
            '!' | '?' => ends.push(pos + c.len_utf8()),
            '.' => {
                if is_abbreviation_period(text, &chars, ci) {
                    continue;
                }
                // Lookahead: whitespace then an uppercase/quote, or EOT
                let mut next = ci + 1;
                while next < chars.len() && chars[next].1.is_whitespace() {
                    next += 1;
                }
                let terminal = next == chars.len()
                    || (next > ci + 1
                        && (chars[next].1.is_uppercase()
                            || chars[next].1 == '"'
                            || chars[next].1 == '\u{201C}'));
                if terminal {
                    ends.push(pos + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    ends
}

fn is_abbreviation_period(text: &str, chars: &[(usize, char)], ci: usize) -> bool {
    // Walk back to the start of the word containing this period
    let mut start_ci = ci;
    while start_ci > 0 && !chars[start_ci - 1].1.is_whitespace() {
        start_ci -= 1;
    }
    let word = &text[chars[start_ci].0..chars[ci].0 + 1];

    // Single capital letter plus period ("A.", initials in party names)
    let mut word_chars = word.chars();
    if let (Some(first), Some('.'), None) = (word_chars.next(), word_chars.next(), word_chars.next())
    {
        if first.is_uppercase() {
            return true;
        }
    }

    let lowered = word.to_lowercase();
    if COMMON_ABBREVIATIONS
        .iter()
        .any(|abbr| lowered == *abbr || lowered.ends_with(&format!(".{}", abbr)))
    {
        return true;
    }

    // Initial-letter runs ("C.D.", "S.D.N.Y.") are abbreviations too
    let trimmed = lowered.trim_start_matches(|c: char| !c.is_alphanumeric());
    let segments: Vec<&str> = trimmed.split('.').filter(|s| !s.is_empty()).collect();
    segments.len() >= 2 && segments.iter().all(|s| s.len() <= 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitterConfig;
    use crate::splitter::protection;

    fn narrative() -> NarrativeSplitter {
        NarrativeSplitter::new(&SplitterConfig {
            cross_reference_max_words: 8,
            narrative_min_chars: 100,
            narrative_min_sentences: 2,
            normalize_unicode: true,
        })
    }

    #[test]
    fn test_abbreviation_periods_do_not_end_sentences() {
        assert_eq!(count_sentences("Smith v. Jones was decided in 1990."), 1);
        assert_eq!(count_sentences("See F. Supp. and U.S. reports generally."), 1);
        assert_eq!(count_sentences("A. B. Corp. was sued. The court agreed."), 2);
    }

    #[test]
    fn test_narrative_predicate() {
        let n = narrative();
        let long_prose = "The court distinguished the earlier holding on procedural grounds. \
             That reasoning was later adopted by several circuits. The doctrine remains unsettled.";
        assert!(n.is_narrative(long_prose));
        assert!(!n.is_narrative("Smith v. Jones, 1 F.3d 1 (1st Cir. 1990)"));
        assert!(!n.is_narrative("has; semicolons. So it is delimited. Even when long enough."));
    }

    #[test]
    fn test_case_name_after_sentence_break_starts_new_span() {
        let n = narrative();
        let chunk = "The doctrine was first articulated long ago and remains good law today. \
             Smith v. Jones, 1 F.3d 1, 5 (1st Cir. 1990) settled the question. \
             Doe v. Roe, 2 F.3d 2 (2d Cir. 1991) extended it.";
        let map = protection::scan(chunk);
        let spans = n.split(chunk, &map);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].contains("Smith v. Jones"));
        assert!(spans[1].starts_with("Doe v. Roe"));
    }

    #[test]
    fn test_case_name_following_signal_stays_in_signal_span() {
        let n = narrative();
        let chunk = "The rule has an exception, see Smith v. Jones, 1 F.3d 1 (1st Cir. 1990), \
             which the court applied here. Doe v. Roe, 2 F.3d 2 (2d Cir. 1991) extended it.";
        let map = protection::scan(chunk);
        let spans = n.split(chunk, &map);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].contains("see Smith v. Jones"));
        assert!(spans[1].starts_with("Doe v. Roe"));
    }

    #[test]
    fn test_terminal_reference_is_a_boundary() {
        let n = narrative();
        let chunk = "See Smith v. Jones, 1 F.3d 1 (1st Cir. 1990), for the origin of the rule. \
             Id. at 12. The dissent would have gone further.";
        let map = protection::scan(chunk);
        let spans = n.split(chunk, &map);
        assert_eq!(spans.len(), 2);
        assert!(spans[1].starts_with("Id. at 12"));
    }

    #[test]
    fn test_no_boundaries_yields_whole_chunk() {
        let n = narrative();
        let chunk = "Pure prose without any citation material at all. It simply discusses doctrine.";
        let map = protection::scan(chunk);
        let spans = n.split(chunk, &map);
        assert_eq!(spans.len(), 1);
    }
}
