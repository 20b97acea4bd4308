//! # Citation Signal Table
//!
//! ## Purpose
//! Fixed, ordered table of legal citation signal words and the matching rules
//! used to find them in footnote text: longest-match-wins, case-insensitive,
//! transparent to inline emphasis markers, with a paired comparison grammar.
//!
//! ## Key Features
//! - Multi-word signals ("see also", "but see") beat their one-word prefixes
//! - "with" is the paired closer of "compare" and never acts alone
//! - Matching is position-indexed so callers can honor protected regions

use serde::{Deserialize, Serialize};

/// Role a signal plays in the splitting grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Introduces a new citation; always a valid split point
    Introducer,
    /// Opens a comparison group ("compare")
    PairOpener,
    /// Closes a comparison group ("with"); only meaningful after its opener,
    /// and keeps the group together rather than splitting it
    PairCloser,
}

/// One entry in the signal table
#[derive(Debug, Clone)]
pub struct Signal {
    /// Signal words, lowercased, in order
    pub words: &'static [&'static str],
    /// Grammar role
    pub kind: SignalKind,
}

/// The fixed signal table. Order within equal word counts is the priority
/// order; matching always prefers the longest phrase at a position.
pub const SIGNAL_TABLE: &[Signal] = &[
    Signal { words: &["see", "generally"], kind: SignalKind::Introducer },
    Signal { words: &["see", "also"], kind: SignalKind::Introducer },
    Signal { words: &["but", "see"], kind: SignalKind::Introducer },
    Signal { words: &["but", "cf."], kind: SignalKind::Introducer },
    Signal { words: &["compare"], kind: SignalKind::PairOpener },
    Signal { words: &["with"], kind: SignalKind::PairCloser },
    Signal { words: &["see"], kind: SignalKind::Introducer },
    Signal { words: &["cf."], kind: SignalKind::Introducer },
    Signal { words: &["accord"], kind: SignalKind::Introducer },
    Signal { words: &["contra"], kind: SignalKind::Introducer },
    Signal { words: &["e.g."], kind: SignalKind::Introducer },
];

/// A word in the source text with its byte extent and a normalized form
/// (lowercased, emphasis markers stripped, trailing commas trimmed).
#[derive(Debug, Clone)]
pub struct SourceWord {
    /// Byte offset of the word's first character
    pub start: usize,
    /// Byte offset one past the word's last character
    pub end: usize,
    /// Normalized form used for signal comparison
    pub norm: String,
}

/// A signal match anchored in the source text
#[derive(Debug, Clone)]
pub struct SignalMatch {
    /// Byte offset where the matched phrase starts
    pub start: usize,
    /// Index of the first matched word in the word list
    pub word_index: usize,
    /// Number of words the phrase consumed
    pub word_count: usize,
    /// Grammar role of the matched signal
    pub kind: SignalKind,
}

/// Characters treated as transparent inline emphasis markup
pub fn is_emphasis_marker(c: char) -> bool {
    c == '*' || c == '_'
}

/// Tokenize text into words with byte offsets. Emphasis markers are dropped
/// from the normalized form so `*See*` matches `see`.
pub fn tokenize(text: &str) -> Vec<SourceWord> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                words.push(make_word(text, s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push(make_word(text, s, text.len()));
    }

    words
}

fn make_word(text: &str, start: usize, end: usize) -> SourceWord {
    let norm: String = text[start..end]
        .chars()
        .filter(|c| !is_emphasis_marker(*c))
        .flat_map(|c| c.to_lowercase())
        .collect();
    SourceWord {
        start,
        end,
        norm: norm.trim_end_matches(',').to_string(),
    }
}

/// Try to match a signal phrase starting at `word_index`. Longest match wins:
/// the table is scanned in order of descending phrase length, so a two-word
/// signal containing a one-word signal as a prefix takes precedence.
pub fn match_signal_at(words: &[SourceWord], word_index: usize) -> Option<SignalMatch> {
    let mut best: Option<&Signal> = None;

    for signal in SIGNAL_TABLE {
        if signal.words.len() > words.len() - word_index {
            continue;
        }
        let matches = signal
            .words
            .iter()
            .zip(&words[word_index..word_index + signal.words.len()])
            .all(|(expected, actual)| actual.norm == *expected);
        if matches {
            match best {
                Some(b) if b.words.len() >= signal.words.len() => {}
                _ => best = Some(signal),
            }
        }
    }

    best.map(|signal| SignalMatch {
        start: words[word_index].start,
        word_index,
        word_count: signal.words.len(),
        kind: signal.kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norms(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|w| w.norm).collect()
    }

    #[test]
    fn test_tokenize_strips_emphasis_and_trailing_commas() {
        assert_eq!(norms("*See also* Smith,"), vec!["see", "also", "smith"]);
        assert_eq!(norms("_Cf._ Jones"), vec!["cf.", "jones"]);
    }

    #[test]
    fn test_longest_match_wins() {
        let words = tokenize("see also Smith v. Jones");
        let m = match_signal_at(&words, 0).unwrap();
        assert_eq!(m.word_count, 2);
        assert_eq!(m.kind, SignalKind::Introducer);
    }

    #[test]
    fn test_single_word_signal_still_matches() {
        let words = tokenize("see Smith v. Jones");
        let m = match_signal_at(&words, 0).unwrap();
        assert_eq!(m.word_count, 1);
    }

    #[test]
    fn test_compare_and_with_roles() {
        let words = tokenize("compare A with B");
        assert_eq!(match_signal_at(&words, 0).unwrap().kind, SignalKind::PairOpener);
        assert_eq!(match_signal_at(&words, 2).unwrap().kind, SignalKind::PairCloser);
    }

    #[test]
    fn test_non_signal_word_does_not_match() {
        let words = tokenize("the court held");
        assert!(match_signal_at(&words, 0).is_none());
    }

    #[test]
    fn test_emphasis_wrapped_signal_matches() {
        let words = tokenize("prose, *see, e.g.,* Smith");
        // "*see," normalizes to "see"
        let m = match_signal_at(&words, 1).unwrap();
        assert_eq!(m.kind, SignalKind::Introducer);
    }
}
