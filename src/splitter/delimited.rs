//! # Delimited Splitting Strategy
//!
//! ## Purpose
//! Splits a footnote on its explicit delimiters: semicolons and newlines
//! outside protected regions, then signal words within each chunk. Periods
//! are never delimiters here — legal citations are full of abbreviations,
//! URLs, and reporter names.
//!
//! ## Key Features
//! - Supplemental cross-reference chunks merge into the previous chunk
//! - Signal sub-split with longest-match-wins and the comparison grammar
//! - Leftover punctuation/markup fragments are discarded, not emitted

use super::protection::{self, ProtectionMap};
use super::signals::{self, SignalKind};
use crate::config::SplitterConfig;
use regex::Regex;

/// Compiled patterns for the delimited strategy
pub struct DelimitedSplitter {
    cross_reference: Regex,
    volume_reporter: Regex,
    cross_reference_max_words: usize,
}

impl DelimitedSplitter {
    pub fn new(config: &SplitterConfig) -> Self {
        Self {
            // A bare backward/forward reference to another note: "see supra
            // note 12", "infra notes 30-35 and accompanying text", ...
            cross_reference: Regex::new(
                r"(?i)^[\s*_]*(?:see\s+)?(?:also\s+)?(?:e\.g\.,?\s+)?(?:supra|infra)\s+(?:note|notes|part|section|§)\s*\d*",
            )
            .expect("cross-reference regex is valid"),
            // A volume/reporter shape means the chunk is a citation of its
            // own, not a bare cross-reference
            volume_reporter: Regex::new(r"\b\d+\s+[A-Z][A-Za-z.]*\.?\s*(?:2d|3d|4th)?\s+\d+")
                .expect("volume-reporter regex is valid"),
            cross_reference_max_words: config.cross_reference_max_words,
        }
    }

    /// Split on `;` and newlines outside protected ranges, then merge
    /// supplemental cross-references back into their predecessor.
    pub fn primary_split(&self, text: &str, protection: &ProtectionMap) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut chunk_start = 0;

        for (pos, c) in text.char_indices() {
            if (c == ';' || c == '\n') && !protection.is_protected(pos) {
                chunks.push(text[chunk_start..pos].to_string());
                chunk_start = pos + c.len_utf8();
            }
        }
        chunks.push(text[chunk_start..].to_string());

        let chunks: Vec<String> = chunks
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        self.merge_cross_references(chunks)
    }

    /// A chunk that is only a cross-reference to another note is appended to
    /// the previous chunk instead of standing alone: a reference that happens
    /// to follow a semicolon is not an independent citation.
    fn merge_cross_references(&self, chunks: Vec<String>) -> Vec<String> {
        let mut merged: Vec<String> = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            if self.is_supplemental_reference(&chunk) {
                if let Some(previous) = merged.last_mut() {
                    previous.push_str("; ");
                    previous.push_str(&chunk);
                    continue;
                }
            }
            merged.push(chunk);
        }

        merged
    }

    fn is_supplemental_reference(&self, chunk: &str) -> bool {
        self.cross_reference.is_match(chunk)
            && !self.volume_reporter.is_match(chunk)
            && chunk.split_whitespace().count() <= self.cross_reference_max_words
    }

    /// Split one chunk at signal words outside protected ranges.
    ///
    /// The paired closer ("with") never opens a new span: a matched
    /// compare/with pair stays one comparison group, validated as a block,
    /// and an unpaired "with" is ordinary prose.
    pub fn signal_subsplit(&self, chunk: &str) -> Vec<String> {
        let protection = protection::scan(chunk);
        let words = signals::tokenize(chunk);

        let mut boundaries: Vec<usize> = Vec::new();
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
                SignalKind::Introducer => {
                    if wi > 0 {
                        boundaries.push(self.boundary_start(chunk, m.start));
                    }
                }
                SignalKind::PairOpener => {
                    opener_matched = true;
                    if wi > 0 {
                        boundaries.push(self.boundary_start(chunk, m.start));
                    }
                }
                SignalKind::PairCloser => {
                    // Valid only after its opener, and even then the group
                    // stays whole; without the opener it is plain prose
                    if !opener_matched {
                        wi += 1;
                        continue;
                    }
                }
            }
            wi += m.word_count;
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

    /// Pull a boundary back over any emphasis markup directly attached to the
    /// signal word, so markers stay with the span they emphasize.
    fn boundary_start(&self, chunk: &str, signal_start: usize) -> usize {
        let mut start = signal_start;
        for (pos, c) in chunk[..signal_start].char_indices().rev() {
            if signals::is_emphasis_marker(c) {
                start = pos;
            } else {
                break;
            }
        }
        start
    }
}
