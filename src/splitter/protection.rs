//! # Protected Region Scanner
//!
//! ## Purpose
//! Single-pass scan over a footnote producing the byte ranges inside matched
//! parentheses or matched quotation marks, where delimiter and signal
//! splitting is suppressed.
//!
//! ## Key Features
//! - Parenthesis depth tracking; the outermost pair defines the range
//! - Straight and curly quotation delimiters
//! - Apostrophe disambiguation: a quote character with alphanumerics on both
//!   sides (O'Neal) never toggles quote state
//! - Unmatched openers protect through end of text (under-splitting bias)

/// Byte ranges protected from splitting, sorted and non-overlapping
#[derive(Debug, Clone, Default)]
pub struct ProtectionMap {
    ranges: Vec<(usize, usize)>,
}

impl ProtectionMap {
    /// Whether the byte at `pos` falls inside a protected range
    pub fn is_protected(&self, pos: usize) -> bool {
        // Ranges are sorted by start; binary search for the candidate range
        match self.ranges.binary_search_by(|(start, _)| start.cmp(&pos)) {
            Ok(_) => true,
            Err(0) => false,
            Err(i) => {
                let (start, end) = self.ranges[i - 1];
                pos >= start && pos < end
            }
        }
    }

    /// The protected ranges, for tests and diagnostics
    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    fn push(&mut self, start: usize, end: usize) {
        self.ranges.push((start, end));
    }

    fn normalize(&mut self) {
        self.ranges.sort_by_key(|(start, _)| *start);
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(self.ranges.len());
        for &(start, end) in &self.ranges {
            match merged.last_mut() {
                Some((_, last_end)) if start <= *last_end => {
                    *last_end = (*last_end).max(end);
                }
                _ => merged.push((start, end)),
            }
        }
        self.ranges = merged;
    }
}

/// Scan `text` once and return its protection map
pub fn scan(text: &str) -> ProtectionMap {
    let mut map = ProtectionMap::default();
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    let mut paren_depth: usize = 0;
    let mut paren_start: usize = 0;
    let mut double_open: Option<usize> = None;
    let mut single_open: Option<usize> = None;

    for (ci, &(pos, c)) in chars.iter().enumerate() {
        match c {
            '(' => {
                if paren_depth == 0 {
                    paren_start = pos;
                }
                paren_depth += 1;
            }
            ')' => {
                if paren_depth > 0 {
                    paren_depth -= 1;
                    if paren_depth == 0 {
                        map.push(paren_start, pos + c.len_utf8());
                    }
                }
            }
            '"' => {
                match double_open.take() {
                    Some(start) => map.push(start, pos + c.len_utf8()),
                    None => double_open = Some(pos),
                }
            }
            '\u{201C}' => {
                // Opening curly double quote
                if double_open.is_none() {
                    double_open = Some(pos);
                }
            }
            '\u{201D}' => {
                if let Some(start) = double_open.take() {
                    map.push(start, pos + c.len_utf8());
                }
            }
            '\'' | '\u{2018}' | '\u{2019}' => {
                if is_apostrophe(&chars, ci) {
                    continue;
                }
                match single_open.take() {
                    Some(start) => map.push(start, pos + c.len_utf8()),
                    None => {
                        // Only an opening-quote shape starts a single-quoted
                        // region; a trailing possessive apostrophe must not
                        if c != '\u{2019}' && looks_like_opener(&chars, ci) {
                            single_open = Some(pos);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // Unmatched openers protect through end of text
    if paren_depth > 0 {
        map.push(paren_start, text.len());
    }
    if let Some(start) = double_open {
        map.push(start, text.len());
    }
    if let Some(start) = single_open {
        map.push(start, text.len());
    }

    map.normalize();
    map
}

/// A quote character adjacent to alphanumerics on both sides is an
/// apostrophe, not a delimiter.
fn is_apostrophe(chars: &[(usize, char)], ci: usize) -> bool {
    let prev_alnum = ci > 0 && chars[ci - 1].1.is_alphanumeric();
    let next_alnum = ci + 1 < chars.len() && chars[ci + 1].1.is_alphanumeric();
    prev_alnum && next_alnum
}

/// An opening single quote has no alphanumeric before it and content after it
fn looks_like_opener(chars: &[(usize, char)], ci: usize) -> bool {
    let prev_ok = ci == 0 || !chars[ci - 1].1.is_alphanumeric();
    let next_ok = ci + 1 < chars.len() && !chars[ci + 1].1.is_whitespace();
    prev_ok && next_ok
}
