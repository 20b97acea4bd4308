//! # Report Module
//!
//! ## Purpose
//! Assembles the final validation report for the collaborating system: one
//! verdict per citation span in `(footnote_number, index)` order, plus run
//! statistics.
//!
//! ## Input/Output Specification
//! - **Input**: The concurrent result map and run counters
//! - **Output**: An ordered, serializable report; every span that entered
//!   the pipeline appears exactly once

use crate::ValidationResult;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Run-level statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Start time of the run
    pub started_at: DateTime<Utc>,
    /// End time of the run
    pub finished_at: DateTime<Utc>,
    /// Footnotes ingested
    pub total_footnotes: usize,
    /// Citation spans produced by the splitter
    pub total_spans: usize,
    /// Spans that received a service verdict
    pub succeeded: usize,
    /// Verdicts produced by the fallback service
    pub fallback_verdicts: usize,
    /// Jobs that consumed their retry-from-scratch pass
    pub retry_passes: usize,
    /// Spans flagged for manual review
    pub manual_review: usize,
    /// Results with at least one violation stripped by the evidence guard
    pub evidence_strips: usize,
    /// Transient service failures observed across the run
    pub transient_failures: usize,
    /// Wall-clock duration in seconds
    pub elapsed_seconds: f64,
}

impl RunStats {
    /// Validation rate in spans per second
    pub fn spans_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.total_spans as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

/// The final report handed to the collaborating system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// One verdict per span, ordered by `(footnote_number, index)`
    pub results: Vec<ValidationResult>,
    /// Run statistics
    pub stats: RunStats,
}

impl ValidationReport {
    /// Order results by span key, independent of worker completion order
    pub fn assemble(results: &DashMap<(u32, u32), ValidationResult>, stats: RunStats) -> Self {
        let mut ordered: Vec<ValidationResult> =
            results.iter().map(|entry| entry.value().clone()).collect();
        ordered.sort_by_key(|r| r.span.key());

        Self {
            results: ordered,
            stats,
        }
    }

    /// Results that need a human, in report order
    pub fn manual_review_results(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| r.needs_manual_review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CitationSpan;

    fn result(footnote: u32, index: u32, review: bool) -> ValidationResult {
        ValidationResult {
            span: CitationSpan {
                footnote_number: footnote,
                index,
                text: "cite".to_string(),
            },
            is_valid: !review,
            violations: Vec::new(),
            used_fallback: false,
            needs_manual_review: review,
        }
    }

    fn stats() -> RunStats {
        RunStats {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            total_footnotes: 2,
            total_spans: 3,
            succeeded: 2,
            fallback_verdicts: 0,
            retry_passes: 0,
            manual_review: 1,
            evidence_strips: 0,
            transient_failures: 0,
            elapsed_seconds: 1.5,
        }
    }

    #[test]
    fn test_assemble_orders_by_span_key() {
        let map = DashMap::new();
        map.insert((2, 1), result(2, 1, false));
        map.insert((1, 2), result(1, 2, true));
        map.insert((1, 1), result(1, 1, false));

        let report = ValidationReport::assemble(&map, stats());
        let keys: Vec<(u32, u32)> = report.results.iter().map(|r| r.span.key()).collect();
        assert_eq!(keys, vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_manual_review_iterator() {
        let map = DashMap::new();
        map.insert((1, 1), result(1, 1, false));
        map.insert((1, 2), result(1, 2, true));

        let report = ValidationReport::assemble(&map, stats());
        let flagged: Vec<(u32, u32)> =
            report.manual_review_results().map(|r| r.span.key()).collect();
        assert_eq!(flagged, vec![(1, 2)]);
    }

    #[test]
    fn test_spans_per_second() {
        assert!((stats().spans_per_second() - 2.0).abs() < 0.01);
    }
}
