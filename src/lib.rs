//! # Citation Parsing & Concurrent Validation Pipeline
//!
//! ## Overview
//! This library ingests footnotes from legal documents, splits each footnote's
//! raw text into discrete citation units, and validates every unit against a
//! prioritized rule corpus through an external semantic rule-checking service.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `splitter`: Turns one footnote string into an ordered list of citation spans
//! - `corpus`: Two-tier rule set with keyword-based retrieval
//! - `checks`: Pure, local style checks run before any external call
//! - `validation`: Clients for the primary (job/poll) and fallback (synchronous) services
//! - `orchestrator`: Bounded worker pool with retry queue and global cooldown
//! - `report`: Final per-footnote report assembly
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Ordered footnote records (number + raw text), a static rule corpus
//! - **Output**: One validation verdict per citation span, keyed by
//!   `(footnote_number, index)`; unresolved spans are flagged for manual
//!   review, never dropped
//!
//! ## Usage
//! ```rust,no_run
//! use citecheck::{Config, Footnote, corpus::RuleCorpus, orchestrator::Orchestrator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::from_file("citecheck.toml")?);
//!     let corpus = Arc::new(RuleCorpus::load(&config.corpus.corpus_path)?);
//!     let orchestrator = Orchestrator::new(config, corpus)?;
//!     let footnotes = vec![Footnote { number: 1, raw_text: "See Smith v. Jones, 1 F.3d 1 (1st Cir. 1990).".into() }];
//!     let report = orchestrator.run(footnotes).await?;
//!     println!("{} spans validated", report.results.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod corpus;
pub mod splitter;
pub mod checks;
pub mod validation;
pub mod orchestrator;
pub mod report;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{PipelineError, Result};
pub use report::ValidationReport;
pub use splitter::CitationSplitter;

use serde::{Deserialize, Serialize};

/// One footnote from a legal document. Immutable input; one per document
/// location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    /// Footnote number as it appears in the document
    pub number: u32,
    /// Raw footnote text, with inline emphasis encoded as lightweight
    /// markers (`*`, `_`) the splitter treats as transparent
    pub raw_text: String,
}

/// A single citation unit produced by the splitter. `index` is 1-based
/// position within the footnote's split output; order is significant because
/// later spans may be short-form references to earlier ones. Never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationSpan {
    /// Originating footnote number
    pub footnote_number: u32,
    /// 1-based position within the footnote
    pub index: u32,
    /// Citation text
    pub text: String,
}

impl CitationSpan {
    /// Key used for result collection and report ordering
    pub fn key(&self) -> (u32, u32) {
        (self.footnote_number, self.index)
    }
}

/// A single rule violation reported for a citation span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the violated rule
    pub rule_id: String,
    /// Human-readable description of the violation
    pub description: String,
    /// Quoted evidence from the citation text
    pub evidence_quote: String,
}

/// Final verdict for one citation span.
///
/// Invariant: every `rule_id` in `violations` corresponds to a rule actually
/// supplied to the checking attempt that produced this result (enforced by
/// the orchestrator's evidence guard).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The citation span this verdict applies to
    pub span: CitationSpan,
    /// Whether the citation passed all checks
    pub is_valid: bool,
    /// Violations found, deterministic checks first
    pub violations: Vec<Violation>,
    /// Whether the fallback service produced this verdict
    pub used_fallback: bool,
    /// Set when the span exhausted all attempts or a violation was stripped
    /// by the evidence guard
    pub needs_manual_review: bool,
}

impl ValidationResult {
    /// A verdict for a span no service could process; surfaced to a human
    /// instead of being dropped.
    pub fn manual_review(span: CitationSpan, used_fallback: bool) -> Self {
        Self {
            span,
            is_valid: false,
            violations: Vec::new(),
            used_fallback,
            needs_manual_review: true,
        }
    }
}
