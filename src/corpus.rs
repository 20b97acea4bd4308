//! # Rule Corpus Module
//!
//! ## Purpose
//! Loads the two-tier citation rule corpus and retrieves the rules most
//! relevant to a given citation text via keyword-overlap scoring.
//!
//! ## Input/Output Specification
//! - **Input**: Two-tier rule corpus JSON (loaded once at startup), citation text
//! - **Output**: Ranked rule sets per tier, bounded by per-tier budgets
//! - **Determinism**: Same text and corpus always yield the same rule set
//!
//! ## Key Features
//! - Priority tier searched and ranked before the general tier
//! - Stable declaration-order tie-breaking
//! - Fatal startup error on a malformed corpus (never a per-request error)
//! - Read-only after load, freely shared without locking

use crate::errors::{PipelineError, Result};
use crate::CitationSpan;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Rule priority tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleTier {
    /// Higher-priority override tier, always searched first
    Primary,
    /// General tier, fills the remaining budget
    General,
}

/// A single citation rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule identifier
    pub id: String,
    /// Priority tier
    pub tier: RuleTier,
    /// Keywords used for retrieval scoring
    pub keywords: HashSet<String>,
    /// Full rule text sent to the validation service
    pub body: String,
}

/// Rules retrieved for one validation attempt. Ephemeral; produced per
/// attempt and consulted by the evidence guard afterwards.
#[derive(Debug, Clone)]
pub struct RetrievedRuleSet {
    /// The citation span the rules were retrieved for
    pub span: CitationSpan,
    /// Primary-tier rules, ranked
    pub primary_rules: Vec<Rule>,
    /// General-tier rules, ranked
    pub general_rules: Vec<Rule>,
}

impl RetrievedRuleSet {
    /// Whether a rule id was part of this retrieval (either tier)
    pub fn contains_rule(&self, rule_id: &str) -> bool {
        self.primary_rules.iter().any(|r| r.id == rule_id)
            || self.general_rules.iter().any(|r| r.id == rule_id)
    }

    /// Total rule count across both tiers
    pub fn len(&self) -> usize {
        self.primary_rules.len() + self.general_rules.len()
    }

    /// Whether the retrieval found no rules at all
    pub fn is_empty(&self) -> bool {
        self.primary_rules.is_empty() && self.general_rules.is_empty()
    }
}

/// On-disk corpus file shape
#[derive(Debug, Deserialize)]
struct CorpusFile {
    primary: Vec<RuleEntry>,
    general: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    id: String,
    keywords: Vec<String>,
    body: String,
}

/// The loaded rule corpus. Read-only for the process lifetime.
pub struct RuleCorpus {
    primary: Vec<Rule>,
    general: Vec<Rule>,
    token_regex: Regex,
}

impl RuleCorpus {
    /// Load the corpus from a two-tier JSON file. A malformed corpus is a
    /// fatal startup error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::CorpusLoad {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;

        let file: CorpusFile =
            serde_json::from_str(&content).map_err(|e| PipelineError::CorpusLoad {
                path: path.display().to_string(),
                details: e.to_string(),
            })?;

        let primary = Self::build_tier(file.primary, RuleTier::Primary, path)?;
        let general = Self::build_tier(file.general, RuleTier::General, path)?;

        tracing::info!(
            primary = primary.len(),
            general = general.len(),
            "Rule corpus loaded"
        );

        Ok(Self {
            primary,
            general,
            token_regex: Regex::new(r"\b\w+\b").expect("token regex is valid"),
        })
    }

    fn build_tier(entries: Vec<RuleEntry>, tier: RuleTier, path: &Path) -> Result<Vec<Rule>> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(entries.len());

        for entry in entries {
            if !seen.insert(entry.id.clone()) {
                return Err(PipelineError::CorpusLoad {
                    path: path.display().to_string(),
                    details: format!("duplicate rule id '{}' in {:?} tier", entry.id, tier),
                });
            }
            if entry.body.trim().is_empty() {
                return Err(PipelineError::CorpusLoad {
                    path: path.display().to_string(),
                    details: format!("rule '{}' has an empty body", entry.id),
                });
            }
            rules.push(Rule {
                id: entry.id,
                tier,
                keywords: entry.keywords.into_iter().map(|k| k.to_lowercase()).collect(),
                body: entry.body,
            });
        }

        Ok(rules)
    }

    /// Retrieve the most relevant rules for a citation text.
    ///
    /// Primary-tier rules are scored and ranked first; the general tier fills
    /// its own budget. Ties break by corpus declaration order.
    pub fn retrieve(
        &self,
        span: &CitationSpan,
        max_primary: usize,
        max_general: usize,
    ) -> RetrievedRuleSet {
        let tokens = self.tokenize(&span.text);

        RetrievedRuleSet {
            span: span.clone(),
            primary_rules: Self::rank_tier(&self.primary, &tokens, max_primary),
            general_rules: Self::rank_tier(&self.general, &tokens, max_general),
        }
    }

    fn rank_tier(rules: &[Rule], tokens: &HashSet<String>, budget: usize) -> Vec<Rule> {
        let mut scored: Vec<(usize, &Rule)> = rules
            .iter()
            .map(|rule| {
                let overlap = rule.keywords.iter().filter(|k| tokens.contains(*k)).count();
                (overlap, rule)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort preserves declaration order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(budget)
            .map(|(_, rule)| rule.clone())
            .collect()
    }

    fn tokenize(&self, text: &str) -> HashSet<String> {
        self.token_regex
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// Rule counts per tier, for startup logging
    pub fn tier_sizes(&self) -> (usize, usize) {
        (self.primary.len(), self.general.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_span(text: &str) -> CitationSpan {
        CitationSpan {
            footnote_number: 1,
            index: 1,
            text: text.to_string(),
        }
    }

    fn write_corpus(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"{
        "primary": [
            {"id": "P1", "keywords": ["signal", "see"], "body": "Signal usage."},
            {"id": "P2", "keywords": ["reporter", "volume"], "body": "Reporter format."}
        ],
        "general": [
            {"id": "G1", "keywords": ["parenthetical"], "body": "Parenthetical style."},
            {"id": "G2", "keywords": ["see", "signal", "italics"], "body": "Signal italics."},
            {"id": "G3", "keywords": ["year"], "body": "Year placement."}
        ]
    }"#;

    #[test]
    fn test_load_and_tier_sizes() {
        let file = write_corpus(SAMPLE);
        let corpus = RuleCorpus::load(file.path()).unwrap();
        assert_eq!(corpus.tier_sizes(), (2, 3));
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let file = write_corpus(
            r#"{"primary": [
                {"id": "P1", "keywords": [], "body": "a"},
                {"id": "P1", "keywords": [], "body": "b"}
            ], "general": []}"#,
        );
        assert!(RuleCorpus::load(file.path()).is_err());
    }

    #[test]
    fn test_malformed_corpus_is_fatal() {
        let file = write_corpus("{ not json");
        assert!(RuleCorpus::load(file.path()).is_err());
    }

    #[test]
    fn test_retrieval_ranks_primary_before_general() {
        let file = write_corpus(SAMPLE);
        let corpus = RuleCorpus::load(file.path()).unwrap();
        let set = corpus.retrieve(&sample_span("See the signal before the reporter"), 5, 5);

        assert_eq!(set.primary_rules[0].id, "P1");
        assert!(set.contains_rule("G2"));
        assert!(!set.contains_rule("G3"));
    }

    #[test]
    fn test_retrieval_is_deterministic_with_stable_tiebreak() {
        let file = write_corpus(SAMPLE);
        let corpus = RuleCorpus::load(file.path()).unwrap();
        let span = sample_span("see parenthetical year");

        let first = corpus.retrieve(&span, 5, 1);
        let second = corpus.retrieve(&span, 5, 1);

        // G1 and G3 both score 1; declaration order keeps G1
        assert_eq!(first.general_rules[0].id, "G1");
        assert_eq!(
            first.general_rules.iter().map(|r| &r.id).collect::<Vec<_>>(),
            second.general_rules.iter().map(|r| &r.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_budget_bounds_results() {
        let file = write_corpus(SAMPLE);
        let corpus = RuleCorpus::load(file.path()).unwrap();
        let set = corpus.retrieve(&sample_span("see signal italics parenthetical year"), 1, 2);
        assert!(set.primary_rules.len() <= 1);
        assert!(set.general_rules.len() <= 2);
    }

    #[test]
    fn test_zero_overlap_returns_empty() {
        let file = write_corpus(SAMPLE);
        let corpus = RuleCorpus::load(file.path()).unwrap();
        let set = corpus.retrieve(&sample_span("nothing relevant here"), 5, 5);
        assert!(set.is_empty());
    }
}
