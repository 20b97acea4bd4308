//! # Validation Services Module
//!
//! ## Purpose
//! Defines the common interface for external rule-checking services and
//! provides the two concrete clients: the primary job/poll-based service and
//! the synchronous fallback service.
//!
//! ## Input/Output Specification
//! - **Input**: One citation span plus the locally retrieved rule set
//! - **Output**: A check outcome (valid / violations), or a classified error
//! - **Error classes**: transient (retryable), terminal rejection, timeout
//!
//! ## Architecture
//! - `RuleChecker` trait: common interface for both tiers
//! - `primary.rs`: submit-then-poll client with geometric poll backoff
//! - `fallback.rs`: single synchronous call, always given local rules only
//!
//! The orchestrator owns retry budgets and cooldown; clients only classify
//! failures.

pub mod fallback;
pub mod primary;

use crate::corpus::{RetrievedRuleSet, Rule, RuleTier};
use crate::errors::Result;
use crate::{CitationSpan, Violation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use fallback::FallbackClient;
pub use primary::PrimaryClient;

/// Outcome of one successful check call. Violations are raw service output;
/// the orchestrator's evidence guard filters them before acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Whether the service judged the citation valid
    pub is_valid: bool,
    /// Violations reported by the service
    pub violations: Vec<Violation>,
}

/// Trait for external rule-checking services
#[async_trait]
pub trait RuleChecker: Send + Sync {
    /// Service name used in logs and error context
    fn name(&self) -> &str;

    /// Check one citation span against the supplied rules. Blocking from the
    /// caller's perspective; transient failures and terminal rejections are
    /// distinguished through the error type.
    async fn validate(&self, span: &CitationSpan, rules: &RetrievedRuleSet)
        -> Result<CheckOutcome>;
}

/// Wire payload for a check request, shared by both services
#[derive(Debug, Serialize)]
pub(crate) struct CheckRequest {
    pub request_id: Uuid,
    pub footnote_number: u32,
    pub citation_index: u32,
    pub citation_text: String,
    pub rules: Vec<WireRule>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireRule {
    pub id: String,
    pub tier: RuleTier,
    pub body: String,
}

/// Service verdict payload
#[derive(Debug, Deserialize)]
pub(crate) struct WireVerdict {
    pub is_valid: bool,
    #[serde(default)]
    pub violations: Vec<WireViolation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireViolation {
    pub rule_id: String,
    pub description: String,
    #[serde(default)]
    pub evidence_quote: String,
}

impl CheckRequest {
    /// Build a request from a span and its retrieved rules. Primary-tier
    /// rules come first so the service sees them in priority order.
    pub(crate) fn new(span: &CitationSpan, rules: &RetrievedRuleSet) -> Self {
        let wire_rules = rules
            .primary_rules
            .iter()
            .chain(rules.general_rules.iter())
            .map(|r: &Rule| WireRule {
                id: r.id.clone(),
                tier: r.tier,
                body: r.body.clone(),
            })
            .collect();

        Self {
            request_id: Uuid::new_v4(),
            footnote_number: span.footnote_number,
            citation_index: span.index,
            citation_text: span.text.clone(),
            rules: wire_rules,
        }
    }
}

/// Map a transport-level failure to the pipeline taxonomy
pub(crate) fn classify_transport_error(
    service: &str,
    timeout_seconds: u64,
    err: reqwest::Error,
) -> crate::errors::PipelineError {
    use crate::errors::PipelineError;
    if err.is_timeout() {
        PipelineError::CallTimeout {
            service: service.to_string(),
            timeout_ms: timeout_seconds * 1_000,
        }
    } else {
        PipelineError::Transient {
            service: service.to_string(),
            details: err.to_string(),
        }
    }
}

/// Map an HTTP status to the pipeline taxonomy: 422 is an explicit terminal
/// rejection; every other non-success status is treated as transient so the
/// retry path decides its fate.
pub(crate) fn classify_status(
    service: &str,
    status: reqwest::StatusCode,
    body: String,
) -> crate::errors::PipelineError {
    use crate::errors::PipelineError;
    if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
        PipelineError::TerminalRejection {
            service: service.to_string(),
            details: body,
        }
    } else {
        PipelineError::Transient {
            service: service.to_string(),
            details: format!("HTTP {}: {}", status, body),
        }
    }
}

impl From<WireVerdict> for CheckOutcome {
    fn from(verdict: WireVerdict) -> Self {
        Self {
            is_valid: verdict.is_valid,
            violations: verdict
                .violations
                .into_iter()
                .map(|v| Violation {
                    rule_id: v.rule_id,
                    description: v.description,
                    evidence_quote: v.evidence_quote,
                })
                .collect(),
        }
    }
}
