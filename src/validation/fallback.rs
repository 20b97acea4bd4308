//! # Fallback Validation Client
//!
//! ## Purpose
//! Client for the secondary rule-checking service: a single synchronous
//! check call per citation. Always given the locally retrieved rule set,
//! never the full corpus, to bound the cost of each call.

use super::{
    classify_status, classify_transport_error, CheckOutcome, CheckRequest, RuleChecker,
    WireVerdict,
};
use crate::config::FallbackServiceConfig;
use crate::corpus::RetrievedRuleSet;
use crate::errors::{PipelineError, Result};
use crate::CitationSpan;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const SERVICE_NAME: &str = "fallback";

/// Fallback (synchronous) service client
pub struct FallbackClient {
    config: FallbackServiceConfig,
    client: Client,
}

impl FallbackClient {
    pub fn new(config: FallbackServiceConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Token {}", api_key)
                    .parse()
                    .map_err(|e| PipelineError::Config {
                        message: format!("Invalid API key format: {}", e),
                    })?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .user_agent("citecheck/0.1")
            .build()
            .map_err(|e| PipelineError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl RuleChecker for FallbackClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn validate(
        &self,
        span: &CitationSpan,
        rules: &RetrievedRuleSet,
    ) -> Result<CheckOutcome> {
        let request = CheckRequest::new(span, rules);
        let url = format!("{}/v1/check", self.config.base_url.trim_end_matches('/'));

        tracing::debug!(
            footnote = span.footnote_number,
            index = span.index,
            rules = request.rules.len(),
            "Running synchronous check"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(SERVICE_NAME, self.config.timeout_seconds, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(
                SERVICE_NAME,
                status,
                response.text().await.unwrap_or_default(),
            ));
        }

        let verdict: WireVerdict =
            response
                .json()
                .await
                .map_err(|e| PipelineError::ResponseParsing {
                    service: SERVICE_NAME.to_string(),
                    details: e.to_string(),
                })?;

        Ok(verdict.into())
    }
}
