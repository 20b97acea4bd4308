//! # Primary Validation Client
//!
//! ## Purpose
//! Client for the primary rule-checking service: submit a check job, then
//! poll its status until completion. Poll intervals start short and grow
//! geometrically up to a cap, so fast completions are detected quickly
//! without hammering the service while waiting on slow ones.
//!
//! ## Input/Output Specification
//! - **Input**: Citation span + retrieved rules, service endpoint config
//! - **Output**: `CheckOutcome`, or a classified transient/terminal error
//! - **Deadline**: One overall poll deadline per job; expiry is transient

use super::{classify_status, classify_transport_error, CheckOutcome, CheckRequest, RuleChecker, WireVerdict};
use crate::config::PrimaryServiceConfig;
use crate::corpus::RetrievedRuleSet;
use crate::errors::{PipelineError, Result};
use crate::CitationSpan;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const SERVICE_NAME: &str = "primary";

/// Job submission response
#[derive(Debug, Deserialize)]
struct JobSubmitResponse {
    job_id: String,
}

/// Job status response
#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: JobStatus,
    #[serde(default)]
    result: Option<WireVerdict>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum JobStatus {
    Pending,
    Running,
    Completed,
    Rejected,
    Failed,
}

/// Primary (job/poll-based) service client
pub struct PrimaryClient {
    config: PrimaryServiceConfig,
    client: Client,
}

impl PrimaryClient {
    /// Build the client; the per-call timeout applies to every submit and
    /// poll request independently.
    pub fn new(config: PrimaryServiceConfig) -> Result<Self> {
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

    async fn submit(&self, request: &CheckRequest) -> Result<String> {
        let url = format!("{}/v1/jobs", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport_error(SERVICE_NAME, self.config.timeout_seconds, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(SERVICE_NAME, status, response.text().await.unwrap_or_default()));
        }

        let submit: JobSubmitResponse =
            response.json().await.map_err(|e| PipelineError::ResponseParsing {
                service: SERVICE_NAME.to_string(),
                details: e.to_string(),
            })?;

        Ok(submit.job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<CheckOutcome> {
        let url = format!(
            "{}/v1/jobs/{}",
            self.config.base_url.trim_end_matches('/'),
            job_id
        );
        let deadline = Instant::now() + Duration::from_millis(self.config.poll.deadline_ms);
        let mut interval = Duration::from_millis(self.config.poll.initial_interval_ms);
        let cap = Duration::from_millis(self.config.poll.max_interval_ms);

        loop {
            sleep(interval).await;

            if Instant::now() >= deadline {
                return Err(PipelineError::PollDeadlineExceeded {
                    service: SERVICE_NAME.to_string(),
                    job_id: job_id.to_string(),
                    deadline_ms: self.config.poll.deadline_ms,
                });
            }

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| classify_transport_error(SERVICE_NAME, self.config.timeout_seconds, e))?;

            let http_status = response.status();
            if !http_status.is_success() {
                return Err(classify_status(
                    SERVICE_NAME,
                    http_status,
                    response.text().await.unwrap_or_default(),
                ));
            }

            let status: JobStatusResponse =
                response.json().await.map_err(|e| PipelineError::ResponseParsing {
                    service: SERVICE_NAME.to_string(),
                    details: e.to_string(),
                })?;

            match status.status {
                JobStatus::Completed => {
                    let verdict = status.result.ok_or_else(|| PipelineError::ResponseParsing {
                        service: SERVICE_NAME.to_string(),
                        details: "completed job carried no result".to_string(),
                    })?;
                    return Ok(verdict.into());
                }
                JobStatus::Rejected => {
                    return Err(PipelineError::TerminalRejection {
                        service: SERVICE_NAME.to_string(),
                        details: status.error.unwrap_or_else(|| "input rejected".to_string()),
                    });
                }
                JobStatus::Failed => {
                    return Err(PipelineError::Transient {
                        service: SERVICE_NAME.to_string(),
                        details: status.error.unwrap_or_else(|| "job failed".to_string()),
                    });
                }
                JobStatus::Pending | JobStatus::Running => {
                    tracing::trace!(job_id, next_poll_ms = interval.as_millis() as u64, "Job still running");
                }
            }

            interval = std::cmp::min(interval.mul_f64(self.config.poll.growth_factor), cap);
        }
    }
}

#[async_trait]
impl RuleChecker for PrimaryClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn validate(
        &self,
        span: &CitationSpan,
        rules: &RetrievedRuleSet,
    ) -> Result<CheckOutcome> {
        let request = CheckRequest::new(span, rules);
        tracing::debug!(
            footnote = span.footnote_number,
            index = span.index,
            rules = request.rules.len(),
            "Submitting check job"
        );

        let job_id = self.submit(&request).await?;
        self.poll(&job_id).await
    }
}

