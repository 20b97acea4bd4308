//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the citation validation pipeline,
//! supporting multiple sources (files, environment variables, command line
//! arguments) with validation and type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables, CLI arguments
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, dependency verification
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration files
//! 4. Default values (lowest priority)
//!
//! ## Usage
//! ```rust,no_run
//! use citecheck::config::Config;
//!
//! let config = Config::from_file("citecheck.toml").unwrap();
//! println!("Workers: {}", config.orchestrator.worker_count);
//! ```

use crate::errors::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Citation splitter thresholds and toggles
    pub splitter: SplitterConfig,
    /// Rule corpus location and retrieval budgets
    pub corpus: CorpusConfig,
    /// External validation service endpoints and retry behavior
    pub validation: ValidationConfig,
    /// Worker pool and flow-control settings
    pub orchestrator: OrchestratorConfig,
    /// Logging and monitoring
    pub logging: LoggingConfig,
}

/// Citation splitter configuration
///
/// The cross-reference and narrative thresholds were tuned against a small
/// footnote sample; treat them as starting points and re-tune on a larger
/// corpus before relying on exact span counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Maximum word count for a chunk to qualify as a supplemental
    /// cross-reference that gets merged into the previous span
    pub cross_reference_max_words: usize,
    /// Minimum character count before a semicolon-free chunk is considered
    /// narrative
    pub narrative_min_chars: usize,
    /// Minimum sentence count before a semicolon-free chunk is considered
    /// narrative
    pub narrative_min_sentences: usize,
    /// Apply Unicode NFC normalization before splitting
    pub normalize_unicode: bool,
}

/// Rule corpus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Path to the two-tier rule corpus JSON file
    pub corpus_path: PathBuf,
    /// Maximum primary-tier rules retrieved per citation
    pub max_primary_rules: usize,
    /// Maximum general-tier rules retrieved per citation
    pub max_general_rules: usize,
}

/// External validation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Primary (job/poll-based) service
    pub primary: PrimaryServiceConfig,
    /// Fallback (synchronous) service
    pub fallback: FallbackServiceConfig,
}

/// Primary service: submit a job, then poll for completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryServiceConfig {
    /// API base URL
    pub base_url: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Per-call HTTP timeout in seconds
    pub timeout_seconds: u64,
    /// Poll backoff schedule
    pub poll: PollConfig,
}

/// Poll backoff schedule for the primary service
///
/// Intervals grow geometrically so fast completions are detected quickly
/// without hammering the service while waiting on slow ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// First poll interval in milliseconds
    pub initial_interval_ms: u64,
    /// Multiplier applied to the interval after each poll
    pub growth_factor: f64,
    /// Interval cap in milliseconds
    pub max_interval_ms: u64,
    /// Overall deadline for one job in milliseconds; expiry counts as a
    /// transient failure
    pub deadline_ms: u64,
}

/// Fallback service: a single synchronous check call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackServiceConfig {
    /// API base URL
    pub base_url: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Per-call HTTP timeout in seconds
    pub timeout_seconds: u64,
}

/// Worker pool and flow-control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Number of concurrent workers (kept small; the upstream services are
    /// rate-sensitive)
    pub worker_count: usize,
    /// Primary service attempts per pass
    pub primary_retry_budget: u32,
    /// Fallback service attempts per pass
    pub fallback_retry_budget: u32,
    /// Delay between successive worker launches in milliseconds
    pub startup_stagger_ms: u64,
    /// Length of the global cooldown window after any transient failure,
    /// in seconds
    pub cooldown_window_seconds: u64,
    /// Minimum delay before each external call while the cooldown window is
    /// active, in milliseconds
    pub min_call_gap_ms: u64,
}

/// Logging and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::from_file("citecheck.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| PipelineError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("CITECHECK_PRIMARY_URL") {
            self.validation.primary.base_url = url;
        }
        if let Ok(url) = std::env::var("CITECHECK_FALLBACK_URL") {
            self.validation.fallback.base_url = url;
        }
        if let Ok(key) = std::env::var("CITECHECK_API_KEY") {
            self.validation.primary.api_key = Some(key.clone());
            self.validation.fallback.api_key = Some(key);
        }
        if let Ok(path) = std::env::var("CITECHECK_CORPUS_PATH") {
            self.corpus.corpus_path = PathBuf::from(path);
        }
        if let Ok(workers) = std::env::var("CITECHECK_WORKERS") {
            self.orchestrator.worker_count =
                workers.parse().map_err(|_| PipelineError::Config {
                    message: "Invalid worker count in CITECHECK_WORKERS".to_string(),
                })?;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.orchestrator.worker_count == 0 {
            return Err(PipelineError::ValidationFailed {
                field: "orchestrator.worker_count".to_string(),
                reason: "Worker count cannot be zero".to_string(),
            });
        }

        if self.orchestrator.primary_retry_budget == 0
            || self.orchestrator.fallback_retry_budget == 0
        {
            return Err(PipelineError::ValidationFailed {
                field: "orchestrator.retry_budget".to_string(),
                reason: "Retry budgets must be at least 1".to_string(),
            });
        }

        if self.validation.primary.poll.growth_factor < 1.0 {
            return Err(PipelineError::ValidationFailed {
                field: "validation.primary.poll.growth_factor".to_string(),
                reason: "Poll growth factor must be >= 1.0".to_string(),
            });
        }

        if self.validation.primary.poll.initial_interval_ms
            > self.validation.primary.poll.max_interval_ms
        {
            return Err(PipelineError::ValidationFailed {
                field: "validation.primary.poll.initial_interval_ms".to_string(),
                reason: "Initial poll interval cannot exceed the interval cap".to_string(),
            });
        }

        if self.corpus.max_primary_rules == 0 && self.corpus.max_general_rules == 0 {
            return Err(PipelineError::ValidationFailed {
                field: "corpus.max_primary_rules".to_string(),
                reason: "At least one retrieval budget must be non-zero".to_string(),
            });
        }

        if self.splitter.narrative_min_sentences == 0 {
            return Err(PipelineError::ValidationFailed {
                field: "splitter.narrative_min_sentences".to_string(),
                reason: "Narrative sentence threshold must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            splitter: SplitterConfig {
                cross_reference_max_words: 8,
                narrative_min_chars: 200,
                narrative_min_sentences: 3,
                normalize_unicode: true,
            },
            corpus: CorpusConfig {
                corpus_path: PathBuf::from("./data/rules.json"),
                max_primary_rules: 5,
                max_general_rules: 10,
            },
            validation: ValidationConfig {
                primary: PrimaryServiceConfig {
                    base_url: "https://rulecheck.internal/api".to_string(),
                    api_key: None,
                    timeout_seconds: 30,
                    poll: PollConfig {
                        initial_interval_ms: 500,
                        growth_factor: 1.5,
                        max_interval_ms: 10_000,
                        deadline_ms: 120_000,
                    },
                },
                fallback: FallbackServiceConfig {
                    base_url: "https://rulecheck-sync.internal/api".to_string(),
                    api_key: None,
                    timeout_seconds: 60,
                },
            },
            orchestrator: OrchestratorConfig {
                worker_count: std::cmp::min(4, num_cpus::get()),
                primary_retry_budget: 2,
                fallback_retry_budget: 3,
                startup_stagger_ms: 2_000,
                cooldown_window_seconds: 60,
                min_call_gap_ms: 5_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.orchestrator.worker_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_growth_factor_below_one_rejected() {
        let mut config = Config::default();
        config.validation.primary.poll.growth_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = Config::default();
        let toml_str = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.orchestrator.worker_count,
            config.orchestrator.worker_count
        );
        assert_eq!(parsed.corpus.max_general_rules, config.corpus.max_general_rules);
    }
}
