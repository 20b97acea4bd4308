//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the citation validation pipeline, providing
//! structured error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various system components
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Configuration, Corpus, Splitting, Validation, Orchestration
//!
//! ## Key Features
//! - Hierarchical error types with detailed context
//! - Automatic error conversion and chaining
//! - Recoverability classification driving the retry logic
//! - Structured logging integration
//!
//! ## Usage
//! ```rust
//! use citecheck::errors::{Result, PipelineError};
//!
//! fn load_operation() -> Result<()> {
//!     Err(PipelineError::CorpusLoad {
//!         path: "rules.json".to_string(),
//!         details: "missing tier field".to_string(),
//!     })
//! }
//! ```

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Comprehensive error types for the citation validation pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration errors — fatal at startup
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Rule corpus failed to load or parse — fatal at startup
    #[error("Failed to load rule corpus from {path}: {details}")]
    CorpusLoad { path: String, details: String },

    /// Validation errors for configuration fields
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Transient failure from an external validation service
    #[error("Transient failure from {service}: {details}")]
    Transient { service: String, details: String },

    /// The external service explicitly rejected the input as unusable
    #[error("{service} rejected the citation as unusable: {details}")]
    TerminalRejection { service: String, details: String },

    /// An external call exceeded its per-call timeout
    #[error("Call to {service} timed out after {timeout_ms}ms")]
    CallTimeout { service: String, timeout_ms: u64 },

    /// A poll loop ran past its overall deadline without the job completing
    #[error("Job {job_id} on {service} did not complete within {deadline_ms}ms")]
    PollDeadlineExceeded {
        service: String,
        job_id: String,
        deadline_ms: u64,
    },

    /// The service returned a payload we could not interpret
    #[error("Failed to parse response from {service}: {details}")]
    ResponseParsing { service: String, details: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PipelineError {
    /// Check if the error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            PipelineError::Transient { .. }
            | PipelineError::CallTimeout { .. }
            | PipelineError::PollDeadlineExceeded { .. } => true,
            // A transport-level reqwest failure (connect/timeout) is retryable
            PipelineError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Config { .. } | PipelineError::ValidationFailed { .. } => {
                "configuration"
            }
            PipelineError::CorpusLoad { .. } => "corpus",
            PipelineError::Transient { .. }
            | PipelineError::TerminalRejection { .. }
            | PipelineError::CallTimeout { .. }
            | PipelineError::PollDeadlineExceeded { .. }
            | PipelineError::ResponseParsing { .. }
            | PipelineError::Http(_) => "validation",
            PipelineError::Json(_) | PipelineError::Toml(_) | PipelineError::Io(_) => "io",
            PipelineError::Internal { .. } => "generic",
        }
    }
}

// Helper macro for common error patterns
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::PipelineError::Internal {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::PipelineError::Internal {
            message: format!($fmt, $($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        let transient = PipelineError::Transient {
            service: "primary".to_string(),
            details: "503".to_string(),
        };
        assert!(transient.is_recoverable());

        let terminal = PipelineError::TerminalRejection {
            service: "fallback".to_string(),
            details: "unparseable citation".to_string(),
        };
        assert!(!terminal.is_recoverable());

        let corpus = PipelineError::CorpusLoad {
            path: "rules.json".to_string(),
            details: "bad json".to_string(),
        };
        assert!(!corpus.is_recoverable());
    }

    #[test]
    fn test_categories() {
        let timeout = PipelineError::CallTimeout {
            service: "primary".to_string(),
            timeout_ms: 30_000,
        };
        assert_eq!(timeout.category(), "validation");

        let config = PipelineError::Config {
            message: "bad".to_string(),
        };
        assert_eq!(config.category(), "configuration");
    }
}
