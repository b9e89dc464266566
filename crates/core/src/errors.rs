//! Orchestration error taxonomy
//!
//! None of these cross a public entry point as a raised fault: the executor
//! converts each of them into a failed `ExecutionResult`.

use crate::domain::ExecutionResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Serializable error class carried in `metadata.error_kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown skill id. The only kind that walks the fallback chain.
    NotFound,
    /// Bad params. Terminal.
    ValidationFailed,
    /// Skill exceeded its budget. Terminal, never retried.
    Timeout,
    /// Skill body returned an error or panicked.
    ExecutionFault,
    /// Context enrichment failed; soft, the request proceeds.
    EnrichmentFailed,
    /// Skill ran and reported `success: false` itself.
    Reported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ExecutionFault => "execution_fault",
            ErrorKind::EnrichmentFailed => "enrichment_failed",
            ErrorKind::Reported => "reported",
        }
    }

    /// Whether a chat front end should render a generic apology
    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::ExecutionFault)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {field} - {reason}")]
    InvalidField { field: String, reason: String },

    #[error("{0}")]
    Custom(String),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised inside the orchestration core before they become results
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("Skill not found: {skill_id}")]
    NotFound { skill_id: String },

    #[error("Validation failed for {skill_id}: {source}")]
    ValidationFailed {
        skill_id: String,
        #[source]
        source: ValidationError,
    },

    #[error("Skill {skill_id} timed out after {}ms", .timeout.as_millis())]
    Timeout { skill_id: String, timeout: Duration },

    #[error("Skill {skill_id} failed: {message}")]
    ExecutionFault {
        skill_id: String,
        message: String,
        stack: Option<String>,
    },

    #[error("Context enrichment failed: {0}")]
    EnrichmentFailed(#[from] EnrichmentError),
}

impl SkillError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SkillError::NotFound { .. } => ErrorKind::NotFound,
            SkillError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            SkillError::Timeout { .. } => ErrorKind::Timeout,
            SkillError::ExecutionFault { .. } => ErrorKind::ExecutionFault,
            SkillError::EnrichmentFailed(_) => ErrorKind::EnrichmentFailed,
        }
    }

    /// Convert into the value-typed failure result
    pub fn into_result(self, skill_id: &str) -> ExecutionResult {
        let kind = self.kind();
        let message = match &self {
            // Expose the validation message itself so callers can show it verbatim
            SkillError::ValidationFailed { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        let result = ExecutionResult::failure(skill_id, kind, message);
        match self {
            SkillError::ExecutionFault {
                stack: Some(stack), ..
            } => result.with_meta("stack", stack),
            SkillError::Timeout { timeout, .. } => result.with_meta(
                "timeout_ms",
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
            _ => result,
        }
    }
}

/// Failure of the context-enrichment store
#[derive(Debug, Clone, Error)]
pub enum EnrichmentError {
    #[error("Tenant store unavailable: {0}")]
    Unavailable(String),

    #[error("Tenant lookup failed for {key}: {reason}")]
    Lookup { key: String, reason: String },
}

/// Failure of the logging sink. Callers are allowed to ignore it.
#[derive(Debug, Clone, Error)]
pub enum LogError {
    #[error("Log sink unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to record log entry: {0}")]
    Write(String),
}
