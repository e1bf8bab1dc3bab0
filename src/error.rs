//! Error types for the Quill writing loop.

use crate::roles::TaskRole;
use thiserror::Error;

/// Errors surfaced by the writing loop and its backend.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("{role} task failed for instruction {instruction:?}: {source}")]
    TaskFailed {
        role: TaskRole,
        instruction: String,
        #[source]
        source: Box<WriterError>,
    },

    #[error("Task instruction cannot be empty")]
    EmptyInstruction,

    #[error("User request cannot be empty")]
    EmptyRequest,

    #[error("Budget exhausted: {0}")]
    BudgetExhausted(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WriterError {
    /// True for failures reported by the text-generation backend.
    pub fn is_backend(&self) -> bool {
        match self {
            WriterError::ProviderError(_)
            | WriterError::ProviderNotConfigured(_)
            | WriterError::ProviderRequestFailed(_)
            | WriterError::ProviderAuthFailed(_)
            | WriterError::ProviderRateLimit(_)
            | WriterError::ProviderModelNotFound(_) => true,
            WriterError::TaskFailed { source, .. } => source.is_backend(),
            _ => false,
        }
    }

    /// Rate limits and transport failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WriterError::ProviderRateLimit(_) | WriterError::ProviderRequestFailed(_)
        )
    }

    /// Budget exhaustion, possibly wrapped by a failed task.
    pub fn is_budget_exhausted(&self) -> bool {
        match self {
            WriterError::BudgetExhausted(_) => true,
            WriterError::TaskFailed { source, .. } => source.is_budget_exhausted(),
            _ => false,
        }
    }
}

impl From<config::ConfigError> for WriterError {
    fn from(err: config::ConfigError) -> Self {
        WriterError::ConfigError(err.to_string())
    }
}

/// Why a single planner response line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanLineError {
    #[error("expected `role;priority;instruction`, found {found} field(s)")]
    WrongFieldCount { found: usize },

    #[error("unknown role: {0:?}")]
    UnknownRole(String),

    #[error("priority is not an integer: {0:?}")]
    InvalidPriority(String),

    #[error("instruction is empty")]
    EmptyInstruction,
}
