//! Error types for the triage pipeline.
//!
//! Only conditions that abort a run are errors. Degraded scoring, data
//! inconsistencies and duplicate content are recorded as quality events on
//! the run telemetry instead.

use thiserror::Error;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The project source could not deliver the portfolio.
    #[error("project source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// The run was cancelled before all projects were scored.
    #[error("analysis cancelled")]
    Cancelled,

    /// The pipeline was configured with invalid settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Whether running the same analysis again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::SourceUnavailable(e) => e.is_retryable(),
            AnalysisError::Cancelled => true,
            AnalysisError::Config(_) => false,
        }
    }
}

/// Errors raised by a project source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("request to {url} was rejected with status {status}")]
    Unauthorized { url: String, status: u16 },

    #[error("portfolio {0} not found")]
    NotFound(String),

    #[error("source returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed source data: {0}")]
    Malformed(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    /// Connectivity problems and server-side errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Unreachable { .. } => true,
            SourceError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Errors raised by a score provider for a single call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to model endpoint at {0}")]
    Connect(String),

    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Client errors other than rate limiting will not improve on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Api { status, .. } => *status >= 500 || *status == 429,
            ProviderError::InvalidResponse(_) => false,
            _ => true,
        }
    }
}
