//! Error types for model calls

use stepwise_core::CoreError;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// How the decision loop treats a failed model call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFailureKind {
    /// The call did not finish in time
    Timeout,
    /// The call finished but produced no usable text
    Unavailable,
}

/// Errors that can occur during model calls
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error
    #[error("API error: {0}")]
    ApiError(String),

    /// Failed to parse API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Unsupported provider
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Retry after: {0:?}")]
    RateLimitExceeded(Option<u64>),

    /// The model returned an empty completion
    #[error("Model returned no text")]
    EmptyResponse,

    /// Timeout
    #[error("Request timed out")]
    Timeout,

    /// Generic error from stepwise-core
    #[error(transparent)]
    CoreError(#[from] CoreError),
}

impl ModelError {
    /// Create an API error
    pub fn api_error<S: Into<String>>(msg: S) -> Self {
        Self::ApiError(msg.into())
    }

    /// Create a parse error
    pub fn parse_error<S: Into<String>>(msg: S) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a config error
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if the HTTP layer should retry this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_) | Self::RateLimitExceeded(_) | Self::Timeout
        )
    }

    /// Collapse the error into the two failure modes the decision loop knows
    pub fn kind(&self) -> ModelFailureKind {
        match self {
            Self::Timeout => ModelFailureKind::Timeout,
            Self::HttpError(e) if e.is_timeout() => ModelFailureKind::Timeout,
            _ => ModelFailureKind::Unavailable,
        }
    }
}
