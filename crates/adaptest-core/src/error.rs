//! Engine and provider error types.
//!
//! Every `EngineError` is raised before the session is mutated, so a caller
//! that receives one sees the session exactly as it was before the failing
//! call. `ProviderError` lives here so the cohort runner can downcast provider
//! failures and classify them for retry without string matching.

use thiserror::Error;

/// Errors raised while building or stepping an assessment session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Session bounds or ability inputs are unusable. Raised at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The answer channel produced a token other than `0` or `1`.
    #[error("invalid answer {token:?}: expected \"0\" or \"1\"")]
    InvalidAnswer { token: String },

    /// `step()` was called after the session terminated.
    #[error("session is closed")]
    SessionClosed,

    /// The answer channel reached end of input before the session finished.
    #[error("answer channel closed before the session finished")]
    AnswerChannelClosed,

    /// Reading from or prompting on the answer channel failed.
    #[error("answer channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Returns `true` if the same step may be retried after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::InvalidAnswer { .. })
    }
}

/// Errors that can occur when asking a provider for an ability estimate.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The service returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response body was not a usable estimate.
    #[error("invalid estimate: {0}")]
    InvalidEstimate(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::InvalidEstimate(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
