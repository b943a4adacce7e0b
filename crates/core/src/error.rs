//! Error types for the GemRelay domain.
//!
//! Uses `thiserror`. Callers check [`ProviderError::is_transient`] to
//! decide which failures are worth a retry.

use thiserror::Error;

/// Failures of the remote text-completion service.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Prompt blocked by provider: {0}")]
    Blocked(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Only transport-level failures qualify. Anything the remote service
    /// answered deliberately (quota, auth, bad request) is terminal.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}
