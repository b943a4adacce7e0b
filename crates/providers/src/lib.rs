//! Remote completion providers for GemRelay.
//!
//! All providers implement the `gemrelay_core::Provider` trait.
//! [`build_from_config`] assembles the production stack: the Gemini client
//! wrapped in the retrying/timeout layer.

pub mod gemini;
pub mod retry;

pub use gemini::GeminiProvider;
pub use retry::RetryingProvider;

use gemrelay_config::{AppConfig, ConfigError};
use gemrelay_core::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider.
///
/// Fails with [`ConfigError::MissingCredential`] when no API key is set, so
/// callers can refuse to start instead of failing on every request.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let api_key = config.require_api_key()?;
    let settings = &config.provider;

    let gemini = GeminiProvider::new(api_key)
        .with_base_url(&settings.base_url)
        .with_model(&config.model);

    tracing::debug!(
        base_url = %settings.base_url,
        timeout_secs = settings.timeout_secs,
        max_retries = settings.max_retries,
        "Building Gemini provider"
    );

    Ok(Arc::new(
        RetryingProvider::new(Arc::new(gemini))
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_max_retries(settings.max_retries)
            .with_backoff(Duration::from_millis(settings.retry_backoff_ms)),
    ))
}
