//! Retrying provider: per-attempt timeout with a bounded retry.
//!
//! Wraps any provider. Each attempt is cut off after `timeout`; transport
//! failures and timeouts are retried up to `max_retries` times. Every other
//! failure is returned as-is on the first occurrence.

use async_trait::async_trait;
use gemrelay_core::error::ProviderError;
use gemrelay_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

/// A provider that bounds latency and retries transient failures.
pub struct RetryingProvider {
    inner: Arc<dyn Provider>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl RetryingProvider {
    /// Wrap `inner` with a 30s timeout and a single retry.
    pub fn new(inner: Arc<dyn Provider>) -> Self {
        Self {
            inner,
            timeout: DEFAULT_TIMEOUT,
            max_retries: 1,
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Pause between a failed attempt and its retry.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    async fn attempt(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "Provider '{}' timed out after {:?}",
                self.inner.name(),
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl Provider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let total = self.max_retries + 1;
        let mut attempt = 1;

        loop {
            match self.attempt(request.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        info!(provider = %self.name(), attempt, "Retry succeeded");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < total => {
                    warn!(
                        provider = %self.name(),
                        attempt,
                        total,
                        error = %e,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.health_check()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "Health check timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays scripted outcomes, one per call; an entry of `None` hangs.
    struct ScriptedProvider {
        outcomes: Mutex<Vec<Option<Result<String, ProviderError>>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Option<Result<String, ProviderError>>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            let outcome = {
                *self.calls.lock().unwrap() += 1;
                self.outcomes.lock().unwrap().remove(0)
            };
            match outcome {
                Some(Ok(text)) => Ok(CompletionResponse {
                    text,
                    usage: None,
                    model: request.model,
                    finish_reason: None,
                }),
                Some(Err(e)) => Err(e),
                None => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("hung call should have been timed out")
                }
            }
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            prompt: "p".into(),
            generation: GenerationConfig::default(),
        }
    }

    fn wrap(inner: Arc<ScriptedProvider>) -> RetryingProvider {
        RetryingProvider::new(inner)
            .with_timeout(Duration::from_secs(5))
            .with_backoff(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_makes_one_call() {
        let inner = Arc::new(ScriptedProvider::new(vec![Some(Ok("ok".into()))]));
        let provider = wrap(inner.clone());

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.text, "ok");
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn network_error_is_retried_once() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            Some(Err(ProviderError::Network("reset".into()))),
            Some(Ok("second time lucky".into())),
        ]));
        let provider = wrap(inner.clone());

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.text, "second time lucky");
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            Some(Err(ProviderError::Network("one".into()))),
            Some(Err(ProviderError::Network("two".into()))),
            Some(Ok("never reached".into())),
        ]));
        let provider = wrap(inner.clone());

        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(msg) if msg == "two"));
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_errors_are_not_retried() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            Some(Err(ProviderError::AuthenticationFailed("bad key".into()))),
            Some(Ok("never reached".into())),
        ]));
        let provider = wrap(inner.clone());

        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_times_out_then_retries() {
        let inner = Arc::new(ScriptedProvider::new(vec![None, Some(Ok("fast".into()))]));
        let provider = wrap(inner.clone());

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.text, "fast");
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_hang_surfaces_timeout() {
        let inner = Arc::new(ScriptedProvider::new(vec![None, None]));
        let provider = wrap(inner.clone());

        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
        assert!(err.to_string().contains("scripted"));
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_fails_fast() {
        let inner = Arc::new(ScriptedProvider::new(vec![Some(Err(
            ProviderError::Timeout("slow".into()),
        ))]));
        let provider = wrap(inner.clone()).with_max_retries(0);

        assert!(provider.complete(request()).await.is_err());
        assert_eq!(inner.calls(), 1);
    }
}
