//! Prompt manager: the generate path.
//!
//! For one session: build the context from history plus the new prompt,
//! ask the provider for a completion, clean the text, record the exchange.
//! The session's lock is held for the whole sequence, so exchanges within a
//! session are recorded in arrival order.

use std::sync::Arc;
use std::time::Instant;

use gemrelay_config::AppConfig;
use gemrelay_core::error::ProviderError;
use gemrelay_core::{CompletionRequest, GenerationConfig, Provider, SessionId};
use tracing::{info, warn};

use crate::postprocess;
use crate::session::SessionStore;

/// Failure of a single generate call.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Remote completion failed: {0}")]
    Remote(#[from] ProviderError),
}

/// Owns the conversation sessions and the provider used to extend them.
pub struct PromptManager {
    provider: Arc<dyn Provider>,
    model: String,
    generation: GenerationConfig,
    sessions: SessionStore,
}

impl PromptManager {
    /// Create a manager with default history bounds (20 entries, 1000 sessions).
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        generation: GenerationConfig,
    ) -> Self {
        let defaults = gemrelay_config::HistoryConfig::default();
        Self {
            provider,
            model: model.into(),
            generation,
            sessions: SessionStore::new(defaults.max_entries, defaults.max_sessions),
        }
    }

    /// Create a manager with model, sampling and history bounds from config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, &config.model, config.generation.clone())
            .with_history_bounds(config.history.max_entries, config.history.max_sessions)
    }

    /// Replace the session store with one using the given bounds.
    pub fn with_history_bounds(mut self, max_entries: usize, max_sessions: usize) -> Self {
        self.sessions = SessionStore::new(max_entries, max_sessions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Generate a reply to `prompt` within `session`.
    ///
    /// On success the prompt and the cleaned reply are appended to the
    /// session history (oldest entries evicted past the bound) and the
    /// cleaned reply is returned. On failure the history is untouched.
    pub async fn generate(&self, session: &SessionId, prompt: &str) -> Result<String, GenerationError> {
        let shared = self.sessions.get_or_create(session);
        let mut history = shared.lock().await;

        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: history.build_context(prompt),
            generation: self.generation.clone(),
        };

        let started = Instant::now();
        let response = self.provider.complete(request).await.map_err(|e| {
            warn!(
                session = %session,
                provider = %self.provider.name(),
                error = %e,
                "Completion failed, history left unchanged"
            );
            GenerationError::Remote(e)
        })?;

        let text = postprocess::clean_response(&response.text);
        let evicted = history.record_exchange(prompt, text.clone());

        info!(
            session = %session,
            model = %response.model,
            prompt_len = prompt.len(),
            response_len = text.len(),
            history_len = history.len(),
            evicted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generation complete"
        );

        Ok(text)
    }

    /// Snapshot of a session's entries, oldest first. Empty if unknown.
    pub async fn history(&self, session: &SessionId) -> Vec<String> {
        match self.sessions.get(session) {
            Some(shared) => shared.lock().await.to_vec(),
            None => Vec::new(),
        }
    }

    /// Forget a session's conversation.
    pub async fn reset(&self, session: &SessionId) {
        if let Some(shared) = self.sessions.get(session) {
            shared.lock().await.clear();
            info!(session = %session, "History reset");
        }
    }
}
