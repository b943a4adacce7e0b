//! Conversation history and session identity.
//!
//! A [`ConversationHistory`] is the rolling window of prompt/response text
//! that gives the remote model its conversational context. It is a plain
//! value type; sharing and locking are the caller's business.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default bound on history entries (10 prompt/response exchanges).
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Name of the session used when a caller does not ask for one.
pub const DEFAULT_SESSION: &str = "default";

/// Identifier for one isolated conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the process-wide shared session.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_SESSION
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(DEFAULT_SESSION.to_string())
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered prompt/response entries, bounded by `limit`.
///
/// Entries alternate user prompt, model response. Whenever an append takes
/// the length past `limit`, the oldest entries are dropped first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    entries: VecDeque<String>,
    limit: usize,
}

impl ConversationHistory {
    /// Create an empty history with the default 20-entry bound.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create an empty history holding at most `limit` entries.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.saturating_add(2)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Owned copy of the entries, oldest first.
    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    /// Assemble the text sent to the remote model.
    ///
    /// All entries joined by `\n`, then `\n` and the new prompt, so the
    /// prompt always sits on its own line (an empty history yields
    /// `"\n" + prompt`).
    pub fn build_context(&self, prompt: &str) -> String {
        let joined_len: usize = self.entries.iter().map(|e| e.len() + 1).sum();
        let mut context = String::with_capacity(joined_len + prompt.len() + 1);
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                context.push('\n');
            }
            context.push_str(entry);
        }
        context.push('\n');
        context.push_str(prompt);
        context
    }

    /// Append one completed exchange: the prompt, then the response.
    ///
    /// Returns how many old entries were evicted to respect the bound.
    pub fn record_exchange(&mut self, prompt: impl Into<String>, response: impl Into<String>) -> usize {
        self.entries.push_back(prompt.into());
        self.entries.push_back(response.into());
        self.truncate()
    }

    /// Append a single entry, evicting the oldest if the bound is exceeded.
    pub fn push(&mut self, entry: impl Into<String>) -> usize {
        self.entries.push_back(entry.into());
        self.truncate()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn truncate(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.limit);
        if excess > 0 {
            self.entries.drain(..excess);
            tracing::trace!(evicted = excess, limit = self.limit, "History truncated");
        }
        excess
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}
