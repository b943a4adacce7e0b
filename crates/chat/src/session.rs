//! Session store: one isolated, lock-protected history per conversation.
//!
//! The map itself sits behind a `std::sync::Mutex` that is only held for
//! lookups. Each history has its own `tokio::sync::Mutex`, which the prompt
//! manager holds across the whole read → remote call → append sequence.

use gemrelay_core::{ConversationHistory, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

/// Shared handle to one session's history.
pub type SharedHistory = Arc<AsyncMutex<ConversationHistory>>;

struct Slot {
    history: SharedHistory,
    last_used: u64,
}

struct Inner {
    slots: HashMap<SessionId, Slot>,
    clock: u64,
}

/// Bounded map of session id to conversation history.
///
/// When full, creating a new session drops the least recently used idle
/// one. The shared default session is never dropped, and neither is a
/// session whose history handle is still held by a caller. If every
/// candidate is busy the store briefly grows past `max_sessions`.
pub struct SessionStore {
    inner: Mutex<Inner>,
    history_limit: usize,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(history_limit: usize, max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                clock: 0,
            }),
            history_limit,
            max_sessions: max_sessions.max(1),
        }
    }

    /// The history for `id`, created empty on first use.
    pub fn get_or_create(&self, id: &SessionId) -> SharedHistory {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.clock += 1;
        let now = inner.clock;

        if let Some(slot) = inner.slots.get_mut(id) {
            slot.last_used = now;
            return slot.history.clone();
        }

        if inner.slots.len() >= self.max_sessions {
            let victim = inner
                .slots
                .iter()
                .filter(|(key, slot)| !key.is_default() && Arc::strong_count(&slot.history) == 1)
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());

            match victim {
                Some(oldest) => {
                    inner.slots.remove(&oldest);
                    debug!(session = %oldest, "Evicted least recently used session");
                }
                None => debug!(
                    sessions = inner.slots.len(),
                    "No idle session to evict, store over capacity"
                ),
            }
        }

        let history: SharedHistory = Arc::new(AsyncMutex::new(ConversationHistory::with_limit(
            self.history_limit,
        )));
        inner.slots.insert(
            id.clone(),
            Slot {
                history: history.clone(),
                last_used: now,
            },
        );
        debug!(session = %id, "Created session");
        history
    }

    /// The history for `id` if the session exists. Does not touch recency.
    pub fn get(&self, id: &SessionId) -> Option<SharedHistory> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.slots.get(id).map(|slot| slot.history.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
