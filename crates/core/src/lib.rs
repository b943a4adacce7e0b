//! # GemRelay Core
//!
//! Domain types, traits, and error definitions for the GemRelay chat gateway.
//! This crate has no HTTP dependencies. It defines the model that the
//! provider, chat and gateway crates implement against.

pub mod error;
pub mod history;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::ProviderError;
pub use history::{ConversationHistory, SessionId, DEFAULT_HISTORY_LIMIT, DEFAULT_SESSION};
pub use provider::{CompletionRequest, CompletionResponse, GenerationConfig, Provider, Usage};
