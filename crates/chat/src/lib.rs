//! Prompt assembly and conversation handling for GemRelay.
//!
//! - [`PromptManager`] runs a generate call end to end for one session
//! - [`SessionStore`] keeps one bounded history per session
//! - [`postprocess`] holds the response clean-up transforms

pub mod manager;
pub mod postprocess;
pub mod session;

pub use manager::{GenerationError, PromptManager};
pub use postprocess::{clean_response, reflow_numbered, strip_markdown};
pub use session::{SessionStore, SharedHistory};
