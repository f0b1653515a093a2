//! Chat-completion collaborator for the assistants.
//!
//! Wraps a single OpenAI-compatible `/chat/completions` endpoint: request and
//! response types of the `/api/chat` surface, persisted model configuration,
//! and token streaming. No retries are attempted here.

pub mod config;
pub mod messages;
pub mod providers;
pub mod types;

pub use config::{LLMConfig, ResolvedModel};
pub use messages::build_messages;
pub use types::*;
