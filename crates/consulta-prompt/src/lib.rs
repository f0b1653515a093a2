//! Prompt contract for the chat assistants.
//!
//! The contextualizer turns a query and its `TemporalContext` into the
//! instruction block sent to the model; the validator checks the model's
//! answer against the same contract.

pub mod contextualize;
pub mod contract;
pub mod scope;
pub mod validate;

pub use contextualize::{
    build_contextual_prompt, contextualize, contextualize_query, ContextualizedPrompt,
    TemporalClass,
};
pub use scope::AssistantScope;
pub use validate::{validate_response, ValidationResult};
