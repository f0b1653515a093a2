//! Chat types matching the `/api/chat` surface used by the assistant widgets.

use consulta_prompt::ValidationResult;
use consulta_temporal::TemporalContext;
use serde::{Deserialize, Serialize};

/// Chat message in conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Incoming chat request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_assistant_type", rename = "assistantType")]
    pub assistant_type: String,
    /// Extra guidance from the widget (course or lesson context).
    #[serde(default, rename = "contextPrompt")]
    pub context_prompt: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    #[serde(rename = "maxTokens")]
    pub max_tokens: Option<usize>,
}

fn default_assistant_type() -> String {
    "general".into()
}

/// Non-streaming chat response.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub model: String,
    #[serde(rename = "temporalContext")]
    pub temporal_context: TemporalContext,
    pub validation: ValidationResult,
    #[serde(rename = "tokensUsed")]
    pub tokens_used: usize,
    pub duration: u64,
}

/// SSE stream event types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "context")]
    Context {
        #[serde(rename = "temporalContext")]
        temporal_context: TemporalContext,
    },
    #[serde(rename = "token")]
    Token { content: String },
    #[serde(rename = "validation")]
    Validation { validation: ValidationResult },
    #[serde(rename = "done")]
    Done {
        model: String,
        #[serde(rename = "tokensUsed")]
        tokens_used: usize,
        duration: u64,
    },
    #[serde(rename = "error")]
    Error { error: String },
}

/// Chat status response.
#[derive(Debug, Clone, Serialize)]
pub struct ChatStatus {
    #[serde(rename = "llmAvailable")]
    pub llm_available: bool,
    #[serde(rename = "defaultModel")]
    pub default_model: Option<String>,
    #[serde(rename = "availableModels")]
    pub available_models: Vec<String>,
    pub timezone: String,
}

/// LLM config response (key masked).
#[derive(Debug, Clone, Serialize)]
pub struct LLMConfigResponse {
    #[serde(rename = "apiKeyConfigured")]
    pub api_key_configured: bool,
    pub model: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub temperature: f64,
    #[serde(rename = "maxTokens")]
    pub max_tokens: usize,
}

/// LLM config update request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LLMConfigUpdate {
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    #[serde(rename = "maxTokens")]
    pub max_tokens: Option<usize>,
}

/// API key test request.
#[derive(Debug, Clone, Deserialize)]
pub struct TestKeyRequest {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hola"}"#).unwrap();
        assert_eq!(req.assistant_type, "general");
        assert!(req.context_prompt.is_none());
        assert!(req.history.is_empty());
    }

    #[test]
    fn test_chat_request_full() {
        let req: ChatRequest = serde_json::from_str(
            r#"{
                "message": "¿SMI en 2023?",
                "assistantType": "laboral",
                "contextPrompt": "Tema 4: salario",
                "history": [{"role": "user", "content": "hola"}],
                "maxTokens": 512
            }"#,
        )
        .unwrap();
        assert_eq!(req.assistant_type, "laboral");
        assert_eq!(req.context_prompt.as_deref(), Some("Tema 4: salario"));
        assert_eq!(req.history.len(), 1);
        assert_eq!(req.max_tokens, Some(512));
    }

    #[test]
    fn test_stream_event_tags() {
        let event = StreamEvent::Token {
            content: "Datos".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "token");
        assert_eq!(json["content"], "Datos");

        let event = StreamEvent::Validation {
            validation: ValidationResult::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "validation");
        assert_eq!(json["validation"]["isValid"], false);
    }
}
