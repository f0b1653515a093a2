//! Chat routes: temporal-context pipeline around the completion endpoint.
//!
//! Each turn: extract the query's temporal context, build the instruction
//! block, call the model, validate the answer against the same context.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use consulta_chat::providers::{self, StreamChunk};
use consulta_chat::types::*;
use consulta_chat::config::{clamp_max_tokens, clamp_temperature};
use consulta_chat::{build_messages, ResolvedModel};
use consulta_prompt::{
    contextualize_query, validate_response, AssistantScope, ContextualizedPrompt,
    ValidationResult,
};

use crate::state::AppState;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/status", get(get_status))
        .route("/chat", post(chat))
        .route("/chat/stream", post(stream_chat))
        .route("/chat/config", get(get_config).put(update_config))
        .route("/chat/config/test", post(test_key))
}

// ---------------------------------------------------------------
// Status
// ---------------------------------------------------------------

async fn get_status(State(state): State<Arc<AppState>>) -> Json<ChatStatus> {
    let config = state.llm_config.read();
    let resolved = config.resolve();

    Json(ChatStatus {
        llm_available: resolved.is_some(),
        default_model: resolved.map(|r| r.model),
        available_models: config.available_models(),
        timezone: state.timezone().to_string(),
    })
}

// ---------------------------------------------------------------
// Turn preparation
// ---------------------------------------------------------------

/// Everything computed before the model is called.
struct PreparedTurn {
    contextualized: ContextualizedPrompt,
    messages: Vec<ChatMessage>,
    target: ResolvedModel,
    temperature: f64,
    max_tokens: usize,
}

/// Why a turn could not be prepared.
type TurnError = (StatusCode, &'static str);

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": error.into() }))).into_response()
}

fn prepare_turn(state: &AppState, req: &ChatRequest) -> Result<PreparedTurn, TurnError> {
    if req.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message is required"));
    }

    let (mut target, temperature, max_tokens) = {
        let config = state.llm_config.read();
        match config.resolve() {
            Some(resolved) => (resolved, config.temperature, config.max_tokens),
            None => {
                return Err((StatusCode::SERVICE_UNAVAILABLE, "No LLM provider configured"));
            }
        }
    };
    if let Some(model) = &req.model {
        target.model = model.clone();
    }

    let scope = AssistantScope::resolve(&req.assistant_type);
    let contextualized =
        contextualize_query(&req.message, state.clock.as_ref(), state.timezone(), &scope);

    info!(
        "Chat turn: assistant={} target={} historical={} future={} current={}",
        scope.key,
        contextualized.context.formatted_target(),
        contextualized.context.is_historical(),
        contextualized.context.is_future(),
        contextualized.context.is_current_data(),
    );

    let messages = build_messages(
        &contextualized.prompt,
        req.context_prompt.as_deref(),
        &req.history,
        &req.message,
    );

    Ok(PreparedTurn {
        contextualized,
        messages,
        target,
        temperature: req.temperature.map_or(temperature, clamp_temperature),
        max_tokens: req.max_tokens.map_or(max_tokens, clamp_max_tokens),
    })
}

fn log_validation(validation: &ValidationResult) {
    if !validation.is_valid {
        warn!("Response failed contract checks: {:?}", validation.issues);
    }
}

// ---------------------------------------------------------------
// Non-streaming chat
// ---------------------------------------------------------------

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    let start = Instant::now();

    let turn = match prepare_turn(&state, &req) {
        Ok(turn) => turn,
        Err((status, error)) => return error_response(status, error),
    };

    let completion = match providers::complete(
        &state.http,
        &turn.target,
        turn.messages,
        turn.temperature,
        turn.max_tokens,
    )
    .await
    {
        Ok(c) => c,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let validation = validate_response(&completion.text, &turn.contextualized.context);
    log_validation(&validation);

    let response = ChatResponse {
        message: completion.text,
        model: turn.target.model,
        temporal_context: turn.contextualized.context,
        validation,
        tokens_used: completion.tokens_used,
        duration: start.elapsed().as_millis() as u64,
    };

    (StatusCode::OK, Json(response)).into_response()
}

// ---------------------------------------------------------------
// Streaming chat (SSE)
// ---------------------------------------------------------------

fn sse_event(event: &StreamEvent) -> Event {
    Event::default().data(serde_json::to_string(event).unwrap_or_default())
}

fn single_event_stream(event: StreamEvent) -> SseStream {
    Box::pin(async_stream::stream! {
        yield Ok::<_, Infallible>(sse_event(&event));
    })
}

async fn stream_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Sse<SseStream> {
    let start = Instant::now();

    let turn = match prepare_turn(&state, &req) {
        Ok(turn) => turn,
        Err((_, error)) => {
            return Sse::new(single_event_stream(StreamEvent::Error {
                error: error.into(),
            }));
        }
    };

    let PreparedTurn {
        contextualized,
        messages,
        target,
        temperature,
        max_tokens,
    } = turn;

    let llm_stream = providers::stream_chat_completion(
        &state.http,
        &target,
        messages,
        temperature,
        max_tokens,
    );
    let model = target.model;

    let sse_stream: SseStream = Box::pin(async_stream::stream! {
        let context = contextualized.context;

        // First: the temporal context the prompt was built from
        yield Ok::<_, Infallible>(sse_event(&StreamEvent::Context {
            temporal_context: context.clone(),
        }));

        let mut full_response = String::new();
        let mut llm_stream = llm_stream;

        while let Some(chunk) = llm_stream.next().await {
            match chunk {
                StreamChunk::Token(text) => {
                    full_response.push_str(&text);
                    yield Ok(sse_event(&StreamEvent::Token { content: text }));
                }
                StreamChunk::Done { tokens_used } => {
                    let validation = validate_response(&full_response, &context);
                    log_validation(&validation);
                    yield Ok(sse_event(&StreamEvent::Validation { validation }));

                    let duration = start.elapsed().as_millis() as u64;
                    yield Ok(sse_event(&StreamEvent::Done {
                        model: model.clone(),
                        tokens_used,
                        duration,
                    }));
                    // Final [DONE] marker
                    yield Ok(Event::default().data("[DONE]".to_string()));
                    return;
                }
                StreamChunk::Error(e) => {
                    yield Ok(sse_event(&StreamEvent::Error { error: e }));
                    return;
                }
            }
        }
    });

    Sse::new(sse_stream)
}

// ---------------------------------------------------------------
// Config
// ---------------------------------------------------------------

async fn get_config(State(state): State<Arc<AppState>>) -> Json<LLMConfigResponse> {
    let config = state.llm_config.read();
    Json(config.to_response())
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LLMConfigUpdate>,
) -> Response {
    let mut config = state.llm_config.write();
    config.apply_update(&update);

    if let Err(e) = config.save() {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save config: {}", e),
        );
    }

    (StatusCode::OK, Json(config.to_response())).into_response()
}

async fn test_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TestKeyRequest>,
) -> Json<serde_json::Value> {
    let base_url = req
        .base_url
        .clone()
        .unwrap_or_else(|| state.llm_config.read().base_url.clone());

    match providers::test_api_key(&base_url, &req.api_key).await {
        Ok(()) => Json(serde_json::json!({ "success": true })),
        Err(e) => Json(serde_json::json!({ "success": false, "error": e })),
    }
}
