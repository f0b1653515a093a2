//! Offline pipeline routes: inspect the temporal context and instruction
//! block for a query, or validate an answer, without calling the model.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use consulta_prompt::{contextualize_query, validate_response, AssistantScope, TemporalClass};
use consulta_temporal::extract_temporal_context;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/temporal/context", post(get_context))
        .route("/temporal/validate", post(validate))
        .route("/temporal/scopes", get(list_scopes))
}

#[derive(Debug, Deserialize)]
struct ContextRequest {
    #[serde(default)]
    query: String,
    #[serde(default, rename = "assistantType")]
    assistant_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidateRequest {
    #[serde(default)]
    query: String,
    response: String,
}

async fn get_context(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContextRequest>,
) -> Json<serde_json::Value> {
    let scope = req
        .assistant_type
        .as_deref()
        .map(AssistantScope::resolve)
        .unwrap_or_else(AssistantScope::general);

    let contextualized =
        contextualize_query(&req.query, state.clock.as_ref(), state.timezone(), &scope);
    let class = TemporalClass::of(&contextualized.context);

    Json(serde_json::json!({
        "temporalContext": contextualized.context,
        "classification": class,
        "label": class.label(),
        "scope": scope,
        "prompt": contextualized.prompt,
    }))
}

async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Json<serde_json::Value> {
    let context = extract_temporal_context(&req.query, state.clock.as_ref(), state.timezone());
    let validation = validate_response(&req.response, &context);

    Json(serde_json::json!({
        "temporalContext": context,
        "validation": validation,
    }))
}

async fn list_scopes() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "scopes": AssistantScope::catalog() }))
}
