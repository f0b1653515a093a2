//! Chat routes against a local OpenAI-compatible endpoint that replays a
//! canned token stream. Clock frozen at 2025-01-08 10:00 Europe/Madrid.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use consulta_core::{ConsultaConfig, FixedClock};
use consulta_server::{build_router, AppState};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const VALID_ANSWER: &[&str] = &[
    "Datos a 01/01/2023 (Europe/Madrid): ",
    "el SMI era de 1.080 €.\n",
    "Fuentes: BOE.\n",
    "Aviso: orientación general.",
];

const ANSWER_WITHOUT_DISCLAIMER: &[&str] = &[
    "Datos a 01/01/2023 (Europe/Madrid): 1.080 €.\n",
    "Fuentes: BOE.",
];

struct CompletionStub {
    addr: std::net::SocketAddr,
    last_request: Arc<Mutex<Option<Value>>>,
}

impl CompletionStub {
    fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    fn last_request(&self) -> Value {
        self.last_request.lock().clone().unwrap_or(Value::Null)
    }
}

async fn spawn_stub(tokens: &[&str]) -> CompletionStub {
    let mut body: String = tokens
        .iter()
        .map(|t| format!("data: {}\n\n", json!({ "choices": [{ "delta": { "content": t } }] })))
        .collect();
    body.push_str("data: [DONE]\n\n");

    let last_request = Arc::new(Mutex::new(None));
    let recorded = last_request.clone();
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(req): Json<Value>| {
            let body = body.clone();
            let recorded = recorded.clone();
            async move {
                *recorded.lock() = Some(req);
                ([(header::CONTENT_TYPE, "text/event-stream")], body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    CompletionStub { addr, last_request }
}

fn test_state(base_url: &str) -> (TempDir, Arc<AppState>) {
    let dir = tempfile::tempdir().unwrap();
    let config = ConsultaConfig::from_vars(dir.path(), |_| None).unwrap();
    let clock = Arc::new(FixedClock::parse("2025-01-08T10:00:00+01:00").unwrap());

    let mut state = AppState::with_clock(config, clock);
    state.http = reqwest::Client::builder().no_proxy().build().unwrap();
    {
        let mut llm = state.llm_config.write();
        llm.api_key = Some("sk-test".into());
        llm.base_url = base_url.to_string();
        llm.model = "gpt-4o-mini".into();
    }
    (dir, Arc::new(state))
}

async fn post_json(state: &Arc<AppState>, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = build_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

/// `data:` payloads of an SSE body, in order.
fn sse_payloads(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim_start().to_string())
        .collect()
}

#[tokio::test]
async fn test_chat_returns_validated_answer() {
    let stub = spawn_stub(VALID_ANSWER).await;
    let (_dir, state) = test_state(&stub.base_url());

    let (status, body) = post_json(
        &state,
        "/api/chat",
        json!({ "message": "¿Cuál era el SMI en 2023?", "assistantType": "laboral" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["message"], VALID_ANSWER.concat());
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["tokensUsed"], 4);
    assert_eq!(body["temporalContext"]["targetDate"], "2023-01-01");
    assert_eq!(body["validation"]["isValid"], true);

    let sent = stub.last_request();
    assert_eq!(sent["stream"], true);
    let messages = sent["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"]
        .as_str()
        .unwrap()
        .contains("Fecha consultada: 01/01/2023"));
    assert_eq!(messages.last().unwrap()["content"], "¿Cuál era el SMI en 2023?");
}

#[tokio::test]
async fn test_chat_clamps_request_sampling() {
    let stub = spawn_stub(VALID_ANSWER).await;
    let (_dir, state) = test_state(&stub.base_url());

    let (status, _) = post_json(
        &state,
        "/api/chat",
        json!({ "message": "SMI en 2023", "temperature": 5.0, "maxTokens": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sent = stub.last_request();
    assert_eq!(sent["temperature"], 2.0);
    assert_eq!(sent["max_tokens"], 1);
}

#[tokio::test]
async fn test_stream_emits_context_tokens_validation_done() {
    let stub = spawn_stub(ANSWER_WITHOUT_DISCLAIMER).await;
    let (_dir, state) = test_state(&stub.base_url());

    let (status, body) = post_json(
        &state,
        "/api/chat/stream",
        json!({ "message": "¿Cuál era el SMI en 2023?" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let payloads = sse_payloads(&body);
    assert_eq!(payloads.len(), 6, "{payloads:?}");
    assert_eq!(payloads.last().unwrap(), "[DONE]");

    let events: Vec<Value> = payloads[..5]
        .iter()
        .map(|p| serde_json::from_str(p).unwrap())
        .collect();
    let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["context", "token", "token", "validation", "done"]);

    assert_eq!(events[0]["temporalContext"]["targetDate"], "2023-01-01");
    assert_eq!(events[0]["temporalContext"]["isHistorical"], true);

    let streamed: String = events[1..3]
        .iter()
        .map(|e| e["content"].as_str().unwrap())
        .collect();
    assert_eq!(streamed, ANSWER_WITHOUT_DISCLAIMER.concat());

    // Summary, sections and date are present; only the disclaimer is missing
    let validation = &events[3]["validation"];
    assert_eq!(validation["isValid"], false);
    assert_eq!(validation["issues"].as_array().unwrap().len(), 1);
    assert!(validation["issues"][0].as_str().unwrap().contains("aviso"));

    assert_eq!(events[4]["model"], "gpt-4o-mini");
    assert_eq!(events[4]["tokensUsed"], 2);
}

#[tokio::test]
async fn test_provider_failure_is_reported() {
    let stub = spawn_stub(VALID_ANSWER).await;
    let (_dir, state) = test_state(&format!("http://{}/missing", stub.addr));

    let (status, body) = post_json(&state, "/api/chat", json!({ "message": "SMI en 2023" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("404"));

    let (status, body) = post_json(
        &state,
        "/api/chat/stream",
        json!({ "message": "SMI en 2023" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let payloads = sse_payloads(&body);
    let kinds: Vec<String> = payloads
        .iter()
        .map(|p| serde_json::from_str::<Value>(p).unwrap()["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, ["context", "error"]);
}
