//! Mock model provider that speaks the Anthropic and OpenAI streaming APIs
//!
//! Tests pre-configure responses via SharedBackendState before each request.
//! With nothing queued, each endpoint streams a short default reply.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::tests::helpers::{anthropic_sse, openai_sse};
use crate::types::{BackendState, MockResponse, ReceivedRequest, SharedBackendState};

/// Record the request and pop the next queued response
fn serve(
    state: &SharedBackendState,
    path: &str,
    headers: &HeaderMap,
    body: &[u8],
    default: fn() -> MockResponse,
) -> Response {
    let received = ReceivedRequest {
        path: path.to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect(),
        body: serde_json::from_slice(body).unwrap_or(serde_json::Value::Null),
    };

    let mock_response = {
        let mut state = state.lock().unwrap();
        state.received_requests.push(received);
        state.response_queue.pop_front().unwrap_or_else(default)
    };

    Response::builder()
        .status(mock_response.status)
        .header("Content-Type", &mock_response.content_type)
        .body(Body::from(mock_response.body))
        .unwrap()
        .into_response()
}

/// Handle POST /v1/messages (Anthropic)
async fn handle_messages(
    State(state): State<SharedBackendState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    serve(&state, "/v1/messages", &headers, &body, || {
        MockResponse::sse(anthropic_sse(&["Default ", "reply"], "end_turn"))
    })
}

/// Handle POST /v1/chat/completions (OpenAI)
async fn handle_chat_completions(
    State(state): State<SharedBackendState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    serve(&state, "/v1/chat/completions", &headers, &body, || {
        MockResponse::sse(openai_sse(&["Default ", "reply"], "stop"))
    })
}

/// Handle GET /health
async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// Start the mock backend server and return the shared state handle
pub async fn start(port: u16) -> anyhow::Result<SharedBackendState> {
    let state: SharedBackendState = std::sync::Arc::new(std::sync::Mutex::new(BackendState::default()));

    let app = Router::new()
        .route("/v1/messages", post(handle_messages))
        .route("/v1/chat/completions", post(handle_chat_completions))
        .route("/health", get(handle_health))
        .with_state(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await
        .map_err(|e| anyhow::anyhow!("Failed to bind mock backend to {}: {}", addr, e))?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock backend server failed");
    });

    // Brief pause to let the server start accepting connections
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    Ok(state)
}

/// Helper to configure the next model response
pub fn queue_response(state: &SharedBackendState, response: MockResponse) {
    state.lock().unwrap().response_queue.push_back(response);
}

/// Helper to get all requests received since last clear
pub fn drain_requests(state: &SharedBackendState) -> Vec<ReceivedRequest> {
    let mut s = state.lock().unwrap();
    s.received_requests.drain(..).collect()
}
