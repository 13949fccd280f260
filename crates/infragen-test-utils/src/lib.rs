//! Shared test utilities for infragen integration tests.
//!
//! Provides an in-process fake of an OpenAI-compatible API (chat
//! completions plus the assistants/threads/runs endpoints). Each test
//! starts its own instance on an ephemeral port, scripts its replies with
//! [`FakeScript`], and inspects the requests it received afterwards.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Replies the fake backend gives.
#[derive(Debug, Clone)]
pub struct FakeScript {
    /// Text returned by `/chat/completions` and by the newest thread message.
    pub reply: String,
    /// Run statuses: the first is returned when a run is created, the rest
    /// by successive polls. The last one repeats forever.
    pub run_statuses: Vec<String>,
    /// When set, every endpoint answers with this status and body.
    pub error: Option<(u16, String)>,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            reply: "```hcl\nresource \"aws_s3_bucket\" \"this\" {\n  bucket = \"example\"\n}\n```"
                .to_string(),
            run_statuses: vec!["queued".to_string(), "completed".to_string()],
            error: None,
        }
    }
}

impl FakeScript {
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }

    pub fn with_run_statuses(mut self, statuses: &[&str]) -> Self {
        self.run_statuses = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_error(mut self, status: u16, body: impl Into<String>) -> Self {
        self.error = Some((status, body.into()));
        self
    }
}

/// A request seen by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string.
    pub uri: String,
    pub authorization: Option<String>,
    pub beta_header: Option<String>,
    pub body: Value,
}

struct FakeState {
    script: FakeScript,
    statuses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeState {
    fn record(&self, method: &str, uri: &Uri, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            uri: uri.to_string(),
            authorization: header("authorization"),
            beta_header: header("openai-beta"),
            body,
        });
    }

    fn next_status(&self) -> String {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap_or_else(|| "completed".to_string())
        }
    }

    fn scripted_error(&self) -> Option<Response> {
        self.script.error.as_ref().map(|(status, body)| {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body.clone()).into_response()
        })
    }
}

/// A running fake backend. Dropping it stops the server.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<FakeState>,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start a fake backend on `127.0.0.1` with an ephemeral port.
    pub async fn start(script: FakeScript) -> Self {
        let state = Arc::new(FakeState {
            statuses: Mutex::new(script.run_statuses.iter().cloned().collect()),
            script,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .route("/v1/assistants", post(create_assistant))
            .route("/v1/threads", post(create_thread))
            .route("/v1/threads/{thread_id}/messages", post(create_message).get(list_messages))
            .route("/v1/threads/{thread_id}/runs", post(create_run))
            .route("/v1/threads/{thread_id}/runs/{run_id}", get(get_run))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake backend");
        let addr = listener.local_addr().expect("fake backend has no address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend crashed");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL including the `/v1` segment.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// All requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Number of requests whose method and path (query stripped) match.
    pub fn count(&self, method: &str, path_suffix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method)
            .filter(|r| r.uri.split('?').next().unwrap_or("").ends_with(path_suffix))
            .count()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

type Shared = State<Arc<FakeState>>;

async fn chat_completions(
    State(state): Shared,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", &uri, &headers, body);
    if let Some(err) = state.scripted_error() {
        return err;
    }
    Json(json!({
        "id": new_id("chatcmpl"),
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": state.script.reply },
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn create_assistant(
    State(state): Shared,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", &uri, &headers, body);
    if let Some(err) = state.scripted_error() {
        return err;
    }
    Json(json!({ "id": new_id("asst"), "object": "assistant" })).into_response()
}

async fn create_thread(
    State(state): Shared,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", &uri, &headers, body);
    if let Some(err) = state.scripted_error() {
        return err;
    }
    Json(json!({ "id": new_id("thread"), "object": "thread" })).into_response()
}

async fn create_message(
    State(state): Shared,
    Path(thread_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", &uri, &headers, body);
    if let Some(err) = state.scripted_error() {
        return err;
    }
    Json(json!({ "id": new_id("msg"), "object": "thread.message", "thread_id": thread_id }))
        .into_response()
}

async fn create_run(
    State(state): Shared,
    Path(thread_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", &uri, &headers, body);
    if let Some(err) = state.scripted_error() {
        return err;
    }
    Json(json!({
        "id": new_id("run"),
        "object": "thread.run",
        "thread_id": thread_id,
        "status": state.next_status(),
    }))
    .into_response()
}

async fn get_run(
    State(state): Shared,
    Path((thread_id, run_id)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.record("GET", &uri, &headers, Value::Null);
    if let Some(err) = state.scripted_error() {
        return err;
    }
    Json(json!({
        "id": run_id,
        "object": "thread.run",
        "thread_id": thread_id,
        "status": state.next_status(),
    }))
    .into_response()
}

async fn list_messages(
    State(state): Shared,
    Path(thread_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.record("GET", &uri, &headers, Value::Null);
    if let Some(err) = state.scripted_error() {
        return err;
    }
    Json(json!({
        "object": "list",
        "data": [{
            "id": new_id("msg"),
            "object": "thread.message",
            "thread_id": thread_id,
            "role": "assistant",
            "content": [{
                "type": "text",
                "text": { "value": state.script.reply, "annotations": [] }
            }]
        }]
    }))
    .into_response()
}
