#![allow(dead_code)]

/// Common test utilities for studymate integration tests
///
/// This file contains the shared setup for all integration tests: an
/// application wired to an in-memory SQLite database, a mock model gateway
/// served by axum on a local port, and small request helpers.
use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use studymate::ai::{Dispatcher, HttpTransport, ModelLadder, RetryPolicy};
use studymate::db::{DbPool, init_pool};
use studymate::session::SESSION_HEADER;
use studymate::{AppState, create_app, run_migrations};
use tower::ServiceExt;

/// Models the test app walks through, in order
pub const TEST_MODELS: [&str; 3] = ["model-a", "model-b", "model-c"];

/// One canned gateway reply
#[derive(Clone, Debug)]
pub enum Scripted {
    /// A plain JSON reply with this status
    Json(u16, Value),
    /// A successful event stream carrying these content fragments
    Stream(Vec<String>),
}

/// A successful completion whose assistant text is `text`
pub fn ok(text: &str) -> Scripted {
    Scripted::Json(200, json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] }))
}

/// A rejection in the gateway's error format
pub fn fail(status: u16, message: &str) -> Scripted {
    Scripted::Json(status, json!({ "error": { "message": message, "code": status } }))
}

pub fn stream(fragments: &[&str]) -> Scripted {
    Scripted::Stream(fragments.iter().map(|f| f.to_string()).collect())
}

#[derive(Clone, Default)]
struct GatewayState {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// A chat-completions endpoint that replays a script
pub struct MockGateway {
    /// Full endpoint URL, ready for `HttpTransport::new`
    pub endpoint: String,
    state: GatewayState,
}

impl MockGateway {
    /// Starts the gateway on an ephemeral local port
    pub async fn start(script: Vec<Scripted>) -> Self {
        let state = GatewayState {
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::default(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { endpoint: format!("http://{}/v1/chat/completions", addr), state }
    }

    /// Every request body received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The `model` field of every request, in order
    pub fn models(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|body| body["model"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

async fn completions(State(state): State<GatewayState>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body);
    let next = state.script.lock().unwrap().pop_front();

    match next {
        Some(Scripted::Json(status, body)) => {
            (StatusCode::from_u16(status).unwrap(), Json(body)).into_response()
        }
        Some(Scripted::Stream(fragments)) => {
            let mut text = String::new();
            for fragment in fragments {
                let chunk = json!({ "choices": [{ "delta": { "content": fragment } }] });
                text.push_str(&format!("data: {}\n\n", chunk));
            }
            text.push_str("data: [DONE]\n\n");
            ([(header::CONTENT_TYPE, "text/event-stream")], text).into_response()
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "script exhausted" } })),
        )
            .into_response(),
    }
}

/// Creates a fresh database with the schema applied
pub fn test_pool() -> Arc<DbPool> {
    let url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = init_pool(&url).unwrap();
    let mut conn = pool.get().unwrap();
    run_migrations(&mut conn).unwrap();
    drop(conn);
    Arc::new(pool)
}

/// Creates a test application backed by `gateway` and an in-memory database
///
/// ### Returns
///
/// The router and its pool, so tests can inspect what was stored
pub fn create_test_app(gateway: &MockGateway) -> (Router, Arc<DbPool>) {
    let pool = test_pool();
    let transport = HttpTransport::new(gateway.endpoint.clone(), Some("test-key".to_string()), Duration::from_secs(5))
        .unwrap();
    let ladder = ModelLadder::new(TEST_MODELS).unwrap();
    let dispatcher = Dispatcher::new(transport, ladder, RetryPolicy::immediate());

    let app = create_app(AppState { pool: pool.clone(), ai: Arc::new(dispatcher) });
    (app, pool)
}

/// Serves `app` on an ephemeral local port and returns its base URL
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Sends a request and returns the status and raw body
pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Sends a request and decodes the JSON body (Null when empty)
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send_raw(app, request).await;
    let value = if body.is_empty() { Value::Null } else { serde_json::from_str(&body).unwrap() };
    (status, value)
}

pub fn json_request(method: &str, uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::empty()).unwrap()
}

/// Registers a user through the API
///
/// ### Returns
///
/// The session id and the new user's id
pub async fn register(app: &Router, name: &str) -> (String, String) {
    let (status, body) = send(
        app,
        json_request("POST", "/profiles", None, json!({ "name": name, "email": format!("{name}@example.com") })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["session_id"].as_str().unwrap().to_string(),
        body["profile"]["id"].as_str().unwrap().to_string(),
    )
}

/// Creates an empty chat and returns its id
pub async fn new_chat(app: &Router, session: &str) -> String {
    let (status, body) = send(app, json_request("POST", "/chats", Some(session), json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}
