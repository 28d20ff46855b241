use super::*;
use crate::handlers::test_support::test_state;
use crate::session::SESSION_HEADER;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn json_request(method: &str, uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        json_request("POST", "/profiles", None, json!({ "name": name, "email": format!("{name}@example.com") })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

#[test]
fn test_run_migrations_is_idempotent() {
    let pool = crate::repo::tests::setup_test_db();
    let mut conn = pool.get().unwrap();
    assert!(run_migrations(&mut conn).is_ok());
}

#[tokio::test]
async fn test_session_header_required() {
    let app = create_app(test_state());

    let (status, body) = send(&app, get_request("/tasks", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, get_request("/tasks", Some("not-a-session"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_shop_is_public() {
    let app = create_app(test_state());
    let (status, body) = send(&app, get_request("/shop", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_then_use_session() {
    let app = create_app(test_state());
    let session = register(&app, "ada").await;

    let (status, me) = send(&app, get_request("/profiles/me", Some(&session))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "ada");

    let (status, task) = send(
        &app,
        json_request("POST", "/tasks", Some(&session), json!({ "title": "Read ch. 4", "subject": "History", "priority": "high" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let toggle_uri = format!("/tasks/{}/toggle", task["id"].as_str().unwrap());
    let (status, toggled) = send(&app, json_request("POST", &toggle_uri, Some(&session), Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["status"], "done");

    let (status, dashboard) = send(&app, get_request("/dashboard", Some(&session))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["completed_tasks"], 1);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = create_app(test_state());
    let session = register(&app, "ada").await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/sessions/current")
        .header(SESSION_HEADER, &session)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get_request("/profiles/me", Some(&session))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validation_error_body() {
    let app = create_app(test_state());
    let session = register(&app, "ada").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/study-sessions", Some(&session), json!({ "subject": "Math", "duration_minutes": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("duration_minutes"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_app(test_state());
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/tasks")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
