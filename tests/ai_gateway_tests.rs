/// End-to-end tests for the model-backed routes
///
/// Each test starts a scripted mock gateway on a local port and drives the
/// router against it, then checks both the HTTP response and what reached
/// the gateway or the database.
mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use studymate::ai::SseDecoder;
use studymate::repo;

#[tokio::test]
async fn test_fallback_after_bad_request() {
    let gateway = MockGateway::start(vec![fail(400, "bad request for this model"), ok("4")]).await;
    let (app, _) = create_test_app(&gateway);
    let (session, _) = register(&app, "ada").await;
    let chat_id = new_chat(&app, &session).await;

    let (status, body) = send(
        &app,
        json_request("POST", &format!("/chats/{chat_id}/messages"), Some(&session), json!({ "text": "What is 2+2?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["reply"], "4");
    assert_eq!(gateway.models(), vec!["model-a", "model-b"]);

    // The fallback attempt carried the same conversation
    let requests = gateway.requests();
    assert_eq!(requests[0]["messages"], requests[1]["messages"]);
    let messages = requests[0]["messages"].as_array().unwrap();
    assert_eq!(messages.first().unwrap()["role"], "system");
    assert_eq!(messages.last().unwrap()["content"], "What is 2+2?");

    let turns = body["session"]["messages"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1]["role"], "model");
}

#[tokio::test]
async fn test_rate_limit_retries_same_model_once() {
    let gateway = MockGateway::start(vec![fail(429, "slow down"), ok("hello")]).await;
    let (app, _) = create_test_app(&gateway);
    let (session, _) = register(&app, "ada").await;
    let chat_id = new_chat(&app, &session).await;

    let (status, body) = send(
        &app,
        json_request("POST", &format!("/chats/{chat_id}/messages"), Some(&session), json!({ "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(gateway.models(), vec!["model-a", "model-a"]);
}

#[tokio::test]
async fn test_exhausted_ladder_is_bad_gateway() {
    let gateway = MockGateway::start(vec![
        fail(400, "nope"),
        fail(503, "model unavailable"),
        fail(400, "still nope"),
    ])
    .await;
    let (app, pool) = create_test_app(&gateway);
    let (session, user_id) = register(&app, "ada").await;
    let chat_id = new_chat(&app, &session).await;

    let (status, body) = send(
        &app,
        json_request("POST", &format!("/chats/{chat_id}/messages"), Some(&session), json!({ "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("still nope"));
    assert_eq!(gateway.models(), TEST_MODELS.to_vec());

    let chat = repo::get_chat_session(&pool, &user_id, &chat_id).unwrap().unwrap();
    assert!(chat.get_messages().is_empty());
}

#[tokio::test]
async fn test_auth_failure_does_not_fall_back() {
    let gateway = MockGateway::start(vec![fail(401, "invalid api key")]).await;
    let (app, _) = create_test_app(&gateway);
    let (session, _) = register(&app, "ada").await;
    let chat_id = new_chat(&app, &session).await;

    let (status, _) = send(
        &app,
        json_request("POST", &format!("/chats/{chat_id}/messages"), Some(&session), json!({ "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(gateway.models(), vec!["model-a"]);
}

#[tokio::test]
async fn test_streamed_turn_is_saved_once_complete() {
    let gateway = MockGateway::start(vec![fail(400, "no"), stream(&["The answer", " is ", "4."])]).await;
    let (app, pool) = create_test_app(&gateway);
    let (session, user_id) = register(&app, "ada").await;
    let chat_id = new_chat(&app, &session).await;

    let (status, body) = send_raw(
        &app,
        json_request("POST", &format!("/chats/{chat_id}/stream"), Some(&session), json!({ "text": "2+2?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut decoder = SseDecoder::new();
    let mut events = decoder.push(body.as_bytes());
    events.extend(decoder.finish());

    let fragments: Vec<String> = events
        .iter()
        .filter(|e| e.event.as_deref() == Some("fragment"))
        .map(|e| serde_json::from_str::<serde_json::Value>(&e.data).unwrap()["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fragments, vec!["The answer", " is ", "4."]);

    let done = events.iter().find(|e| e.event.as_deref() == Some("done")).unwrap();
    let done: serde_json::Value = serde_json::from_str(&done.data).unwrap();
    assert_eq!(done["text"], "The answer is 4.");
    assert_eq!(done["session_id"], chat_id.as_str());

    assert_eq!(gateway.models(), vec!["model-a", "model-b"]);
    assert!(gateway.requests().iter().all(|r| r["stream"] == true));

    let chat = repo::get_chat_session(&pool, &user_id, &chat_id).unwrap().unwrap();
    let texts: Vec<_> = chat.get_messages().iter().map(|m| m.text.clone()).collect();
    assert_eq!(texts, vec!["2+2?", "The answer is 4."]);
}

#[tokio::test]
async fn test_empty_stream_saves_nothing() {
    let gateway = MockGateway::start(vec![stream(&[])]).await;
    let (app, pool) = create_test_app(&gateway);
    let (session, user_id) = register(&app, "ada").await;
    let chat_id = new_chat(&app, &session).await;

    let (status, body) = send_raw(
        &app,
        json_request("POST", &format!("/chats/{chat_id}/stream"), Some(&session), json!({ "text": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: error"));
    assert!(!body.contains("event: done"));

    let chat = repo::get_chat_session(&pool, &user_id, &chat_id).unwrap().unwrap();
    assert!(chat.get_messages().is_empty());
}

#[tokio::test]
async fn test_generated_schedule_is_stored() {
    let plan = r#"```json
[
  {"title": "Limits", "subject": "Math", "startTime": "09:00", "durationMinutes": 50, "type": "study", "description": "Chapter 2"},
  {"title": "Break", "subject": "", "startTime": "09:50", "durationMinutes": "10", "type": "break"},
  {"title": "Flashcards", "subject": "History", "startTime": "10:00", "durationMinutes": 40, "type": "review"}
]
```"#;
    let gateway = MockGateway::start(vec![ok(plan)]).await;
    let (app, pool) = create_test_app(&gateway);
    let (session, user_id) = register(&app, "ada").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/schedule/generate",
            Some(&session),
            json!({ "date": "2025-06-01", "goal": "Exam prep", "subjects": ["Math", "History"], "availableHours": 2 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(gateway.requests()[0]["response_format"]["type"], "json_object");

    let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let stored = repo::list_events(&pool, &user_id, Some(date)).unwrap();
    let titles: Vec<_> = stored.iter().map(|e| e.get_title()).collect();
    assert_eq!(titles, vec!["Limits", "Break", "Flashcards"]);
    assert_eq!(stored[1].get_duration_minutes(), 10);
}

#[tokio::test]
async fn test_unparseable_schedule_stores_nothing() {
    let gateway = MockGateway::start(vec![ok("Sure! Here is your plan: study a lot.")]).await;
    let (app, pool) = create_test_app(&gateway);
    let (session, user_id) = register(&app, "ada").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/schedule/generate",
            Some(&session),
            json!({ "date": "2025-06-01", "subjects": ["Math"], "availableHours": 1.5 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(repo::list_events(&pool, &user_id, None).unwrap().is_empty());
}

#[tokio::test]
async fn test_image_analysis_is_recorded() {
    let gateway = MockGateway::start(vec![ok("A right triangle with sides 3, 4 and 5.")]).await;
    let (app, _) = create_test_app(&gateway);
    let (session, _) = register(&app, "ada").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/ai/analyze-image",
            Some(&session),
            json!({ "prompt": "What shape is this?", "mime_type": "image/png", "image_base64": "iVBORw0KGgo=" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let parts = gateway.requests()[0]["messages"][1]["content"].clone();
    assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,iVBORw0KGgo=");

    let (status, history) = send(&app, get_request("/ai/image-analyses", Some(&session))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["answer"], "A right triangle with sides 3, 4 and 5.");
}
