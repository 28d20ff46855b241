use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::require_text;
use crate::ai::{AiError, CancelHandle, ChatRequest, ChatStream, Dispatcher, cancel_pair};
use crate::db::DbPool;
use crate::dto::{ChatTurnResponse, CreateChatDto, SendMessageDto, StreamDoneDto};
use crate::errors::ApiError;
use crate::models::ChatSession;
use crate::repo;
use crate::session::CurrentUser;

const DEFAULT_CHAT_TITLE: &str = "New chat";

/// Events buffered between the relay task and the response body
const STREAM_BUFFER: usize = 32;

/// Handler for GET `/chats`
pub async fn list_chats_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ChatSession>>, ApiError> {
    Ok(Json(repo::list_chat_sessions(&pool, &user.user_id())?))
}

/// Handler for opening an empty conversation
///
/// This function handles POST requests to `/chats`. A missing or blank title
/// becomes "New chat".
pub async fn create_chat_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateChatDto>,
) -> Result<(StatusCode, Json<ChatSession>), ApiError> {
    let title = payload
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string());

    let chat = repo::create_chat_session(&pool, &user.user_id(), title)?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// Handler for GET `/chats/{id}`
pub async fn get_chat_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ChatSession>, ApiError> {
    let chat = repo::get_chat_session(&pool, &user.user_id(), &id)?.ok_or(ApiError::NotFound("Chat"))?;
    Ok(Json(chat))
}

/// Handler for DELETE `/chats/{id}`
pub async fn delete_chat_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if repo::delete_chat_session(&pool, &user.user_id(), &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Chat"))
    }
}

/// Handler for one tutoring turn
///
/// This function handles POST requests to `/chats/{id}/messages`. The whole
/// transcript plus the new message is sent to the model.
///
/// ### Returns
///
/// The updated conversation and the model's reply
///
/// ### Errors
///
/// If the model call fails the conversation is left exactly as it was.
pub async fn send_message_handler(
    State(pool): State<Arc<DbPool>>,
    State(dispatcher): State<Arc<Dispatcher>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageDto>,
) -> Result<Json<ChatTurnResponse>, ApiError> {
    require_text("text", &payload.text)?;
    let mut chat = repo::get_chat_session(&pool, &user.user_id(), &id)?.ok_or(ApiError::NotFound("Chat"))?;

    chat.push_user(payload.text.trim().to_string());
    let reply = dispatcher.complete_text(&ChatRequest::chat(chat.get_messages())).await?;
    chat.push_model(reply.clone());
    repo::save_chat_session(&pool, &chat)?;

    Ok(Json(ChatTurnResponse { session: chat, reply }))
}

/// Handler for a tutoring turn delivered as server-sent events
///
/// This function handles POST requests to `/chats/{id}/stream`. The body is
/// a sequence of `fragment` events (`{"text": ..}`) closed by either a
/// `done` event carrying the full reply or an `error` event.
///
/// The transcript is saved only once the reply is complete. If the client
/// goes away first the upstream request is cancelled and nothing is stored.
///
/// ### Errors
///
/// Failures before the first fragment (validation, unknown chat, every model
/// rejected) are ordinary error responses.
pub async fn stream_message_handler(
    State(pool): State<Arc<DbPool>>,
    State(dispatcher): State<Arc<Dispatcher>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageDto>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    require_text("text", &payload.text)?;
    let mut chat = repo::get_chat_session(&pool, &user.user_id(), &id)?.ok_or(ApiError::NotFound("Chat"))?;

    chat.push_user(payload.text.trim().to_string());
    let (handle, signal) = cancel_pair();
    let stream = dispatcher
        .stream(&ChatRequest::streaming_chat(chat.get_messages()), signal)
        .await?;

    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(relay_stream(pool, chat, stream, handle, tx));

    let events = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok::<_, Infallible>(event), rx))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Forwards fragments to the client and saves the finished turn
#[instrument(skip_all, fields(chat_id = %chat.get_id()))]
async fn relay_stream(
    pool: Arc<DbPool>,
    mut chat: ChatSession,
    mut stream: ChatStream,
    handle: CancelHandle,
    tx: mpsc::Sender<Event>,
) {
    let mut reply = String::new();
    let mut client_gone = false;

    loop {
        let next = tokio::select! {
            _ = tx.closed(), if !client_gone => {
                client_gone = true;
                handle.cancel();
                continue;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(fragment)) => {
                reply.push_str(&fragment);
                if tx.send(json_event("fragment", &json!({ "text": fragment }))).await.is_err() {
                    debug!("Client disconnected mid-stream");
                    return;
                }
            }
            Some(Err(AiError::Cancelled)) => {
                info!("Stream cancelled, discarding {} bytes", reply.len());
                return;
            }
            Some(Err(e)) => {
                warn!("Stream failed: {e}");
                let _ = tx.send(json_event("error", &json!({ "error": e.to_string() }))).await;
                return;
            }
            None => break,
        }
    }

    chat.push_model(reply.clone());
    let event = match repo::save_chat_session(&pool, &chat) {
        Ok(()) => json_event("done", &StreamDoneDto { session_id: chat.get_id(), text: reply }),
        Err(e) => {
            error!("Failed to save streamed turn: {e:?}");
            json_event("error", &json!({ "error": "Internal server error" }))
        }
    };
    let _ = tx.send(event).await;
}

fn json_event(name: &'static str, payload: &impl Serialize) -> Event {
    Event::default().event(name).json_data(payload).unwrap_or_else(|e| {
        error!("Failed to encode {name} event: {e}");
        Event::default().event("error").data(r#"{"error":"Internal server error"}"#)
    })
}
