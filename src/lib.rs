/// Studymate: a study companion backend
///
/// This library provides task tracking, schedule planning, focus-session
/// logging, AI tutoring and a small social layer on top of a SQLite-backed
/// document store. All model calls go through a single dispatcher that walks
/// a fallback ladder of models.
///
/// ### Modules
///
/// - `ai`: Model gateway client, fallback ladder, streaming and schedule parsing
/// - `config`: Layered configuration (defaults, config file, CLI/env)
/// - `db`: Database connection management
/// - `models`: Stored records and their invariants
/// - `repo`: Document store and per-feature data access
/// - `session`: Per-user session lifecycle and the `CurrentUser` extractor
/// - `stats`: Dashboard aggregation
///
/// ### Web API
///
/// See `create_app` for the full route table. Every route except
/// registration, login and the shop catalogue needs an `x-session-id` header.

/// AI gateway module
pub mod ai;

/// Configuration module
pub mod config;

/// Database connection module
pub mod db;

/// Data transfer objects for the web API
pub mod dto;

/// Error types for the web API
pub mod errors;

/// Web API handlers
pub mod handlers;

/// Data models module
pub mod models;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

/// Session lifecycle module
pub mod session;

/// Dashboard statistics module
pub mod stats;

#[cfg(test)]
mod test_utils;

use axum::{
    Router,
    extract::FromRef,
    routing::{delete, get, post},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::ai::Dispatcher;
use crate::db::DbPool;
use crate::handlers::*;

/// Embedded migrations for the document store
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Shared state handed to every handler
///
/// Handlers pick the part they need with `State<Arc<DbPool>>` or
/// `State<Arc<Dispatcher>>`.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub ai: Arc<Dispatcher>,
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<Dispatcher> {
    fn from_ref(state: &AppState) -> Self {
        state.ai.clone()
    }
}

/// Creates the application router with all routes
///
/// This function sets up the Axum router with all the API endpoints.
///
/// ### Arguments
///
/// * `state` - The database pool and AI dispatcher shared with all handlers
///
/// ### Returns
///
/// An Axum Router configured with all routes and a permissive CORS layer for
/// the browser front end
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Sessions and profiles
        .route("/profiles", post(register_handler))
        .route("/profiles/me", get(get_me_handler).patch(update_me_handler))
        .route("/sessions", post(login_handler))
        .route("/sessions/current", delete(logout_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/users/search", get(search_users_handler))
        // Gamification
        .route("/shop", get(list_shop_handler))
        .route("/shop/purchase", post(purchase_handler))
        .route("/friends/requests", post(send_friend_request_handler))
        .route("/friends/requests/{id}/accept", post(accept_friend_request_handler))
        // Tasks
        .route("/tasks", post(create_task_handler).get(list_tasks_handler))
        .route("/tasks/reminders", get(list_reminders_handler))
        .route("/tasks/{id}", delete(delete_task_handler))
        .route("/tasks/{id}/toggle", post(toggle_task_handler))
        // Schedule
        .route("/schedule", get(list_events_handler).post(create_event_handler))
        .route("/schedule/generate", post(generate_schedule_handler))
        .route("/schedule/{id}", delete(delete_event_handler))
        // Focus sessions
        .route("/study-sessions", get(list_study_sessions_handler).post(log_study_session_handler))
        // Tutoring chat
        .route("/chats", get(list_chats_handler).post(create_chat_handler))
        .route("/chats/{id}", get(get_chat_handler).delete(delete_chat_handler))
        .route("/chats/{id}/messages", post(send_message_handler))
        .route("/chats/{id}/stream", post(stream_message_handler))
        // Image questions
        .route("/ai/analyze-image", post(analyze_image_handler))
        .route("/ai/image-analyses", get(list_image_analyses_handler))
        // Social
        .route("/groups", get(list_groups_handler).post(create_group_handler))
        .route("/groups/{id}/join", post(join_group_handler))
        .route(
            "/groups/{id}/messages",
            get(list_group_messages_handler).post(post_group_message_handler),
        )
        .route("/posts", get(list_feed_handler).post(create_post_handler))
        .route("/posts/{id}/like", post(like_post_handler))
        .route("/posts/{id}/comments", get(list_comments_handler).post(add_comment_handler))
        .route(
            "/messages/{user_id}",
            get(list_direct_messages_handler).post(send_direct_message_handler),
        )
        // Dashboard
        .route("/dashboard", get(dashboard_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the embedded migrations
///
/// ### Arguments
///
/// * `conn` - A mutable reference to a SQLite connection
///
/// ### Errors
///
/// Returns an error if any pending migration fails to apply
pub fn run_migrations(conn: &mut diesel::SqliteConnection) -> anyhow::Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests;
