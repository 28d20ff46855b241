use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;

use super::require_text;
use crate::db::DbPool;
use crate::dto::{LogStudySessionDto, StudySessionResponse};
use crate::errors::ApiError;
use crate::models::StudySession;
use crate::repo;
use crate::session::CurrentUser;

/// Longest single session accepted, in minutes
const MAX_SESSION_MINUTES: u32 = 720;

/// Handler for logging a finished focus session
///
/// This function handles POST requests to `/study-sessions`. The session is
/// stored and the caller's XP and credits are updated in the same write.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `user` - The caller
/// * `payload` - Subject, duration in minutes and an optional timestamp
///
/// ### Returns
///
/// The stored session and the updated profile
pub async fn log_study_session_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<LogStudySessionDto>,
) -> Result<(StatusCode, Json<StudySessionResponse>), ApiError> {
    require_text("subject", &payload.subject)?;
    if !(1..=MAX_SESSION_MINUTES).contains(&payload.duration_minutes) {
        return Err(ApiError::Validation(format!(
            "duration_minutes must be between 1 and {MAX_SESSION_MINUTES}"
        )));
    }

    let session = StudySession::new(
        user.user_id(),
        payload.subject.trim().to_string(),
        payload.duration_minutes,
        payload.timestamp.unwrap_or_else(Utc::now),
    );
    let (session, profile) = repo::log_study_session(&pool, user.profile, session)?;

    Ok((StatusCode::CREATED, Json(StudySessionResponse { session, profile })))
}

/// Handler for GET `/study-sessions`
pub async fn list_study_sessions_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<StudySession>>, ApiError> {
    Ok(Json(repo::list_study_sessions(&pool, &user.user_id())?))
}
