//! Login sessions
//!
//! Feature code never looks up "the current user" on its own. The
//! `CurrentUser` extractor restores the session named by the request and
//! hands an explicit `UserContext` to the handler.

use anyhow::Result;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::AppState;
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::{SessionRecord, UserProfile};
use crate::repo::{self, document_repo};

/// Header carrying the session id
pub const SESSION_HEADER: &str = "x-session-id";

/// The authenticated user a request acts for
#[derive(Debug, Clone)]
pub struct UserContext {
    pub session_id: String,
    pub profile: UserProfile,
}

impl UserContext {
    pub fn user_id(&self) -> String {
        self.profile.get_id()
    }
}

/// Opens a session for an existing user and registers today's login
///
/// ### Returns
///
/// The new context, or `None` if no profile has that id
///
/// ### Errors
///
/// Returns an error if the store cannot be read or written
#[instrument(skip(pool))]
pub fn init(pool: &DbPool, user_id: &str, today: NaiveDate) -> Result<Option<UserContext>> {
    let Some(mut profile) = repo::get_profile(pool, user_id)? else {
        debug!("No profile for session");
        return Ok(None);
    };

    if profile.register_daily_login(today) {
        repo::save_profile(pool, &profile)?;
    }

    let session = SessionRecord::new(profile.get_id());
    document_repo::put(pool, &session)?;
    info!("Opened session {}", session.get_id());

    Ok(Some(UserContext {
        session_id: session.get_id(),
        profile,
    }))
}

/// Restores a session and refreshes its last-seen time
///
/// ### Returns
///
/// The context, or `None` if the session or its profile no longer exists
///
/// ### Errors
///
/// Returns an error if the store cannot be read or written
#[instrument(skip(pool, session_id))]
pub fn restore(pool: &DbPool, session_id: &str, now: DateTime<Utc>) -> Result<Option<UserContext>> {
    let Some(mut session) = document_repo::get::<SessionRecord>(pool, session_id)? else {
        return Ok(None);
    };

    let Some(profile) = repo::get_profile(pool, &session.get_user_id())? else {
        warn!("Session {} points at a missing profile", session_id);
        return Ok(None);
    };

    session.touch(now);
    document_repo::put(pool, &session)?;

    Ok(Some(UserContext {
        session_id: session.get_id(),
        profile,
    }))
}

/// Ends a session
///
/// ### Returns
///
/// `true` if the session existed
///
/// ### Errors
///
/// Returns an error if the delete fails
#[instrument(skip(pool, session_id))]
pub fn teardown(pool: &DbPool, session_id: &str) -> Result<bool> {
    let removed = document_repo::delete::<SessionRecord>(pool, session_id)?;
    if removed {
        info!("Closed session");
    }
    Ok(removed)
}

/// Extractor restoring the caller's session from the `x-session-id` header
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserContext);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session_id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        restore(&state.pool, session_id, Utc::now())?
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}
