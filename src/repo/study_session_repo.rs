use crate::db::DbPool;
use crate::models::{Document, StudySession, UserProfile};
use crate::repo::document_repo;
use anyhow::Result;
use tracing::{info, instrument};

/// Logs completed focus time and credits the user's profile
///
/// The session row and the profile update are written together.
///
/// ### Returns
///
/// The stored session and the updated profile
#[instrument(skip(pool, profile, session), fields(user_id = %profile.get_id(), minutes = session.get_duration_minutes()))]
pub fn log_study_session(
    pool: &DbPool,
    mut profile: UserProfile,
    session: StudySession,
) -> Result<(StudySession, UserProfile)> {
    profile.award_study_time(session.get_duration_minutes());

    let docs = [Document::from_record(&session)?, Document::from_record(&profile)?];
    document_repo::write_batch(pool, &docs)?;

    info!("Logged study session, xp now {}", profile.get_xp());
    Ok((session, profile))
}

/// Lists a user's study log, oldest first
#[instrument(skip(pool))]
pub fn list_study_sessions(pool: &DbPool, owner_id: &str) -> Result<Vec<StudySession>> {
    let mut sessions: Vec<StudySession> = document_repo::list_by_owner(pool, owner_id)?;
    sessions.sort_by_key(|s| s.get_timestamp());
    Ok(sessions)
}
