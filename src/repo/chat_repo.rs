use crate::db::DbPool;
use crate::models::{ChatSession, ImageAnalysis};
use crate::repo::document_repo;
use anyhow::Result;
use tracing::{info, instrument};

#[instrument(skip(pool))]
pub fn create_chat_session(pool: &DbPool, owner_id: &str, title: String) -> Result<ChatSession> {
    let session = ChatSession::new(owner_id.to_string(), title);
    document_repo::put(pool, &session)?;
    info!("Created chat session {}", session.get_id());
    Ok(session)
}

/// Fetches a chat session only if it belongs to `owner_id`
#[instrument(skip(pool))]
pub fn get_chat_session(pool: &DbPool, owner_id: &str, session_id: &str) -> Result<Option<ChatSession>> {
    let session: Option<ChatSession> = document_repo::get(pool, session_id)?;
    Ok(session.filter(|s| s.get_owner_id() == owner_id))
}

/// Lists a user's conversations, most recently active first
#[instrument(skip(pool))]
pub fn list_chat_sessions(pool: &DbPool, owner_id: &str) -> Result<Vec<ChatSession>> {
    let mut sessions: Vec<ChatSession> = document_repo::list_by_owner(pool, owner_id)?;
    sessions.sort_by(|a, b| b.get_updated_at().cmp(&a.get_updated_at()));
    Ok(sessions)
}

/// Replaces the stored transcript with `session` in full
#[instrument(skip(pool, session), fields(session_id = %session.get_id(), messages = session.get_messages().len()))]
pub fn save_chat_session(pool: &DbPool, session: &ChatSession) -> Result<()> {
    document_repo::put(pool, session)
}

#[instrument(skip(pool))]
pub fn delete_chat_session(pool: &DbPool, owner_id: &str, session_id: &str) -> Result<bool> {
    if get_chat_session(pool, owner_id, session_id)?.is_none() {
        return Ok(false);
    }
    document_repo::delete::<ChatSession>(pool, session_id)
}

#[instrument(skip(pool, analysis), fields(analysis_id = %analysis.id))]
pub fn save_image_analysis(pool: &DbPool, analysis: &ImageAnalysis) -> Result<()> {
    document_repo::put(pool, analysis)
}

/// Lists a user's image analyses, newest first
#[instrument(skip(pool))]
pub fn list_image_analyses(pool: &DbPool, owner_id: &str) -> Result<Vec<ImageAnalysis>> {
    let mut analyses: Vec<ImageAnalysis> = document_repo::list_by_owner(pool, owner_id)?;
    analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(analyses)
}
