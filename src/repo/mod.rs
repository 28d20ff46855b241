/// Repository module
///
/// This module provides the data access layer for the application.
/// `document_repo` is the generic document store; the other repositories
/// are per-feature helpers built on top of it.

pub mod document_repo;
mod profile_repo;
mod task_repo;
mod schedule_repo;
mod study_session_repo;
mod chat_repo;
mod social_repo;

// Re-export all repository functions
pub use profile_repo::*;
pub use task_repo::*;
pub use schedule_repo::*;
pub use study_session_repo::*;
pub use chat_repo::*;
pub use social_repo::*;
