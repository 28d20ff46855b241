use crate::db::DbPool;
use crate::models::UserProfile;
use crate::repo::document_repo;
use anyhow::Result;
use tracing::{debug, info, instrument};

/// Registers a new user profile
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `name` - The display name
/// * `email` - The contact address
///
/// ### Returns
///
/// A Result containing the newly created profile
#[instrument(skip(pool))]
pub fn create_profile(pool: &DbPool, name: String, email: String) -> Result<UserProfile> {
    let profile = UserProfile::new(name, email);
    document_repo::put(pool, &profile)?;
    info!("Registered user {}", profile.get_id());
    Ok(profile)
}

#[instrument(skip(pool))]
pub fn get_profile(pool: &DbPool, user_id: &str) -> Result<Option<UserProfile>> {
    document_repo::get(pool, user_id)
}

/// Saves a profile wholesale; the last write wins
#[instrument(skip(pool, profile), fields(user_id = %profile.get_id()))]
pub fn save_profile(pool: &DbPool, profile: &UserProfile) -> Result<()> {
    document_repo::put(pool, profile)
}

/// Returns the top `limit` profiles by XP
///
/// This scans the whole profile collection.
#[instrument(skip(pool))]
pub fn leaderboard(pool: &DbPool, limit: usize) -> Result<Vec<UserProfile>> {
    let mut profiles: Vec<UserProfile> = document_repo::list_all(pool)?;
    profiles.sort_by(|a, b| {
        b.get_xp()
            .cmp(&a.get_xp())
            .then_with(|| b.get_streak().cmp(&a.get_streak()))
            .then_with(|| a.get_name().cmp(&b.get_name()))
    });
    profiles.truncate(limit);
    Ok(profiles)
}

/// Finds profiles whose name contains `query`, ignoring case
#[instrument(skip(pool))]
pub fn search_profiles(pool: &DbPool, query: &str) -> Result<Vec<UserProfile>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }
    let profiles: Vec<UserProfile> = document_repo::list_all(pool)?;
    let matches: Vec<_> = profiles
        .into_iter()
        .filter(|p| p.get_name().to_lowercase().contains(&needle))
        .collect();
    debug!("Search matched {} profiles", matches.len());
    Ok(matches)
}
