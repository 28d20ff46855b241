use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::require_text;
use crate::db::DbPool;
use crate::dto::{
    FriendRequestDto, LimitQuery, LoginDto, PublicProfileDto, PurchaseDto, RegisterDto, SearchQuery, SessionResponse,
    UpdateProfileDto,
};
use crate::errors::ApiError;
use crate::models::shop::{self, CATALOGUE, ShopItemKind};
use crate::models::{Document, ShopItem, UserProfile};
use crate::repo::{self, document_repo};
use crate::session::{self, CurrentUser};

/// Themes every user may pick without buying anything
const FREE_THEMES: [&str; 2] = ["light", "dark"];

const DEFAULT_LEADERBOARD_SIZE: usize = 10;
const MAX_LEADERBOARD_SIZE: usize = 100;

/// Handler for registering a new user
///
/// This function handles POST requests to `/profiles`.
///
/// ### Returns
///
/// The new profile together with an open session id
pub async fn register_handler(
    State(pool): State<Arc<DbPool>>,
    Json(payload): Json<RegisterDto>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    require_text("name", &payload.name)?;
    require_text("email", &payload.email)?;

    let profile = repo::create_profile(&pool, payload.name.trim().to_string(), payload.email.trim().to_string())?;
    let ctx = session::init(&pool, &profile.get_id(), Utc::now().date_naive())?
        .ok_or(ApiError::NotFound("Profile"))?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse { session_id: ctx.session_id, profile: ctx.profile }),
    ))
}

/// Handler for logging in as an existing user
///
/// This function handles POST requests to `/sessions`.
///
/// ### Errors
///
/// - 401 if the user is unknown or the email does not match the registered one
pub async fn login_handler(
    State(pool): State<Arc<DbPool>>,
    Json(payload): Json<LoginDto>,
) -> Result<Json<SessionResponse>, ApiError> {
    let user_id = payload.user_id.trim();
    let profile = repo::get_profile(&pool, user_id)?.ok_or(ApiError::Unauthorized)?;
    if !profile.get_email().eq_ignore_ascii_case(payload.email.trim()) {
        warn!("Rejected login for {}: email mismatch", user_id);
        return Err(ApiError::Unauthorized);
    }

    let ctx = session::init(&pool, user_id, Utc::now().date_naive())?.ok_or(ApiError::Unauthorized)?;

    Ok(Json(SessionResponse { session_id: ctx.session_id, profile: ctx.profile }))
}

/// Handler for DELETE `/sessions/current`
pub async fn logout_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    session::teardown(&pool, &user.session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/profiles/me`
pub async fn get_me_handler(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user.profile)
}

/// Handler for updating the caller's preferences
///
/// This function handles PATCH requests to `/profiles/me`.
///
/// ### Errors
///
/// - 400 for a blank name, a daily goal outside 1..=1440 minutes, or a theme
///   that is neither free nor owned
pub async fn update_me_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileDto>,
) -> Result<Json<UserProfile>, ApiError> {
    let mut profile = user.profile;

    if let Some(name) = payload.name {
        require_text("name", &name)?;
        profile.set_name(name.trim().to_string());
    }
    if let Some(avatar) = payload.avatar {
        profile.set_avatar(Some(avatar).filter(|a| !a.trim().is_empty()));
    }
    if let Some(theme) = payload.theme {
        if !theme_available(&profile, &theme) {
            return Err(ApiError::Validation(format!("Theme {theme} is not available")));
        }
        profile.set_theme(theme);
    }
    if let Some(minutes) = payload.daily_goal_minutes {
        if !(1..=1440).contains(&minutes) {
            return Err(ApiError::Validation("daily_goal_minutes must be between 1 and 1440".to_string()));
        }
        profile.set_daily_goal_minutes(minutes);
    }

    repo::save_profile(&pool, &profile)?;
    Ok(Json(profile))
}

fn theme_available(profile: &UserProfile, theme: &str) -> bool {
    if FREE_THEMES.contains(&theme) {
        return true;
    }
    shop::find_item(theme).is_some_and(|item| {
        item.kind == ShopItemKind::Theme && profile.get_inventory().iter().any(|owned| owned == item.id)
    })
}

/// Handler for GET `/leaderboard`
pub async fn leaderboard_handler(
    State(pool): State<Arc<DbPool>>,
    _user: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<PublicProfileDto>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE).clamp(1, MAX_LEADERBOARD_SIZE);
    let ranked = repo::leaderboard(&pool, limit)?;
    Ok(Json(ranked.into_iter().map(PublicProfileDto::from).collect()))
}

/// Handler for GET `/users/search?q=`
pub async fn search_users_handler(
    State(pool): State<Arc<DbPool>>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PublicProfileDto>>, ApiError> {
    let matches = repo::search_profiles(&pool, &query.q)?;
    Ok(Json(matches.into_iter().map(PublicProfileDto::from).collect()))
}

/// Handler for GET `/shop`
pub async fn list_shop_handler() -> Json<&'static [ShopItem]> {
    Json(CATALOGUE)
}

/// Handler for buying a shop item with credits
///
/// This function handles POST requests to `/shop/purchase`.
///
/// ### Errors
///
/// - 404 if the item is not in the catalogue
/// - 409 if the item is owned already or credits are short
pub async fn purchase_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PurchaseDto>,
) -> Result<Json<UserProfile>, ApiError> {
    let item = shop::find_item(&payload.item_id).ok_or(ApiError::NotFound("Shop item"))?;
    let mut profile = user.profile;

    profile.purchase(item)?;
    repo::save_profile(&pool, &profile)?;

    info!("User {} bought {}", profile.get_id(), item.id);
    Ok(Json(profile))
}

/// Handler for sending a friend request
///
/// This function handles POST requests to `/friends/requests`.
pub async fn send_friend_request_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<FriendRequestDto>,
) -> Result<StatusCode, ApiError> {
    let mut target = repo::get_profile(&pool, payload.user_id.trim())?.ok_or(ApiError::NotFound("User"))?;

    target.receive_friend_request(&user.user_id())?;
    repo::save_profile(&pool, &target)?;

    Ok(StatusCode::CREATED)
}

/// Handler for accepting a pending friend request
///
/// This function handles POST requests to `/friends/requests/{id}/accept`,
/// where `id` is the requesting user. Both profiles are written together.
pub async fn accept_friend_request_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(from_user): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let mut profile = user.profile;
    let mut requester = repo::get_profile(&pool, &from_user)?.ok_or(ApiError::NotFound("User"))?;

    profile.accept_friend_request(&from_user)?;
    requester.add_friend(&profile.get_id());

    let docs = [
        Document::from_record(&profile).map_err(anyhow::Error::from)?,
        Document::from_record(&requester).map_err(anyhow::Error::from)?,
    ];
    document_repo::write_batch(&pool, &docs)?;

    Ok(Json(profile))
}
