use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::require_text;
use crate::db::DbPool;
use crate::dto::{CreateGroupDto, LimitQuery, TextDto};
use crate::errors::ApiError;
use crate::models::{
    AuthorSnapshot, DirectMessage, GroupMessage, PostComment, SocialPost, StudyGroup,
};
use crate::repo::{self, document_repo};
use crate::session::CurrentUser;

const DEFAULT_FEED_SIZE: usize = 20;
const MAX_FEED_SIZE: usize = 100;

/// Handler for GET `/groups`
pub async fn list_groups_handler(
    State(pool): State<Arc<DbPool>>,
    _user: CurrentUser,
) -> Result<Json<Vec<StudyGroup>>, ApiError> {
    Ok(Json(repo::list_groups(&pool)?))
}

/// Handler for creating a study group
///
/// This function handles POST requests to `/groups`. The creator becomes
/// the first member.
pub async fn create_group_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateGroupDto>,
) -> Result<(StatusCode, Json<StudyGroup>), ApiError> {
    require_text("name", &payload.name)?;
    let group = repo::create_group(
        &pool,
        &user.user_id(),
        payload.name.trim().to_string(),
        payload.subject.trim().to_string(),
    )?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// Handler for POST `/groups/{id}/join`
///
/// Joining twice is not an error.
pub async fn join_group_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<StudyGroup>, ApiError> {
    let group = repo::join_group(&pool, &id, &user.user_id())?.ok_or(ApiError::NotFound("Group"))?;
    Ok(Json(group))
}

/// Loads a group the caller belongs to
fn member_group(pool: &DbPool, group_id: &str, user_id: &str) -> Result<StudyGroup, ApiError> {
    let group = repo::get_group(pool, group_id)?.ok_or(ApiError::NotFound("Group"))?;
    if !group.is_member(user_id) {
        return Err(ApiError::Forbidden);
    }
    Ok(group)
}

/// Handler for GET `/groups/{id}/messages`
///
/// ### Errors
///
/// - 404 if the group does not exist
/// - 403 if the caller is not a member
pub async fn list_group_messages_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<GroupMessage>>, ApiError> {
    let group = member_group(&pool, &id, &user.user_id())?;
    Ok(Json(repo::list_group_messages(&pool, &group.id)?))
}

/// Handler for POST `/groups/{id}/messages`
///
/// Members only, like reading.
pub async fn post_group_message_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<TextDto>,
) -> Result<(StatusCode, Json<GroupMessage>), ApiError> {
    require_text("text", &payload.text)?;
    let group = member_group(&pool, &id, &user.user_id())?;

    let message = repo::post_group_message(
        &pool,
        &group.id,
        AuthorSnapshot::from(&user.profile),
        payload.text.trim().to_string(),
    )?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Handler for the public feed
///
/// This function handles GET requests to `/posts`, newest first, limited
/// with `?limit=` (default 20, at most 100).
pub async fn list_feed_handler(
    State(pool): State<Arc<DbPool>>,
    _user: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<SocialPost>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_FEED_SIZE).clamp(1, MAX_FEED_SIZE);
    Ok(Json(repo::list_feed(&pool, limit)?))
}

/// Handler for POST `/posts`
pub async fn create_post_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<TextDto>,
) -> Result<(StatusCode, Json<SocialPost>), ApiError> {
    require_text("text", &payload.text)?;
    let post = repo::create_post(&pool, AuthorSnapshot::from(&user.profile), payload.text.trim().to_string())?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Handler for POST `/posts/{id}/like`
///
/// Toggles: a second like from the same user removes it.
pub async fn like_post_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<SocialPost>, ApiError> {
    let post = repo::toggle_like(&pool, &id, &user.user_id())?.ok_or(ApiError::NotFound("Post"))?;
    Ok(Json(post))
}

fn existing_post(pool: &DbPool, post_id: &str) -> Result<SocialPost, ApiError> {
    document_repo::get::<SocialPost>(pool, post_id)?.ok_or(ApiError::NotFound("Post"))
}

/// Handler for GET `/posts/{id}/comments`
pub async fn list_comments_handler(
    State(pool): State<Arc<DbPool>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PostComment>>, ApiError> {
    let post = existing_post(&pool, &id)?;
    Ok(Json(repo::list_comments(&pool, &post.id)?))
}

/// Handler for POST `/posts/{id}/comments`
pub async fn add_comment_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<TextDto>,
) -> Result<(StatusCode, Json<PostComment>), ApiError> {
    require_text("text", &payload.text)?;
    let post = existing_post(&pool, &id)?;

    let comment = repo::add_comment(
        &pool,
        &post.id,
        AuthorSnapshot::from(&user.profile),
        payload.text.trim().to_string(),
    )?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Handler for GET `/messages/{user_id}`
///
/// Both directions of the conversation with `user_id`, oldest first.
pub async fn list_direct_messages_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(other): Path<String>,
) -> Result<Json<Vec<DirectMessage>>, ApiError> {
    Ok(Json(repo::list_conversation(&pool, &user.user_id(), &other)?))
}

/// Handler for sending a direct message
///
/// This function handles POST requests to `/messages/{user_id}`.
///
/// ### Errors
///
/// - 400 for blank text or a message to oneself
/// - 404 if the recipient does not exist
pub async fn send_direct_message_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(recipient): Path<String>,
    Json(payload): Json<TextDto>,
) -> Result<(StatusCode, Json<DirectMessage>), ApiError> {
    require_text("text", &payload.text)?;
    if recipient == user.user_id() {
        return Err(ApiError::Validation("Cannot message yourself".to_string()));
    }
    repo::get_profile(&pool, &recipient)?.ok_or(ApiError::NotFound("User"))?;

    let message = repo::send_direct_message(&pool, &user.user_id(), &recipient, payload.text.trim().to_string())?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{login, test_state};

    fn text(s: &str) -> Json<TextDto> {
        Json(TextDto { text: s.to_string() })
    }

    #[tokio::test]
    async fn test_group_messages_members_only() {
        let state = test_state();
        let ada = login(&state, "ada");
        let bob = login(&state, "bob");

        let (_, Json(group)) = create_group_handler(
            State(state.pool.clone()),
            ada.clone(),
            Json(CreateGroupDto { name: "Calculus".to_string(), subject: "Math".to_string() }),
        )
        .await
        .unwrap();

        let (status, _) =
            post_group_message_handler(State(state.pool.clone()), ada.clone(), Path(group.id.clone()), text("hello"))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let outsider = post_group_message_handler(State(state.pool.clone()), bob.clone(), Path(group.id.clone()), text("hi"))
            .await;
        assert!(matches!(outsider, Err(ApiError::Forbidden)));
        let peek = list_group_messages_handler(State(state.pool.clone()), bob.clone(), Path(group.id.clone())).await;
        assert!(matches!(peek, Err(ApiError::Forbidden)));

        let Json(joined) = join_group_handler(State(state.pool.clone()), bob.clone(), Path(group.id.clone())).await.unwrap();
        assert!(joined.member_ids.contains(&bob.0.user_id()));
        let Json(messages) = list_group_messages_handler(State(state.pool.clone()), bob, Path(group.id))
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender.name, "ada");
    }

    #[tokio::test]
    async fn test_join_unknown_group() {
        let state = test_state();
        let ada = login(&state, "ada");
        let result = join_group_handler(State(state.pool.clone()), ada, Path("nope".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_feed_likes_and_comments() {
        let state = test_state();
        let ada = login(&state, "ada");
        let bob = login(&state, "bob");

        let (_, Json(post)) = create_post_handler(State(state.pool.clone()), ada.clone(), text("Finished chapter 3"))
            .await
            .unwrap();

        let Json(liked) = like_post_handler(State(state.pool.clone()), bob.clone(), Path(post.id.clone())).await.unwrap();
        assert_eq!(liked.likes, vec![bob.0.user_id()]);
        let Json(unliked) = like_post_handler(State(state.pool.clone()), bob.clone(), Path(post.id.clone())).await.unwrap();
        assert!(unliked.likes.is_empty());

        let (status, _) = add_comment_handler(State(state.pool.clone()), bob.clone(), Path(post.id.clone()), text("Nice"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let Json(comments) = list_comments_handler(State(state.pool.clone()), ada.clone(), Path(post.id.clone()))
            .await
            .unwrap();
        assert_eq!(comments.len(), 1);

        let Json(feed) = list_feed_handler(State(state.pool.clone()), ada, Query(LimitQuery::default()))
            .await
            .unwrap();
        assert_eq!(feed.len(), 1);

        let missing = add_comment_handler(State(state.pool.clone()), bob, Path("nope".to_string()), text("?")).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_direct_messages() {
        let state = test_state();
        let ada = login(&state, "ada");
        let bob = login(&state, "bob");
        let bob_id = bob.0.user_id();
        let ada_id = ada.0.user_id();

        let (status, Json(sent)) =
            send_direct_message_handler(State(state.pool.clone()), ada.clone(), Path(bob_id.clone()), text("hi bob"))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sent.recipient_id, bob_id);
        let (status, _) =
            send_direct_message_handler(State(state.pool.clone()), bob.clone(), Path(ada_id.clone()), text("hi ada"))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(conversation) = list_direct_messages_handler(State(state.pool.clone()), ada.clone(), Path(bob_id))
            .await
            .unwrap();
        let texts: Vec<_> = conversation.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hi bob", "hi ada"]);

        let to_self = send_direct_message_handler(State(state.pool.clone()), ada.clone(), Path(ada_id), text("me")).await;
        assert!(matches!(to_self, Err(ApiError::Validation(_))));

        let to_ghost = send_direct_message_handler(State(state.pool.clone()), ada, Path("ghost".to_string()), text("?")).await;
        assert!(matches!(to_ghost, Err(ApiError::NotFound(_))));
    }
}
