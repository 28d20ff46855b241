use crate::db::DbPool;
use crate::models::{
    AuthorSnapshot, DirectMessage, GroupMessage, PostComment, SocialPost, StudyGroup,
    conversation_key,
};
use crate::repo::document_repo;
use anyhow::Result;
use tracing::{debug, info, instrument};

#[instrument(skip(pool))]
pub fn create_group(pool: &DbPool, owner_id: &str, name: String, subject: String) -> Result<StudyGroup> {
    let group = StudyGroup::new(owner_id.to_string(), name, subject);
    document_repo::put(pool, &group)?;
    info!("Created group {}", group.id);
    Ok(group)
}

#[instrument(skip(pool))]
pub fn get_group(pool: &DbPool, group_id: &str) -> Result<Option<StudyGroup>> {
    document_repo::get(pool, group_id)
}

/// Lists every group, newest first
#[instrument(skip(pool))]
pub fn list_groups(pool: &DbPool) -> Result<Vec<StudyGroup>> {
    let mut groups: Vec<StudyGroup> = document_repo::list_all(pool)?;
    groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(groups)
}

/// Adds `user_id` to a group
///
/// ### Returns
///
/// The group after joining, or None if it does not exist
#[instrument(skip(pool))]
pub fn join_group(pool: &DbPool, group_id: &str, user_id: &str) -> Result<Option<StudyGroup>> {
    let Some(mut group) = get_group(pool, group_id)? else {
        return Ok(None);
    };
    if group.join(user_id) {
        document_repo::put(pool, &group)?;
        info!("User joined group");
    } else {
        debug!("User already a member");
    }
    Ok(Some(group))
}

#[instrument(skip(pool, sender, text))]
pub fn post_group_message(pool: &DbPool, group_id: &str, sender: AuthorSnapshot, text: String) -> Result<GroupMessage> {
    let message = GroupMessage::new(group_id.to_string(), sender, text);
    document_repo::put(pool, &message)?;
    Ok(message)
}

/// Lists a group's messages, oldest first
#[instrument(skip(pool))]
pub fn list_group_messages(pool: &DbPool, group_id: &str) -> Result<Vec<GroupMessage>> {
    let mut messages: Vec<GroupMessage> = document_repo::list_by_owner(pool, group_id)?;
    messages.sort_by_key(|m| m.created_at);
    Ok(messages)
}

#[instrument(skip(pool, author, text))]
pub fn create_post(pool: &DbPool, author: AuthorSnapshot, text: String) -> Result<SocialPost> {
    let post = SocialPost::new(author, text);
    document_repo::put(pool, &post)?;
    info!("Created post {}", post.id);
    Ok(post)
}

/// The public feed, newest first
#[instrument(skip(pool))]
pub fn list_feed(pool: &DbPool, limit: usize) -> Result<Vec<SocialPost>> {
    let mut posts: Vec<SocialPost> = document_repo::list_all(pool)?;
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts.truncate(limit);
    Ok(posts)
}

/// Likes or unlikes a post
#[instrument(skip(pool))]
pub fn toggle_like(pool: &DbPool, post_id: &str, user_id: &str) -> Result<Option<SocialPost>> {
    let post: Option<SocialPost> = document_repo::get(pool, post_id)?;
    let Some(mut post) = post else {
        return Ok(None);
    };
    post.toggle_like(user_id);
    document_repo::put(pool, &post)?;
    Ok(Some(post))
}

#[instrument(skip(pool, author, text))]
pub fn add_comment(pool: &DbPool, post_id: &str, author: AuthorSnapshot, text: String) -> Result<PostComment> {
    let comment = PostComment::new(post_id.to_string(), author, text);
    document_repo::put(pool, &comment)?;
    Ok(comment)
}

#[instrument(skip(pool))]
pub fn list_comments(pool: &DbPool, post_id: &str) -> Result<Vec<PostComment>> {
    let mut comments: Vec<PostComment> = document_repo::list_by_owner(pool, post_id)?;
    comments.sort_by_key(|c| c.created_at);
    Ok(comments)
}

#[instrument(skip(pool, text))]
pub fn send_direct_message(pool: &DbPool, sender_id: &str, recipient_id: &str, text: String) -> Result<DirectMessage> {
    let message = DirectMessage::new(sender_id.to_string(), recipient_id.to_string(), text);
    document_repo::put(pool, &message)?;
    Ok(message)
}

/// Both directions of a conversation, oldest first
#[instrument(skip(pool))]
pub fn list_conversation(pool: &DbPool, user_a: &str, user_b: &str) -> Result<Vec<DirectMessage>> {
    let key = conversation_key(user_a, user_b);
    let mut messages: Vec<DirectMessage> = document_repo::list_by_owner(pool, &key)?;
    messages.sort_by_key(|m| m.created_at);
    Ok(messages)
}
