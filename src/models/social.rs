use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Record, UserProfile};

/// Author details copied into social records at creation time
///
/// Later profile edits are not propagated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl From<&UserProfile> for AuthorSnapshot {
    fn from(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.get_id(),
            name: profile.get_name(),
            avatar: profile.get_avatar(),
        }
    }
}

/// A study group users can join and chat in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyGroup {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub owner_id: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for StudyGroup {
    const COLLECTION: &'static str = "groups";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.owner_id
    }
}

impl StudyGroup {
    /// Creates a group with its owner as the first member
    pub fn new(owner_id: String, name: String, subject: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            subject,
            member_ids: vec![owner_id.clone()],
            owner_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|m| m == user_id)
    }

    /// Adds a member
    ///
    /// ### Returns
    ///
    /// `false` if the user was already a member
    pub fn join(&mut self, user_id: &str) -> bool {
        if self.is_member(user_id) {
            return false;
        }
        self.member_ids.push(user_id.to_string());
        true
    }
}

/// A message posted in a study group, partitioned by group id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub id: String,
    pub group_id: String,
    pub sender: AuthorSnapshot,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Record for GroupMessage {
    const COLLECTION: &'static str = "group_messages";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.group_id
    }
}

impl GroupMessage {
    pub fn new(group_id: String, sender: AuthorSnapshot, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            group_id,
            sender,
            text,
            created_at: Utc::now(),
        }
    }
}

/// A post on the public feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: String,
    pub author: AuthorSnapshot,
    pub text: String,
    /// User ids that liked the post
    #[serde(default)]
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for SocialPost {
    const COLLECTION: &'static str = "posts";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.author.user_id
    }
}

impl SocialPost {
    pub fn new(author: AuthorSnapshot, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author,
            text,
            likes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Likes the post, or removes an existing like
    pub fn toggle_like(&mut self, user_id: &str) {
        match self.likes.iter().position(|l| l == user_id) {
            Some(index) => {
                self.likes.remove(index);
            }
            None => self.likes.push(user_id.to_string()),
        }
    }
}

/// A comment under a post, partitioned by post id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostComment {
    pub id: String,
    pub post_id: String,
    pub author: AuthorSnapshot,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Record for PostComment {
    const COLLECTION: &'static str = "post_comments";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.post_id
    }
}

impl PostComment {
    pub fn new(post_id: String, author: AuthorSnapshot, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            post_id,
            author,
            text,
            created_at: Utc::now(),
        }
    }
}

/// A private message, partitioned by conversation key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Record for DirectMessage {
    const COLLECTION: &'static str = "direct_messages";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.conversation_id
    }
}

impl DirectMessage {
    pub fn new(sender_id: String, recipient_id: String, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_key(&sender_id, &recipient_id),
            sender_id,
            recipient_id,
            text,
            created_at: Utc::now(),
        }
    }
}

/// Key shared by both directions of a conversation between two users
pub fn conversation_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_key_is_symmetric() {
        assert_eq!(conversation_key("alice", "bob"), conversation_key("bob", "alice"));
        assert_eq!(conversation_key("alice", "bob"), "alice:bob");
    }

    #[test]
    fn test_group_join() {
        let mut group = StudyGroup::new("owner".to_string(), "Calc".to_string(), "Math".to_string());
        assert!(group.is_member("owner"));
        assert!(group.join("guest"));
        assert!(!group.join("guest"));
        assert_eq!(group.member_ids.len(), 2);
    }

    #[test]
    fn test_toggle_like() {
        let author = AuthorSnapshot { user_id: "a".to_string(), name: "A".to_string(), avatar: None };
        let mut post = SocialPost::new(author, "Finished my essay!".to_string());
        post.toggle_like("b");
        assert_eq!(post.likes, vec!["b".to_string()]);
        post.toggle_like("b");
        assert!(post.likes.is_empty());
    }

    #[test]
    fn test_author_snapshot_copies_profile() {
        let mut profile = UserProfile::new("Ada".to_string(), "a@x".to_string());
        profile.set_avatar(Some("ada.png".to_string()));
        let snapshot = AuthorSnapshot::from(&profile);

        profile.set_name("Renamed".to_string());
        assert_eq!(snapshot.name, "Ada");
        assert_eq!(snapshot.avatar.as_deref(), Some("ada.png"));
    }
}
