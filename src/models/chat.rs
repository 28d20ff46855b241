use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Record;

/// Who authored a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: String) -> Self {
        Self { role, text, timestamp: Utc::now() }
    }
}

/// A titled conversation with the tutor
///
/// `messages` is the whole transcript. It is saved by full replacement on
/// every turn, so the last writer wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    id: String,
    owner_id: String,
    title: String,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Record for ChatSession {
    const COLLECTION: &'static str = "chat_sessions";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.owner_id
    }
}

impl ChatSession {
    pub fn new(owner_id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_owner_id(&self) -> String {
        self.owner_id.clone()
    }

    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    pub fn get_messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Appends a user turn
    pub fn push_user(&mut self, text: String) {
        self.push(ChatMessage::new(ChatRole::User, text));
    }

    /// Appends an assistant turn
    pub fn push_model(&mut self, text: String) {
        self.push(ChatMessage::new(ChatRole::Model, text));
    }

    fn push(&mut self, message: ChatMessage) {
        self.updated_at = message.timestamp;
        self.messages.push(message);
    }
}

/// A stored answer about an uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub id: String,
    pub owner_id: String,
    pub prompt: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl Record for ImageAnalysis {
    const COLLECTION: &'static str = "image_analyses";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.owner_id
    }
}

impl ImageAnalysis {
    pub fn new(owner_id: String, prompt: String, answer: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            prompt,
            answer,
            created_at: Utc::now(),
        }
    }
}
