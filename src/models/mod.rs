/// Data models module
///
/// This module defines the entities kept in the document store. Every entity
/// implements `Record`, which tells the store its collection, id and owner key.

mod json_value;
pub use json_value::JsonValue;

mod document;
pub use document::{Document, Record};

mod profile;
pub use profile::{FriendError, ShopError, UserProfile, MINUTES_PER_CREDIT, XP_PER_LEVEL};

pub mod shop;
pub use shop::ShopItem;

mod task;
pub use task::{Priority, Task, TaskStatus};

mod schedule_event;
pub use schedule_event::ScheduleEvent;

mod study_session;
pub use study_session::StudySession;

mod chat;
pub use chat::{ChatMessage, ChatRole, ChatSession, ImageAnalysis};

mod session_record;
pub use session_record::SessionRecord;

mod social;
pub use social::{
    AuthorSnapshot, DirectMessage, GroupMessage, PostComment, SocialPost, StudyGroup,
    conversation_key,
};
