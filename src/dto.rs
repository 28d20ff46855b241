use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::ScheduleBrief;
use crate::models::{ChatSession, Priority, StudySession, Task, TaskStatus, UserProfile};

/// Data transfer object for registering a new user
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterDto {
    pub name: String,
    pub email: String,
}

/// Data transfer object for logging in as an existing user
///
/// The id alone is public, so the registered email must match too.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginDto {
    pub user_id: String,
    pub email: String,
}

/// Returned by register and login; `session_id` goes in the `x-session-id` header
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionResponse {
    pub session_id: String,
    pub profile: UserProfile,
}

/// What other users may see of a profile in rankings and search results
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicProfileDto {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub xp: u64,
    pub level: u64,
    pub streak: u32,
}

impl From<UserProfile> for PublicProfileDto {
    fn from(profile: UserProfile) -> Self {
        PublicProfileDto {
            id: profile.get_id(),
            name: profile.get_name(),
            avatar: profile.get_avatar(),
            xp: profile.get_xp(),
            level: profile.level(),
            streak: profile.get_streak(),
        }
    }
}

/// Profile preferences a user may change; absent fields are left alone
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UpdateProfileDto {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub theme: Option<String>,
    pub daily_goal_minutes: Option<u32>,
}

/// Query parameters for ranked or paged listings
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PurchaseDto {
    pub item_id: String,
}

/// Sends a friend request to `user_id`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FriendRequestDto {
    pub user_id: String,
}

/// Data transfer object for creating a task
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateTaskDto {
    pub title: String,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    /// Minutes before the due date at which to remind
    #[serde(default)]
    pub reminder_offset_minutes: Option<u32>,
}

/// Filters the task list
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
}

/// A pending task and when its reminder fires
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReminderDto {
    pub task: Task,
    pub remind_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScheduleQuery {
    pub date: Option<NaiveDate>,
}

fn default_event_kind() -> String {
    "study".to_string()
}

fn default_start_time() -> String {
    "09:00".to_string()
}

/// Data transfer object for adding a calendar entry by hand
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventDto {
    pub title: String,
    #[serde(default)]
    pub subject: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_minutes: u32,
    #[serde(rename = "type", default = "default_event_kind")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Data transfer object for asking the planner for a day's schedule
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleDto {
    pub date: NaiveDate,
    #[serde(default)]
    pub goal: String,
    pub subjects: Vec<String>,
    pub available_hours: f32,
    #[serde(default = "default_start_time")]
    pub start_time: String,
}

impl From<GenerateScheduleDto> for ScheduleBrief {
    fn from(dto: GenerateScheduleDto) -> Self {
        ScheduleBrief {
            date: dto.date,
            goal: dto.goal,
            subjects: dto.subjects,
            available_hours: dto.available_hours,
            start_time: dto.start_time,
        }
    }
}

/// Data transfer object for logging a finished focus session
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogStudySessionDto {
    pub subject: String,
    pub duration_minutes: u32,
    /// Defaults to the time the request is handled
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The stored session and the profile after XP and credits were awarded
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StudySessionResponse {
    pub session: StudySession,
    pub profile: UserProfile,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CreateChatDto {
    pub title: Option<String>,
}

/// A user turn in a tutoring chat
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SendMessageDto {
    pub text: String,
}

/// The updated transcript and the model's reply
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatTurnResponse {
    pub session: ChatSession,
    pub reply: String,
}

/// Payload of the final `done` event of a streamed turn
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StreamDoneDto {
    pub session_id: String,
    pub text: String,
}

/// Data transfer object for a question about an image
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnalyzeImageDto {
    pub prompt: String,
    pub mime_type: String,
    /// Image bytes, base64-encoded
    pub image_base64: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateGroupDto {
    pub name: String,
    #[serde(default)]
    pub subject: String,
}

/// Free text for group messages, posts, comments and direct messages
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TextDto {
    pub text: String,
}
