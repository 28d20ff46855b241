use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
}

/// A to-do entry owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for the task (UUID v4 as string)
    id: String,

    /// The user who owns this task
    owner_id: String,

    title: String,

    subject: String,

    #[serde(default)]
    priority: Priority,

    #[serde(default)]
    status: TaskStatus,

    /// When the task is due, if ever
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,

    /// How long before the due date a reminder should fire
    #[serde(default)]
    reminder_offset_minutes: Option<u32>,

    created_at: DateTime<Utc>,
}

impl Record for Task {
    const COLLECTION: &'static str = "tasks";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.owner_id
    }
}

impl Task {
    /// Creates a new pending task
    ///
    /// ### Arguments
    ///
    /// * `owner_id` - The user the task belongs to
    /// * `title` - What needs doing
    /// * `subject` - The subject the task is filed under
    /// * `priority` - How urgent the task is
    pub fn new(owner_id: String, title: String, subject: String, priority: Priority) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title,
            subject,
            priority,
            status: TaskStatus::Pending,
            due_date: None,
            reminder_offset_minutes: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the due date and optional reminder offset
    pub fn with_due_date(mut self, due_date: DateTime<Utc>, reminder_offset_minutes: Option<u32>) -> Self {
        self.due_date = Some(due_date);
        self.reminder_offset_minutes = reminder_offset_minutes;
        self
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

    pub fn get_subject(&self) -> String {
        self.subject.clone()
    }

    pub fn get_priority(&self) -> Priority {
        self.priority
    }

    pub fn get_status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn get_due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn get_reminder_offset_minutes(&self) -> Option<u32> {
        self.reminder_offset_minutes
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Flips the task between pending and done
    pub fn toggle(&mut self) {
        self.status = match self.status {
            TaskStatus::Pending => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Pending,
        };
    }

    /// When the reminder for this task should fire
    ///
    /// ### Returns
    ///
    /// The due date minus the reminder offset, or `None` if the task has no
    /// due date or no reminder
    pub fn reminder_at(&self) -> Option<DateTime<Utc>> {
        let due = self.due_date?;
        let offset = self.reminder_offset_minutes?;
        Some(due - Duration::minutes(i64::from(offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_task_new() {
        let task = Task::new("u1".to_string(), "Read ch. 4".to_string(), "Biology".to_string(), Priority::High);

        assert!(Uuid::parse_str(&task.get_id()).is_ok());
        assert_eq!(task.get_status(), TaskStatus::Pending);
        assert_eq!(task.get_priority(), Priority::High);
        assert!(task.reminder_at().is_none());
    }

    #[test]
    fn test_toggle_round_trips() {
        let mut task = Task::new("u1".to_string(), "t".to_string(), "s".to_string(), Priority::Low);
        task.toggle();
        assert!(task.is_done());
        task.toggle();
        assert_eq!(task.get_status(), TaskStatus::Pending);
    }

    #[test]
    fn test_reminder_at() {
        let due = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let task = Task::new("u1".to_string(), "Essay".to_string(), "History".to_string(), Priority::Medium)
            .with_due_date(due, Some(90));

        assert_eq!(task.reminder_at(), Some(Utc.with_ymd_and_hms(2025, 5, 1, 10, 30, 0).unwrap()));

        let no_offset = Task::new("u1".to_string(), "Essay".to_string(), "History".to_string(), Priority::Medium)
            .with_due_date(due, None);
        assert!(no_offset.reminder_at().is_none());
    }

    #[test]
    fn test_wire_format() {
        let task = Task::new("u1".to_string(), "t".to_string(), "s".to_string(), Priority::High);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["priority"], "high");
        assert_eq!(json["status"], "pending");
    }
}
