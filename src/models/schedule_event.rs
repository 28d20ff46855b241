use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Record;

/// A calendar entry on a user's study plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    /// Unique identifier for the event (UUID v4 as string)
    id: String,

    owner_id: String,

    title: String,

    subject: String,

    /// The day the event takes place
    date: NaiveDate,

    /// Local start time, "HH:MM"
    start_time: String,

    duration_minutes: u32,

    /// Free-form category such as "study", "break" or "review"
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    description: Option<String>,

    created_at: DateTime<Utc>,
}

impl Record for ScheduleEvent {
    const COLLECTION: &'static str = "schedule_events";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.owner_id
    }
}

impl ScheduleEvent {
    /// Creates a new event with a fresh id
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: String,
        title: String,
        subject: String,
        date: NaiveDate,
        start_time: String,
        duration_minutes: u32,
        kind: String,
        description: Option<String>,
    ) -> Self {
        Self::new_with_id(
            Uuid::new_v4().to_string(),
            owner_id,
            title,
            subject,
            date,
            start_time,
            duration_minutes,
            kind,
            description,
        )
    }

    /// Creates an event that keeps an id assigned elsewhere
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_id(
        id: String,
        owner_id: String,
        title: String,
        subject: String,
        date: NaiveDate,
        start_time: String,
        duration_minutes: u32,
        kind: String,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            owner_id,
            title,
            subject,
            date,
            start_time,
            duration_minutes,
            kind,
            description,
            created_at: Utc::now(),
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

    pub fn get_subject(&self) -> String {
        self.subject.clone()
    }

    pub fn get_date(&self) -> NaiveDate {
        self.date
    }

    pub fn get_start_time(&self) -> String {
        self.start_time.clone()
    }

    pub fn get_duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn get_kind(&self) -> String {
        self.kind.clone()
    }

    pub fn get_description(&self) -> Option<String> {
        self.description.clone()
    }

    /// Parsed start time; unparseable times sort to midnight
    pub fn start_time_of_day(&self) -> NaiveTime {
        NaiveTime::parse_from_str(&self.start_time, "%H:%M").unwrap_or(NaiveTime::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_type() {
        let event = ScheduleEvent::new(
            "u1".to_string(),
            "Algebra".to_string(),
            "Math".to_string(),
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            "09:30".to_string(),
            50,
            "study".to_string(),
            None,
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "study");
        assert_eq!(json["date"], "2025-04-02");
        assert_eq!(event.start_time_of_day(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_bad_start_time_sorts_first() {
        let event = ScheduleEvent::new(
            "u1".to_string(),
            "x".to_string(),
            "y".to_string(),
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            "morning".to_string(),
            30,
            "study".to_string(),
            None,
        );
        assert_eq!(event.start_time_of_day(), NaiveTime::MIN);
    }
}
