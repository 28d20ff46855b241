use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Record;

/// An immutable log row of completed focus time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    id: String,
    owner_id: String,
    subject: String,
    duration_minutes: u32,
    /// Day the session counts towards
    date: NaiveDate,
    timestamp: DateTime<Utc>,
}

impl Record for StudySession {
    const COLLECTION: &'static str = "study_sessions";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.owner_id
    }
}

impl StudySession {
    pub fn new(owner_id: String, subject: String, duration_minutes: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            subject,
            duration_minutes,
            date: timestamp.date_naive(),
            timestamp,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_owner_id(&self) -> String {
        self.owner_id.clone()
    }

    pub fn get_subject(&self) -> String {
        self.subject.clone()
    }

    pub fn get_duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn get_date(&self) -> NaiveDate {
        self.date
    }

    pub fn get_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
