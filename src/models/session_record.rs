use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Record;

/// A login session, keyed by an opaque id handed to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    id: String,
    user_id: String,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl Record for SessionRecord {
    const COLLECTION: &'static str = "sessions";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.user_id
    }
}

impl SessionRecord {
    pub fn new(user_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get_last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }
}
