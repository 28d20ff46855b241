use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::transport::ChatTransport;
use super::{AiError, ChatRequest, Dispatcher, ScheduleBrief};
use crate::models::ScheduleEvent;

/// One item of a generated study plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedEvent {
    /// Always freshly assigned, never taken from the model output
    pub id: String,
    pub title: String,
    pub subject: String,
    pub start_time: String,
    pub duration_minutes: u32,
    pub kind: String,
    pub description: String,
}

impl GeneratedEvent {
    /// Turns the item into a calendar entry for `owner_id` on `date`
    pub fn into_event(self, owner_id: &str, date: NaiveDate) -> ScheduleEvent {
        let description = Some(self.description).filter(|d| !d.is_empty());
        ScheduleEvent::new_with_id(
            self.id,
            owner_id.to_string(),
            self.title,
            self.subject,
            date,
            self.start_time,
            self.duration_minutes,
            self.kind,
            description,
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDraft {
    #[serde(default)]
    title: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    start_time: String,
    #[serde(default, deserialize_with = "lenient_minutes")]
    duration_minutes: u32,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    description: String,
}

/// Accepts a number, a float, or a numeric string
fn lenient_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let minutes = match &value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Null => Some(0),
        _ => None,
    };
    minutes
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid durationMinutes: {value}")))
}

/// Removes a surrounding markdown code fence, with or without a language tag
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses model output into plan items
///
/// Accepts a bare JSON array or an object with a `schedule` array, optionally
/// wrapped in a code fence. Every item gets a new id.
///
/// ### Errors
///
/// Returns `AiError::Malformed` if the text is not JSON, has neither shape, or
/// any item is not an event object. No partial result is ever returned.
pub fn parse_schedule(raw: &str) -> Result<Vec<GeneratedEvent>, AiError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| AiError::Malformed(format!("schedule is not valid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("schedule") {
            Some(Value::Array(items)) => items,
            _ => return Err(AiError::Malformed("expected a `schedule` array".to_string())),
        },
        _ => return Err(AiError::Malformed("expected a JSON array of events".to_string())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let draft: EventDraft = serde_json::from_value(item)
                .map_err(|e| AiError::Malformed(format!("schedule item {index}: {e}")))?;
            Ok(GeneratedEvent {
                id: Uuid::new_v4().to_string(),
                title: draft.title,
                subject: draft.subject,
                start_time: draft.start_time,
                duration_minutes: draft.duration_minutes,
                kind: draft.kind,
                description: draft.description,
            })
        })
        .collect()
}

/// Asks the model for a study plan and parses it
///
/// ### Errors
///
/// Any dispatcher error, or `AiError::Malformed` when the output does not
/// parse
#[instrument(skip(dispatcher, brief), fields(date = %brief.date))]
pub async fn generate_schedule<T: ChatTransport>(
    dispatcher: &Dispatcher<T>,
    brief: &ScheduleBrief,
) -> Result<Vec<GeneratedEvent>, AiError> {
    let text = dispatcher.complete_text(&ChatRequest::schedule(brief)).await?;
    let events = parse_schedule(&text)?;
    info!("Generated {} schedule items", events.len());
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fenced_array() {
        let raw = "```json\n[{\"title\":\"Study\",\"subject\":\"Math\",\"startTime\":\"09:00\",\"durationMinutes\":50,\"type\":\"study\",\"description\":\"x\"}]\n```";
        let events = parse_schedule(raw).unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.title, "Study");
        assert_eq!(event.subject, "Math");
        assert_eq!(event.start_time, "09:00");
        assert_eq!(event.duration_minutes, 50);
        assert_eq!(event.kind, "study");
        assert_eq!(event.description, "x");
        assert!(Uuid::parse_str(&event.id).is_ok());
    }

    #[test]
    fn test_wrapped_object_and_plain_fence() {
        let raw = "```\n{\"schedule\": [{\"title\": \"A\"}, {\"title\": \"B\"}]}\n```";
        let events = parse_schedule(raw).unwrap();
        assert_eq!(events.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_model_ids_are_overwritten() {
        let raw = r#"[{"id": "same", "title": "A"}, {"id": "same", "title": "B"}]"#;
        let events = parse_schedule(raw).unwrap();

        let ids: HashSet<_> = events.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains("same"));
    }

    #[test]
    fn test_lenient_duration() {
        let raw = r#"[{"durationMinutes": "45"}, {"durationMinutes": 30.0}, {"durationMinutes": null}]"#;
        let minutes: Vec<u32> = parse_schedule(raw).unwrap().iter().map(|e| e.duration_minutes).collect();
        assert_eq!(minutes, vec![45, 30, 0]);
    }

    #[test]
    fn test_malformed_inputs_fail_whole() {
        for raw in [
            "not json",
            "{\"title\": \"x\"}",
            "42",
            "[{\"title\": \"ok\"}, 7]",
            "[{\"title\": \"ok\"}, {\"durationMinutes\": \"soon\"}]",
            "```json\n[{\"title\": \"cut",
        ] {
            assert!(matches!(parse_schedule(raw), Err(AiError::Malformed(_))), "{raw}");
        }
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  []  "), "[]");
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```[2]```"), "[2]");
    }

    #[test]
    fn test_into_event() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let generated = parse_schedule(r#"[{"title":"Review","startTime":"14:00","durationMinutes":25,"type":"review"}]"#)
            .unwrap()
            .remove(0);
        let id = generated.id.clone();
        let event = generated.into_event("u1", date);

        assert_eq!(event.get_id(), id);
        assert_eq!(event.get_owner_id(), "u1");
        assert_eq!(event.get_date(), date);
        assert_eq!(event.get_kind(), "review");
        assert_eq!(event.get_description(), None);
    }
}
