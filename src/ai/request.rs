use serde::Serialize;
use serde_json::{Value, json};

use crate::models::{ChatMessage, ChatRole};

/// System prompt used for tutoring conversations
pub const TUTOR_PROMPT: &str = "You are a patient, encouraging study tutor. \
Explain concepts step by step, check understanding with short questions, \
and keep answers focused on what the student asked.";

/// Wire role of a message sent to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    System,
    User,
    Assistant,
}

impl From<ChatRole> for WireRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => WireRole::User,
            ChatRole::Model => WireRole::Assistant,
        }
    }
}

/// Message content: plain text, or a list of parts for multimodal input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub content: WireContent,
}

impl WireMessage {
    pub fn text(role: WireRole, text: impl Into<String>) -> Self {
        Self { role, content: WireContent::Text(text.into()) }
    }
}

/// Output format hint sent to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

/// A chat-completion request, independent of which model will serve it
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
    pub response_format: ResponseFormat,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<WireMessage>) -> Self {
        Self {
            messages,
            response_format: ResponseFormat::Text,
            stream: false,
        }
    }

    /// A tutoring turn: system prompt followed by the whole transcript
    pub fn chat(transcript: &[ChatMessage]) -> Self {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(WireMessage::text(WireRole::System, TUTOR_PROMPT));
        messages.extend(
            transcript
                .iter()
                .map(|m| WireMessage::text(m.role.into(), m.text.clone())),
        );
        Self::new(messages)
    }

    /// The same turn, delivered incrementally
    pub fn streaming_chat(transcript: &[ChatMessage]) -> Self {
        Self { stream: true, ..Self::chat(transcript) }
    }

    /// A study plan request asking for a raw JSON array of events
    pub fn schedule(brief: &ScheduleBrief) -> Self {
        let system = "You are a study planner. Respond ONLY with a raw JSON array, no prose and no markdown. \
Each element must be an object with exactly these keys: \
\"title\" (string), \"subject\" (string), \"startTime\" (\"HH:MM\", 24h), \
\"durationMinutes\" (integer), \"type\" (one of \"study\", \"break\", \"review\"), \
\"description\" (string).";
        let user = format!(
            "Plan my study day for {date}. Goal: {goal}. Subjects: {subjects}. \
I have {hours} hours available starting at {start}. Include short breaks.",
            date = brief.date,
            goal = brief.goal,
            subjects = brief.subjects.join(", "),
            hours = brief.available_hours,
            start = brief.start_time,
        );
        Self {
            response_format: ResponseFormat::Json,
            ..Self::new(vec![
                WireMessage::text(WireRole::System, system),
                WireMessage::text(WireRole::User, user),
            ])
        }
    }

    /// A question about an image, sent as a data URL
    pub fn image_analysis(prompt: &str, mime_type: &str, image_base64: &str) -> Self {
        let parts = vec![
            ContentPart::Text { text: prompt.to_string() },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{mime_type};base64,{image_base64}"),
                },
            },
        ];
        Self::new(vec![
            WireMessage::text(WireRole::System, TUTOR_PROMPT),
            WireMessage { role: WireRole::User, content: WireContent::Parts(parts) },
        ])
    }

    /// The JSON body for one attempt against `model`
    pub fn to_body(&self, model: &str) -> Value {
        let mut body = json!({
            "model": model,
            "messages": self.messages,
        });
        if self.response_format == ResponseFormat::Json {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if self.stream {
            body["stream"] = Value::Bool(true);
        }
        body
    }
}

/// What the student asked the planner for
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleBrief {
    pub date: chrono::NaiveDate,
    pub goal: String,
    pub subjects: Vec<String>,
    pub available_hours: f32,
    pub start_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_body_maps_roles() {
        let transcript = vec![
            ChatMessage::new(ChatRole::User, "2+2".to_string()),
            ChatMessage::new(ChatRole::Model, "4".to_string()),
        ];
        let body = ChatRequest::chat(&transcript).to_body("A");

        assert_eq!(body["model"], "A");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "2+2");
        assert_eq!(body["messages"][2]["role"], "assistant");
        assert!(body.get("response_format").is_none());
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_streaming_flag() {
        let body = ChatRequest::streaming_chat(&[]).to_body("A");
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_schedule_requests_json() {
        let brief = ScheduleBrief {
            date: chrono::NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            goal: "Pass the midterm".to_string(),
            subjects: vec!["Math".to_string(), "Physics".to_string()],
            available_hours: 3.0,
            start_time: "09:00".to_string(),
        };
        let body = ChatRequest::schedule(&brief).to_body("B");

        assert_eq!(body["response_format"]["type"], "json_object");
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Math, Physics"));
        assert!(user.contains("2025-02-03"));
    }

    #[test]
    fn test_image_parts() {
        let body = ChatRequest::image_analysis("What is this?", "image/png", "AAAA").to_body("C");
        let parts = &body["messages"][1]["content"];

        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "What is this?");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }
}
