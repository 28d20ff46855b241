use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use studymate::ai::SseDecoder;
use studymate::dto::{
    ChatTurnResponse, CreateChatDto, CreateTaskDto, GenerateScheduleDto, LoginDto, RegisterDto,
    SendMessageDto, SessionResponse, StreamDoneDto,
};
use studymate::models::{ChatSession, ScheduleEvent, Task, TaskStatus};
use studymate::session::SESSION_HEADER;
use studymate::stats::Dashboard;

/// Error type for CLI client operations
#[derive(Debug)]
pub enum ClientError {
    /// Server returned an error status with a message body
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    Request(reqwest::Error),
    /// A streamed reply ended with an error event or could not be read
    Stream(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status.as_u16(), message)
            }
            ClientError::Request(err) => write!(f, "{}", err),
            ClientError::Stream(message) => write!(f, "Stream error: {}", message),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(err) => Some(err),
            ClientError::Server { .. } | ClientError::Stream(_) => None,
        }
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = match self.json::<serde_json::Value>().await {
            Ok(body) => body.get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        };
        Err(ClientError::Server { status, message })
    }
}

#[derive(Deserialize)]
struct Fragment {
    text: String,
}

#[derive(Deserialize)]
struct StreamFailure {
    error: String,
}

fn parse_event<T: for<'de> Deserialize<'de>>(data: &str) -> Result<T, ClientError> {
    serde_json::from_str(data).map_err(|e| ClientError::Stream(format!("bad event payload: {e}")))
}

/// HTTP client wrapper for communicating with the studymate server
pub struct StudymateClient {
    /// The base URL of the server (e.g. "http://localhost:3000")
    base_url: String,
    /// Sent as the session header when present
    session: Option<String>,
    /// The underlying HTTP client
    client: Client,
}

impl StudymateClient {
    /// Creates a new StudymateClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the studymate server
    /// * `session` - Session id from a previous login, if any
    pub fn new(base_url: String, session: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            client: Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.session {
            Some(id) => builder.header(SESSION_HEADER, id),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        builder.send().await.map_err(ClientError::Request)?.check().await
    }

    // ── Session endpoints ────────────────────────────────────────────

    /// Registers a new user and opens a session
    pub async fn register(&self, name: String, email: String) -> Result<SessionResponse, ClientError> {
        let dto = RegisterDto { name, email };
        let response = self.send(self.request(Method::POST, "/profiles").json(&dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Opens a session for an existing user
    pub async fn login(&self, user_id: String, email: String) -> Result<SessionResponse, ClientError> {
        let dto = LoginDto { user_id, email };
        let response = self.send(self.request(Method::POST, "/sessions").json(&dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Ends the current session
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, "/sessions/current")).await?;
        Ok(())
    }

    // ── Task endpoints ───────────────────────────────────────────────

    pub async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, ClientError> {
        let mut builder = self.request(Method::GET, "/tasks");
        if let Some(status) = status {
            let value = match status {
                TaskStatus::Pending => "pending",
                TaskStatus::Done => "done",
            };
            builder = builder.query(&[("status", value)]);
        }
        let response = self.send(builder).await?;
        response.json().await.map_err(ClientError::Request)
    }

    pub async fn create_task(&self, dto: &CreateTaskDto) -> Result<Task, ClientError> {
        let response = self.send(self.request(Method::POST, "/tasks").json(dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Flips a task between pending and done
    pub async fn toggle_task(&self, id: &str) -> Result<Task, ClientError> {
        let response = self.send(self.request(Method::POST, &format!("/tasks/{}/toggle", id))).await?;
        response.json().await.map_err(ClientError::Request)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, &format!("/tasks/{}", id))).await?;
        Ok(())
    }

    // ── Schedule endpoints ───────────────────────────────────────────

    pub async fn list_events(&self, date: Option<NaiveDate>) -> Result<Vec<ScheduleEvent>, ClientError> {
        let mut builder = self.request(Method::GET, "/schedule");
        if let Some(date) = date {
            builder = builder.query(&[("date", date.to_string())]);
        }
        let response = self.send(builder).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Asks the server to plan a day; the generated entries are already stored
    pub async fn generate_schedule(&self, dto: &GenerateScheduleDto) -> Result<Vec<ScheduleEvent>, ClientError> {
        let response = self.send(self.request(Method::POST, "/schedule/generate").json(dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Chat endpoints ───────────────────────────────────────────────

    pub async fn list_chats(&self) -> Result<Vec<ChatSession>, ClientError> {
        let response = self.send(self.request(Method::GET, "/chats")).await?;
        response.json().await.map_err(ClientError::Request)
    }

    pub async fn create_chat(&self, title: Option<String>) -> Result<ChatSession, ClientError> {
        let dto = CreateChatDto { title };
        let response = self.send(self.request(Method::POST, "/chats").json(&dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Sends one message and waits for the whole reply
    pub async fn send_message(&self, chat_id: &str, text: String) -> Result<ChatTurnResponse, ClientError> {
        let dto = SendMessageDto { text };
        let path = format!("/chats/{}/messages", chat_id);
        let response = self.send(self.request(Method::POST, &path).json(&dto)).await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Sends one message and hands each reply fragment to `on_fragment`
    ///
    /// Dropping the returned future closes the connection, which makes the
    /// server abandon the turn.
    ///
    /// ### Returns
    ///
    /// The final `done` event, carrying the full reply
    pub async fn stream_message<F>(&self, chat_id: &str, text: String, mut on_fragment: F) -> Result<StreamDoneDto, ClientError>
    where
        F: FnMut(&str),
    {
        let dto = SendMessageDto { text };
        let path = format!("/chats/{}/stream", chat_id);
        let mut response = self.send(self.request(Method::POST, &path).json(&dto)).await?;

        let mut decoder = SseDecoder::new();
        loop {
            let chunk = response.chunk().await.map_err(ClientError::Request)?;
            let finished = chunk.is_none();
            let events = match chunk {
                Some(bytes) => decoder.push(&bytes),
                None => decoder.finish(),
            };

            for event in events {
                match event.event.as_deref() {
                    Some("fragment") => {
                        let fragment: Fragment = parse_event(&event.data)?;
                        on_fragment(&fragment.text);
                    }
                    Some("done") => return parse_event(&event.data),
                    Some("error") => {
                        let failure: StreamFailure = parse_event(&event.data)?;
                        return Err(ClientError::Stream(failure.error));
                    }
                    _ => {}
                }
            }

            if finished {
                return Err(ClientError::Stream("connection closed before the reply finished".to_string()));
            }
        }
    }

    // ── Dashboard ────────────────────────────────────────────────────

    pub async fn dashboard(&self) -> Result<Dashboard, ClientError> {
        let response = self.send(self.request(Method::GET, "/dashboard")).await?;
        response.json().await.map_err(ClientError::Request)
    }
}
