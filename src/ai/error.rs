use thiserror::Error;

/// Failures surfaced by the AI request dispatcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// Every model in the ladder was rejected
    #[error("All models failed (last status {status}): {message}")]
    Exhausted {
        status: u16,
        message: String,
        attempts: u32,
    },
    /// The gateway rejected the request in a way another model would not fix
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    /// No HTTP response at all, after the network retry
    #[error("Network failure: {0}")]
    Network(String),
    /// The reply carried no assistant text
    #[error("Empty response from core")]
    EmptyResponse,
    /// The reply (or the structured output inside it) had the wrong shape
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// The consumer cancelled a stream
    #[error("Request cancelled")]
    Cancelled,
    #[error("Invalid AI configuration: {0}")]
    InvalidConfig(String),
}
