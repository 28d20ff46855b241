//! LLM gateway access: request composition, the model fallback ladder,
//! streaming delivery and structured schedule generation.

mod dispatcher;
mod error;
mod ladder;
mod request;
pub mod schedule;
pub mod stream;
pub mod transport;

pub use dispatcher::{Dispatcher, extract_content};
pub use error::AiError;
pub use ladder::{ModelLadder, RetryPolicy};
pub use request::{ChatRequest, ContentPart, ResponseFormat, ScheduleBrief, TUTOR_PROMPT, WireContent, WireMessage, WireRole};
pub use schedule::{GeneratedEvent, generate_schedule, parse_schedule};
pub use stream::{CancelHandle, CancelSignal, ChatStream, SseDecoder, SseEvent, cancel_pair, collect_stream};
pub use transport::{ChatTransport, GatewayReply, HttpTransport, StreamReply, TransportError};
