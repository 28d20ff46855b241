use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Raw body chunks of a streaming reply
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// No HTTP response was obtained, or the connection broke mid-body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),
}

/// A complete reply from the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply {
    pub status: u16,
    pub body: Value,
}

impl GatewayReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The provider's error text, from `error.message` when present
    pub fn error_message(&self) -> String {
        if let Some(message) = self.body.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
        match &self.body {
            Value::String(text) if !text.is_empty() => text.clone(),
            _ => format!("HTTP {}", self.status),
        }
    }
}

/// Outcome of opening a streaming request
pub enum StreamReply {
    /// Non-success status; the body was read in full
    Rejected(GatewayReply),
    /// Success status; chunks follow
    Open(ChunkStream),
}

/// Delivers request bodies to the LLM gateway
pub trait ChatTransport: Send + Sync {
    /// Posts a body and waits for the whole reply
    fn send(&self, body: &Value) -> impl Future<Output = Result<GatewayReply, TransportError>> + Send;

    /// Posts a body and hands back the reply as it arrives
    fn open_stream(&self, body: &Value) -> impl Future<Output = Result<StreamReply, TransportError>> + Send;
}

/// `reqwest` transport authenticating with a static bearer token
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for one chat-completions endpoint
    ///
    /// ### Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint, api_key })
    }

    fn request(&self, body: &Value) -> reqwest::RequestBuilder {
        let builder = self.client.post(&self.endpoint).json(body);
        match &self.api_key {
            Some(key) => builder.header(AUTHORIZATION, format!("Bearer {key}")),
            None => builder,
        }
    }
}

impl ChatTransport for HttpTransport {
    async fn send(&self, body: &Value) -> Result<GatewayReply, TransportError> {
        let response = self
            .request(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        read_reply(response).await
    }

    async fn open_stream(&self, body: &Value) -> Result<StreamReply, TransportError> {
        let response = self
            .request(body)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(StreamReply::Rejected(read_reply(response).await?));
        }

        debug!("Stream opened");
        let chunks = futures::stream::unfold(Some(response), |state| async move {
            let mut response = state?;
            match response.chunk().await {
                Ok(Some(bytes)) => Some((Ok(bytes.to_vec()), Some(response))),
                Ok(None) => None,
                Err(e) => Some((Err(TransportError::Network(e.to_string())), None)),
            }
        });
        Ok(StreamReply::Open(Box::pin(chunks)))
    }
}

/// Reads a whole reply; bodies that are not JSON are kept as a string
async fn read_reply(response: reqwest::Response) -> Result<GatewayReply, TransportError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Ok(GatewayReply { status, body })
}
