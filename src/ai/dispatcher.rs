use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::ladder::{Verdict, classify};
use super::stream::{CancelSignal, ChatStream};
use super::transport::{ChatTransport, GatewayReply, HttpTransport, StreamReply, TransportError};
use super::{AiError, ChatRequest, ModelLadder, RetryPolicy};

/// Result of one attempt that reached the gateway
enum Attempt<O> {
    Accepted(O),
    Rejected(GatewayReply),
}

/// Sends chat-completion requests down a model fallback ladder
///
/// Every call starts again at the top of the ladder; nothing is remembered
/// about which model served the previous call.
#[derive(Debug, Clone)]
pub struct Dispatcher<T = HttpTransport> {
    transport: T,
    ladder: ModelLadder,
    policy: RetryPolicy,
}

impl<T: ChatTransport> Dispatcher<T> {
    pub fn new(transport: T, ladder: ModelLadder, policy: RetryPolicy) -> Self {
        Self { transport, ladder, policy }
    }

    pub fn ladder(&self) -> &ModelLadder {
        &self.ladder
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Delivers a request and returns the decoded success payload unchanged
    ///
    /// ### Errors
    ///
    /// - `AiError::Exhausted` when every model was rejected
    /// - `AiError::Provider` for a rejection no other model would fix
    /// - `AiError::Network` when the gateway stays unreachable after a retry
    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    pub async fn complete(&self, request: &ChatRequest) -> Result<Value, AiError> {
        let transport = &self.transport;
        self.walk(|model| {
            let body = request.to_body(&model);
            async move {
                let reply = transport.send(&body).await?;
                if reply.is_success() {
                    Ok(Attempt::Accepted(reply.body))
                } else {
                    Ok(Attempt::Rejected(reply))
                }
            }
        })
        .await
    }

    /// Delivers a request and extracts the assistant's text
    ///
    /// ### Errors
    ///
    /// Everything `complete` returns, plus `AiError::EmptyResponse` when the
    /// reply carries no text
    pub async fn complete_text(&self, request: &ChatRequest) -> Result<String, AiError> {
        let payload = self.complete(request).await?;
        extract_content(&payload)
    }

    /// Opens a streaming request and returns its text fragments
    ///
    /// The ladder applies to opening the stream; once fragments flow, a
    /// broken connection ends the stream with an error.
    ///
    /// ### Errors
    ///
    /// The same taxonomy as `complete`
    #[instrument(skip(self, request, cancel), fields(messages = request.messages.len()))]
    pub async fn stream(&self, request: &ChatRequest, cancel: CancelSignal) -> Result<ChatStream, AiError> {
        let mut request = request.clone();
        request.stream = true;
        let request = &request;
        let transport = &self.transport;

        let chunks = self
            .walk(|model| {
                let body = request.to_body(&model);
                async move {
                    match transport.open_stream(&body).await? {
                        StreamReply::Open(chunks) => Ok(Attempt::Accepted(chunks)),
                        StreamReply::Rejected(reply) => Ok(Attempt::Rejected(reply)),
                    }
                }
            })
            .await?;
        Ok(ChatStream::new(chunks, cancel))
    }

    /// Walks the ladder top to bottom, retrying within the policy's budget
    async fn walk<O, F, Fut>(&self, mut attempt: F) -> Result<O, AiError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Attempt<O>, TransportError>>,
    {
        let mut attempts = 0u32;
        let mut rate_limit_retries = 0u32;
        let mut network_retries = 0u32;
        let mut fell_back = false;
        let mut last_rejection: Option<GatewayReply> = None;

        for model in self.ladder.iter() {
            loop {
                attempts += 1;
                debug!(model, attempts, "Sending request");

                match attempt(model.to_string()).await {
                    Ok(Attempt::Accepted(output)) => {
                        info!(model, attempts, "Request served");
                        return Ok(output);
                    }
                    Ok(Attempt::Rejected(reply)) => {
                        let message = reply.error_message();
                        // Same-model rate-limit retries are only granted before any fallback
                        let budget_left = !fell_back && rate_limit_retries < self.policy.max_rate_limit_retries;
                        match classify(reply.status, &message, budget_left) {
                            Verdict::RetrySameModel => {
                                rate_limit_retries += 1;
                                warn!(model, status = reply.status, "Rate limited, retrying same model");
                                pause(self.policy.rate_limit_delay).await;
                            }
                            Verdict::NextModel => {
                                warn!(model, status = reply.status, %message, "Model rejected, falling back");
                                fell_back = true;
                                last_rejection = Some(reply);
                                break;
                            }
                            Verdict::Fail => {
                                error!(model, status = reply.status, %message, "Provider error");
                                return Err(AiError::Provider { status: reply.status, message });
                            }
                        }
                    }
                    Err(TransportError::Network(message)) => {
                        if network_retries < self.policy.max_network_retries {
                            network_retries += 1;
                            warn!(model, %message, "Network failure, retrying");
                            pause(self.policy.network_retry_delay).await;
                        } else {
                            error!(model, %message, "Network failure");
                            return Err(AiError::Network(message));
                        }
                    }
                }
            }
        }

        let (status, message) = last_rejection
            .map(|reply| (reply.status, reply.error_message()))
            .unwrap_or_else(|| (0, "no model accepted the request".to_string()));
        error!(attempts, status, "All models failed");
        Err(AiError::Exhausted { status, message, attempts })
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Pulls the assistant text out of a chat-completion payload
///
/// Accepts `choices[0].message.content` as a string or as a list of text
/// parts.
///
/// ### Errors
///
/// Returns `AiError::EmptyResponse` when the content is missing or blank
pub fn extract_content(payload: &Value) -> Result<String, AiError> {
    let content = payload.pointer("/choices/0/message/content");
    let text = match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .concat(),
        _ => String::new(),
    };
    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod prop_tests;
