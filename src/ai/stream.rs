use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use super::AiError;
use super::transport::{ChunkStream, TransportError};

/// Fires a cancellation; held by whoever may abandon the stream
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observes a cancellation; moved into the stream
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Creates a connected handle/signal pair
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal { rx: self.tx.subscribe() }
    }
}

impl CancelSignal {
    /// A signal nobody can fire
    pub fn never() -> Self {
        let (_, signal) = cancel_pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; never resolves if the handle is gone uncancelled
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }
}

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental server-sent-events parser
///
/// Bytes may be split anywhere, including inside a UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every event it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            if let Some(event) = self.line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes whatever is left once the body has ended
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).into_owned();
            if let Some(event) = self.line(line.trim_end_matches('\r')) {
                events.push(event);
            }
        }
        if let Some(event) = self.dispatch() {
            events.push(event);
        }
        events
    }

    fn line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            self.event = None;
            return None;
        }
        Some(SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// Assistant text delivered fragment by fragment
///
/// The sequence is finite and cannot be restarted. If it ends without any
/// fragment its last item is `AiError::EmptyResponse`.
pub struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>,
}

impl ChatStream {
    pub fn new(chunks: ChunkStream, cancel: CancelSignal) -> Self {
        let state = DecodeState {
            chunks,
            cancel,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            fragments: 0,
            finished: false,
        };
        let inner = futures::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(item) = state.pending.pop_front() {
                    return Some((item, state));
                }
                if state.finished {
                    return None;
                }
                let step = tokio::select! {
                    biased;
                    _ = state.cancel.cancelled() => Step::Cancelled,
                    chunk = state.chunks.next() => Step::Chunk(chunk),
                };
                match step {
                    Step::Cancelled => {
                        debug!("Stream cancelled");
                        state.fail(AiError::Cancelled);
                    }
                    Step::Chunk(Some(Ok(bytes))) => {
                        for event in state.decoder.push(&bytes) {
                            state.event(event);
                        }
                    }
                    Step::Chunk(Some(Err(TransportError::Network(message)))) => {
                        state.fail(AiError::Network(message));
                    }
                    Step::Chunk(None) => {
                        for event in state.decoder.finish() {
                            state.event(event);
                        }
                        state.end();
                    }
                }
            }
        });
        Self { inner: Box::pin(inner) }
    }

    /// Builds a stream from already-known items
    pub fn from_items(items: Vec<Result<String, AiError>>) -> Self {
        Self { inner: Box::pin(futures::stream::iter(items)) }
    }
}

impl Stream for ChatStream {
    type Item = Result<String, AiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

enum Step {
    Cancelled,
    Chunk(Option<Result<Vec<u8>, TransportError>>),
}

struct DecodeState {
    chunks: ChunkStream,
    cancel: CancelSignal,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, AiError>>,
    fragments: usize,
    finished: bool,
}

impl DecodeState {
    fn event(&mut self, event: SseEvent) {
        if self.finished {
            return;
        }
        if event.data == "[DONE]" {
            self.end();
            return;
        }
        let payload: Value = match serde_json::from_str(&event.data) {
            Ok(payload) => payload,
            Err(e) => {
                self.fail(AiError::Malformed(format!("invalid stream chunk: {e}")));
                return;
            }
        };
        if let Some(message) = payload.pointer("/error/message").and_then(Value::as_str) {
            self.fail(AiError::Malformed(format!("stream error: {message}")));
            return;
        }
        if let Some(text) = payload.pointer("/choices/0/delta/content").and_then(Value::as_str) {
            if !text.is_empty() {
                self.fragments += 1;
                self.pending.push_back(Ok(text.to_string()));
            }
        }
    }

    fn end(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.fragments == 0 {
            self.pending.push_back(Err(AiError::EmptyResponse));
        }
    }

    fn fail(&mut self, error: AiError) {
        self.finished = true;
        self.pending.push_back(Err(error));
    }
}

/// Drains a stream into one string
///
/// ### Errors
///
/// Returns the first error the stream yields
pub async fn collect_stream(mut stream: ChatStream) -> Result<String, AiError> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    if text.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}
