use std::collections::VecDeque;
use std::pin::Pin;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::session::Turn;

pub const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Turn>,
    pub max_tokens: u32,
    pub stream: bool,
}

impl MessageRequest {
    /// Single user message under an instruction text.
    pub fn single(
        model: impl Into<String>,
        system: impl Into<String>,
        user_prompt: impl Into<String>,
        max_tokens: u32,
        stream: bool,
    ) -> Self {
        Self {
            model: model.into(),
            system: Some(system.into()),
            messages: vec![Turn::user(user_prompt)],
            max_tokens,
            stream,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    #[serde(other)]
    Other,
}

/// One server-sent event of a streamed message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    ContentBlockDelta {
        #[serde(default)]
        index: usize,
        delta: ContentDelta,
    },
    Error {
        error: ErrorBody,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl StreamEvent {
    pub fn text_delta(&self) -> Option<&str> {
        match self {
            StreamEvent::ContentBlockDelta {
                delta: ContentDelta::TextDelta { text },
                ..
            } => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

/// Raw result of one backend call, shaped by the request's `stream` flag.
pub enum BackendResponse {
    Message(MessageResponse),
    Stream(EventStream),
}

impl std::fmt::Debug for BackendResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendResponse::Message(message) => f.debug_tuple("Message").field(message).finish(),
            BackendResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn send(&self, request: MessageRequest) -> Result<BackendResponse>;
}

// ---------------------------------------------------------------------------
// Anthropic HTTP client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl LlmBackend for AnthropicClient {
    async fn send(&self, request: MessageRequest) -> Result<BackendResponse> {
        tracing::debug!(
            model = %request.model,
            stream = request.stream,
            turns = request.messages.len(),
            "sending messages request"
        );

        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("failed to reach the Anthropic API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body).into());
        }

        if request.stream {
            return Ok(BackendResponse::Stream(decode_event_stream(
                response.bytes_stream(),
            )));
        }

        let message = response
            .json::<MessageResponse>()
            .await
            .context("failed to decode Anthropic API response")?;
        Ok(BackendResponse::Message(message))
    }
}

pub fn map_http_error(status: StatusCode, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(wrapper) => ProviderError {
            status: Some(status.as_u16()),
            kind: wrapper.error.kind,
            message: wrapper.error.message,
        },
        Err(_) => ProviderError {
            status: Some(status.as_u16()),
            kind: "http_error".to_string(),
            message: if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            },
        },
    }
}

// ---------------------------------------------------------------------------
// Server-sent event decoding
// ---------------------------------------------------------------------------

/// Incremental `data:` line decoder. Bytes are buffered until a full line
/// is available so multi-byte characters split across chunks survive.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<StreamEvent>> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            if let Some(event) = decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing line that had no terminating newline.
    pub fn finish(&mut self) -> Vec<Result<StreamEvent>> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest).into_iter().collect()
    }
}

fn decode_line(raw: &[u8]) -> Option<Result<StreamEvent>> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\n', '\r']);
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let event = match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => event,
        Err(err) => {
            return Some(Err(anyhow::anyhow!(
                "malformed provider stream event: {err}"
            )));
        }
    };

    match event {
        StreamEvent::Error { error } => Some(Err(ProviderError {
            status: None,
            kind: error.kind,
            message: error.message,
        }
        .into())),
        event => Some(Ok(event)),
    }
}

struct SseState<S> {
    inner: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<StreamEvent>>,
    finished: bool,
}

/// Turns a raw byte stream into typed events. The sequence ends after the
/// first error item.
pub fn decode_event_stream<S, B, E>(inner: S) -> EventStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = SseState {
        inner: Box::pin(inner),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.pending.clear();
                    state.finished = true;
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.pending.extend(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((
                        Err(anyhow::anyhow!("provider stream interrupted: {err}")),
                        state,
                    ));
                }
                None => {
                    state.finished = true;
                    let events = state.decoder.finish();
                    state.pending.extend(events);
                }
            }
        }
    })
    .boxed()
}
