use std::io::Write;

use anyhow::{Context, Result};
use futures::stream::{BoxStream, StreamExt};

use crate::provider::{BackendResponse, ContentBlock, EventStream, MessageResponse, StopReason};

pub type FragmentStream = BoxStream<'static, Result<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    ToolCall,
    Natural,
}

/// Uniform view over a backend response.
pub enum ResponseEnvelope {
    Immediate { text: String, stop: StopCondition },
    /// Single-use, forward-only fragments. Empty fragments are part of the
    /// sequence and carry no text.
    Streamed(FragmentStream),
}

impl std::fmt::Debug for ResponseEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseEnvelope::Immediate { text, stop } => f
                .debug_struct("Immediate")
                .field("text", text)
                .field("stop", stop)
                .finish(),
            ResponseEnvelope::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

pub fn normalize(response: BackendResponse) -> ResponseEnvelope {
    match response {
        BackendResponse::Message(message) => {
            let (text, stop) = normalize_message(&message);
            ResponseEnvelope::Immediate { text, stop }
        }
        BackendResponse::Stream(events) => ResponseEnvelope::Streamed(fragment_stream(events)),
    }
}

/// A tool-use stop yields the first tool block's input as compact JSON, or
/// an empty string when the backend sent no such block. Any other stop
/// yields the text blocks joined by newlines.
pub fn normalize_message(message: &MessageResponse) -> (String, StopCondition) {
    if message.stop_reason == Some(StopReason::ToolUse) {
        let input = message.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { input, .. } => Some(input),
            _ => None,
        });
        let text = match input {
            Some(input) => serde_json::to_string(input).unwrap_or_default(),
            None => {
                tracing::info!("tool use stop without a tool_use block");
                String::new()
            }
        };
        return (text, StopCondition::ToolCall);
    }

    let text = message
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<&str>>()
        .join("\n");
    (text, StopCondition::Natural)
}

/// Two fragments per event: the event's text delta (or "") followed by "".
pub fn fragment_stream(events: EventStream) -> FragmentStream {
    events
        .flat_map(|event| {
            let items = match event {
                Ok(event) => {
                    let text = event.text_delta().unwrap_or_default().to_string();
                    if !text.is_empty() {
                        tracing::debug!(chunk = %text, "received stream chunk");
                    }
                    vec![Ok(text), Ok(String::new())]
                }
                Err(err) => vec![Err(err)],
            };
            futures::stream::iter(items)
        })
        .boxed()
}

impl ResponseEnvelope {
    /// Logs the response text at `info` as it is consumed. Streamed fragments
    /// pass through unchanged, empty ones included.
    pub fn traced(self) -> Self {
        match self {
            ResponseEnvelope::Immediate { text, stop } => {
                tracing::info!(stop = ?stop, response = %text, "response received");
                ResponseEnvelope::Immediate { text, stop }
            }
            ResponseEnvelope::Streamed(fragments) => ResponseEnvelope::Streamed(
                fragments
                    .inspect(|fragment| {
                        if let Ok(chunk) = fragment {
                            if !chunk.is_empty() {
                                tracing::info!(chunk = %chunk, "response chunk");
                            }
                        }
                    })
                    .boxed(),
            ),
        }
    }

    /// Drains the envelope into one string.
    pub async fn into_text(self) -> Result<String> {
        match self {
            ResponseEnvelope::Immediate { text, .. } => Ok(text),
            ResponseEnvelope::Streamed(mut fragments) => {
                let mut out = String::new();
                while let Some(fragment) = fragments.next().await {
                    out.push_str(&fragment?);
                }
                Ok(out)
            }
        }
    }

    /// Drains the envelope while echoing text to `out` as it arrives.
    pub async fn render_to<W: Write + Send>(self, out: &mut W) -> Result<String> {
        match self {
            ResponseEnvelope::Immediate { text, .. } => {
                writeln!(out, "{text}").context("failed to write response")?;
                Ok(text)
            }
            ResponseEnvelope::Streamed(mut fragments) => {
                let mut collected = String::new();
                while let Some(fragment) = fragments.next().await {
                    let fragment = fragment?;
                    if fragment.is_empty() {
                        continue;
                    }
                    write!(out, "{fragment}").context("failed to write response")?;
                    out.flush().context("failed to flush response")?;
                    collected.push_str(&fragment);
                }
                writeln!(out).context("failed to write response")?;
                Ok(collected)
            }
        }
    }
}
