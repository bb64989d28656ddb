//! Server-sent event decoding for streamed completions

use std::collections::VecDeque;

use docsmith_docstring::GeneratorError;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;

use crate::Provider;

/// Splits a byte stream into SSE `data` payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed a chunk and return the payloads of every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
            // event:, id:, retry: and comments carry nothing we need
        }

        events
    }
}

/// One decoded streaming event.
#[derive(Debug, PartialEq, Eq)]
pub enum Delta {
    Text(String),
    Done,
    Ignore,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChatChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChunkChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    ContentBlockDelta { delta: AnthropicDelta },
    MessageStop,
    Error { error: AnthropicError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    message: String,
}

/// Interpret one event payload for `provider`.
pub fn parse_delta(provider: Provider, data: &str) -> Result<Delta, GeneratorError> {
    match provider {
        Provider::OpenAI | Provider::Groq => {
            if data.trim() == "[DONE]" {
                return Ok(Delta::Done);
            }
            let chunk: ChatChunk =
                serde_json::from_str(data).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
            let text = chunk
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect::<String>();
            Ok(if text.is_empty() { Delta::Ignore } else { Delta::Text(text) })
        }
        Provider::Anthropic => {
            let event: AnthropicEvent =
                serde_json::from_str(data).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
            match event {
                AnthropicEvent::ContentBlockDelta { delta } => {
                    Ok(delta.text.map(Delta::Text).unwrap_or(Delta::Ignore))
                }
                AnthropicEvent::MessageStop => Ok(Delta::Done),
                AnthropicEvent::Error { error } => Err(GeneratorError::Service {
                    status: 200,
                    message: error.message,
                }),
                AnthropicEvent::Other => Ok(Delta::Ignore),
            }
        }
    }
}

struct StreamState {
    bytes: BoxStream<'static, Result<Vec<u8>, GeneratorError>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw SSE byte stream into text chunks. The stream fails with
/// [`GeneratorError::IncompleteStream`] if it ends before the provider's
/// terminal event.
pub fn text_stream(
    provider: Provider,
    bytes: BoxStream<'static, Result<Vec<u8>, GeneratorError>>,
) -> BoxStream<'static, Result<String, GeneratorError>> {
    let state = StreamState {
        bytes,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, move |mut state| async move {
        loop {
            if let Some(text) = state.pending.pop_front() {
                return Some((Ok(text), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for data in state.decoder.push(&chunk) {
                        match parse_delta(provider, &data) {
                            Ok(Delta::Text(text)) => state.pending.push_back(text),
                            Ok(Delta::Done) => state.finished = true,
                            Ok(Delta::Ignore) => {}
                            Err(e) => {
                                state.finished = true;
                                state.pending.clear();
                                return Some((Err(e), state));
                            }
                        }
                        if state.finished {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    return Some((Err(GeneratorError::IncompleteStream), state));
                }
            }
        }
    })
    .boxed()
}
