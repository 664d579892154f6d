//! Server-Sent Events decoding for streamed chat completions.
//!
//! The provider sends `data: {json}` events separated by blank lines and
//! finishes with `data: [DONE]`. Network chunks do not respect line
//! boundaries, so bytes are buffered until a full line is available.

use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::llm::client::LlmError;

/// Sentinel payload marking the end of a completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental SSE decoder yielding the `data` payload of each event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    /// Bytes of `buf` already known to contain no newline.
    scanned: usize,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning payloads of every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(self.scanned + offset);
            self.buf.advance(1);
            self.scanned = 0;
            self.process_line(&line, &mut events);
        }
        self.scanned = self.buf.len();
        events
    }

    /// Flush whatever remains once the byte stream has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        self.scanned = 0;
        if !self.buf.is_empty() {
            let line = self.buf.split();
            self.process_line(&line, &mut events);
        }
        if let Some(data) = self.data.take() {
            events.push(data);
        }
        events
    }

    fn process_line(&mut self, line: &[u8], events: &mut Vec<String>) {
        let line = String::from_utf8_lossy(line);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.is_empty() {
            if let Some(data) = self.data.take() {
                events.push(data);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            }
        }
    }
}

/// Streaming chat completion chunk (OpenAI-compatible), reduced to what we read.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
}

/// Extract the content fragment of one event payload.
///
/// `Ok(None)` marks the end of the stream.
pub fn parse_payload(payload: &str) -> Result<Option<String>, LlmError> {
    if payload.trim() == DONE_SENTINEL {
        return Ok(None);
    }
    let chunk: ChatCompletionChunk = serde_json::from_str(payload)?;
    if let Some(err) = chunk.error {
        return Err(LlmError::Provider(err.message));
    }
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .unwrap_or_default();
    Ok(Some(content))
}

struct DecodeState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw SSE byte stream into non-empty content fragments.
///
/// The stream ends at `[DONE]`, at the end of the body, or right after the
/// first error.
pub fn token_stream<S, E>(bytes: S) -> impl Stream<Item = Result<String, LlmError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(payload) = st.pending.pop_front() {
                match parse_payload(&payload) {
                    Ok(Some(token)) if token.is_empty() => continue,
                    Ok(Some(token)) => return Some((Ok(token), st)),
                    Ok(None) => return None,
                    Err(e) => {
                        st.finished = true;
                        st.pending.clear();
                        return Some((Err(e), st));
                    }
                }
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = st.decoder.push(&chunk);
                    st.pending.extend(events);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(LlmError::Transport(e.to_string())), st));
                }
                None => {
                    st.finished = true;
                    let events = st.decoder.finish();
                    st.pending.extend(events);
                }
            }
        }
    })
}
