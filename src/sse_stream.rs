//! Adapter that turns a raw byte stream into Server-Sent Events.
//!
//! Both halves of the relay speak SSE: the Gemini binding reads the
//! provider's `?alt=sse` responses, and the chat client reads the relay's
//! own `/api/chat/stream` endpoint. Events may be split across arbitrary
//! chunk boundaries, so incomplete bytes are buffered until the `\n\n`
//! separator arrives.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::{Stream, StreamExt};
use memchr::memmem;

use crate::Error;

/// Upper bound on buffered bytes for a single unterminated event.
const MAX_BUFFERED_BYTES: usize = 1_000_000;

/// A single decoded SSE event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Optional `event:` field.
    pub event_type: Option<String>,
    /// Joined `data:` lines.
    pub data: String,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
        }
    }
}

/// Streaming SSE decoder. Partial events at a chunk boundary are retained,
/// not dropped, until the next chunk completes them.
pub struct SseStream<S> {
    inner: S,
    buffer: Vec<u8>,
    pending: VecDeque<SseEvent>,
}

impl<S> SseStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Drain every complete event currently in the buffer into `pending`.
    fn decode_buffer(&mut self) -> Result<(), Error> {
        let finder = memmem::Finder::new(b"\n\n");
        let mut consumed = 0;

        while let Some(pos) = finder.find(&self.buffer[consumed..]) {
            let end = consumed + pos;
            let text = std::str::from_utf8(&self.buffer[consumed..end])
                .map_err(|e| Error::streaming(format!("invalid UTF-8 in event: {e}")))?;
            if let Some(event) = decode_event(text) {
                self.pending.push_back(event);
            }
            consumed = end + 2;
        }

        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        Ok(())
    }
}

/// Decode one complete event block. Returns `None` for comment-only or
/// data-less blocks, which the SSE spec says to ignore.
fn decode_event(text: &str) -> Option<SseEvent> {
    let mut event_type = None;
    let mut data_lines = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event_type = Some(value.to_string()),
            "data" => data_lines.push(value.to_string()),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    Some(SseEvent {
        event_type,
        data: data_lines.join("\n"),
    })
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            let chunk = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(Error::streaming(format!(
                        "transport error: {}",
                        e.into()
                    )))));
                }
                None => {
                    // Some producers end the stream without a trailing
                    // separator; recover the final event if one is buffered.
                    if !self.buffer.is_empty() {
                        let event = std::str::from_utf8(&self.buffer)
                            .ok()
                            .and_then(decode_event);
                        self.buffer.clear();
                        if let Some(event) = event {
                            return Poll::Ready(Some(Ok(event)));
                        }
                    }
                    return Poll::Ready(None);
                }
            };

            self.buffer.extend_from_slice(&chunk);
            if self.buffer.len() > MAX_BUFFERED_BYTES {
                self.buffer.clear();
                return Poll::Ready(Some(Err(Error::streaming(
                    "SSE event exceeded maximum buffered size",
                ))));
            }

            if let Err(e) = self.decode_buffer() {
                return Poll::Ready(Some(Err(e)));
            }
        }
    }
}
