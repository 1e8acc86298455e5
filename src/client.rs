//! Client-side stream consumer and conversation session.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use tracing::{debug, info};

use crate::accumulator::TokenAccumulator;
use crate::sse_stream::SseStream;
use crate::types::{ChatMessage, WireEvent, DEFAULT_CLIENT_TIMEOUT, DEFAULT_HISTORY_WINDOW};
use crate::Error;

/// Consumes the relay's streaming endpoint: issues the request with an
/// upper bound wait time, incrementally decodes the event framing, and
/// re-renders the accumulated text after every fragment.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        Self::with_timeout(base_url, DEFAULT_CLIENT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Stream one generation. `on_render` receives the full accumulated
    /// text after each fragment (idempotent full re-render, not a diff).
    /// Returns the final text once the `done` event arrives.
    ///
    /// Exceeding the wait bound, either before the response or between
    /// events, cancels the transport and yields `Error::Timeout`. The call
    /// always terminates, whatever the outcome.
    pub async fn stream_chat(
        &self,
        conversation: &[ChatMessage],
        model: &str,
        style: &str,
        mut on_render: impl FnMut(&str),
    ) -> Result<String, Error> {
        let body = json!({
            "conversation": conversation,
            "model": model,
            "responseStyle": style,
        });

        debug!(messages = conversation.len(), model, style, "dispatching stream request");
        let send = self
            .http
            .post(format!("{}/api/chat/stream", self.base_url))
            .json(&body)
            .send();
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::provider(
                Some(status.as_u16()),
                format!("server responded with status {status}"),
            ));
        }

        let mut events = SseStream::new(response.bytes_stream());
        let mut accumulator = TokenAccumulator::new();

        loop {
            // Dropping `events` on timeout aborts the transport; the server
            // is not expected to notice synchronously.
            let next = tokio::time::timeout(self.timeout, events.next())
                .await
                .map_err(|_| Error::Timeout(self.timeout))?;

            let Some(event) = next else {
                return Err(Error::streaming("stream ended without a terminal event"));
            };
            let wire: WireEvent = serde_json::from_str(event?.data.trim())?;

            match wire {
                WireEvent::Token { token } => on_render(accumulator.push(&token)),
                WireEvent::Done { .. } => {
                    info!(chars = accumulator.text().len(), "stream completed");
                    return Ok(accumulator.into_text());
                }
                WireEvent::Error { error } => return Err(Error::streaming(error)),
            }
        }
    }
}

/// Client-side conversation state: the full history is retained for
/// display, while only a bounded window of trailing messages is
/// transmitted upstream.
#[derive(Debug)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
    window_size: usize,
}

impl ChatSession {
    pub fn new(window_size: usize) -> Self {
        Self {
            history: Vec::new(),
            window_size,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// The trailing messages actually sent to the server.
    pub fn window(&self) -> &[ChatMessage] {
        let start = self.history.len().saturating_sub(self.window_size);
        &self.history[start..]
    }

    /// Leading messages excluded from model memory, for display marking.
    pub fn excluded_count(&self) -> usize {
        self.history.len().saturating_sub(self.window_size)
    }

    /// Run one turn: the user message is appended immediately; the bot
    /// message is appended only after the stream reaches `done`. A failed
    /// or timed-out stream leaves the history without a partial bot turn.
    pub async fn send(
        &mut self,
        client: &ChatClient,
        model: &str,
        style: &str,
        text: impl Into<String>,
        on_render: impl FnMut(&str),
    ) -> Result<String, Error> {
        self.history.push(ChatMessage::user(text));
        let result = client
            .stream_chat(self.window(), model, style, on_render)
            .await;

        match result {
            Ok(reply) => {
                self.history.push(ChatMessage::bot(reply.clone()));
                Ok(reply)
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(len: usize, window: usize) -> ChatSession {
        let mut session = ChatSession::new(window);
        for i in 0..len {
            session.history.push(ChatMessage::user(format!("m{i}")));
        }
        session
    }

    #[test]
    fn window_is_the_trailing_suffix() {
        let session = session_with(25, 20);
        assert_eq!(session.window().len(), 20);
        assert_eq!(session.excluded_count(), 5);
        assert_eq!(session.window()[0].text, "m5");
        assert_eq!(session.window()[19].text, "m24");
    }

    #[test]
    fn short_history_is_sent_whole() {
        let session = session_with(3, 20);
        assert_eq!(session.window().len(), 3);
        assert_eq!(session.excluded_count(), 0);
    }

    #[test]
    fn window_boundary_is_exact() {
        let session = session_with(20, 20);
        assert_eq!(session.window().len(), 20);
        assert_eq!(session.excluded_count(), 0);
    }
}
