use serde::{Deserialize, Serialize};

/// One event on the relay's client-facing stream. Exactly one terminal
/// event (`Done` or `Error`) closes a stream, and nothing follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireEvent {
    /// An incremental fragment of generated text.
    Token { token: String },
    /// Successful end of stream.
    Done { done: bool },
    /// Failure; carries a user-facing message, never raw provider output.
    Error { error: String },
}

impl WireEvent {
    pub fn token(token: impl Into<String>) -> Self {
        WireEvent::Token {
            token: token.into(),
        }
    }

    pub fn done() -> Self {
        WireEvent::Done { done: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WireEvent::Error {
            error: message.into(),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WireEvent::Done { .. } | WireEvent::Error { .. })
    }
}
