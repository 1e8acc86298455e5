use std::time::Duration;

use thiserror::Error;

/// How a provider failure relates to retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The provider asked us to slow down (HTTP 429 / quota exhaustion).
    RateLimited,
    /// The model is temporarily overloaded or unavailable.
    Overloaded,
    /// Not worth retrying (auth failures, bad requests, everything else).
    Fatal,
}

impl ErrorClass {
    /// Whether a failure of this class is eligible for another attempt.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorClass::RateLimited | ErrorClass::Overloaded)
    }
}

/// Errors that can occur when relaying a generation request.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Provider error: {message}")]
    Provider { class: ErrorClass, message: String },

    #[error("Streaming error: {0}")]
    Streaming(String),

    #[error("Malformed request: {0}")]
    MalformedInput(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a provider error, classifying it from the HTTP status when one
    /// is available and from the message text otherwise.
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let class = classify(status, &message);
        Error::Provider { class, message }
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Retry classification for this error. Only provider errors are ever
    /// transient; transport and local errors are surfaced immediately.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Provider { class, .. } => *class,
            _ => ErrorClass::Fatal,
        }
    }

    /// Provider-suggested retry interval, parsed from a "retry in <seconds>"
    /// fragment in the error message.
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            Error::Provider { message, .. } => parse_retry_hint(message),
            _ => None,
        }
    }

    /// One stable, human-readable message per error category. Never exposes
    /// raw provider payloads or stack traces.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Provider {
                class: ErrorClass::RateLimited,
                ..
            } => "API rate limit reached. Please wait a moment and try again.",
            Error::Provider {
                class: ErrorClass::Overloaded,
                ..
            } => "The model is overloaded. Please try again in a few moments.",
            Error::Provider { .. } | Error::Streaming(_) => "An error occurred. Please try again.",
            Error::Timeout(_) => "Request timed out. Please try again.",
            Error::Http(_) => "Cannot connect to the server. Please check your connection and try again.",
            Error::MalformedInput(_) => "The request was malformed.",
            Error::Serialization(_) | Error::Config(_) => "Something went wrong. Please try again.",
        }
    }
}

/// Classify a provider failure. The HTTP status is authoritative when
/// present; the substring heuristics cover SDK-style errors that only carry
/// free text. Rate limiting wins when both patterns match.
fn classify(status: Option<u16>, message: &str) -> ErrorClass {
    if status == Some(429) || message.contains("429") || message.contains("quota") {
        return ErrorClass::RateLimited;
    }
    if status == Some(503)
        || message.contains("overloaded")
        || message.contains("503")
        || message.contains("UNAVAILABLE")
    {
        return ErrorClass::Overloaded;
    }
    ErrorClass::Fatal
}

/// Parse the seconds out of a provider message like
/// "... Please retry in 2.5 seconds." Rounded up to whole milliseconds.
fn parse_retry_hint(message: &str) -> Option<Duration> {
    let lower = message.to_ascii_lowercase();
    let idx = lower.find("retry in ")?;
    let rest = &lower[idx + "retry in ".len()..];
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let seconds: f64 = digits.parse().ok()?;
    Some(Duration::from_millis((seconds * 1000.0).ceil() as u64))
}
