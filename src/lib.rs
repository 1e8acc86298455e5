//! A resilient streaming relay between chat clients and the Gemini
//! text-generation API.
//!
//! The relay accepts a bounded conversation history, forwards it to the
//! provider under a chosen response style and model, and returns the
//! generated text either whole or as an incrementally streamed sequence of
//! tokens, with classification-aware retry around every provider call.

pub mod accumulator;
pub mod client;
pub mod error;
pub mod provider;
pub mod providers;
pub mod relay;
pub mod retry;
pub mod server;
pub mod service;
pub mod sse_stream;
pub mod styles;
pub mod types;

// Re-export core types for easy usage
pub use accumulator::TokenAccumulator;
pub use client::{ChatClient, ChatSession};
pub use error::{Error, ErrorClass};
pub use provider::{TextProvider, TokenStream};
pub use providers::GeminiProvider;
pub use relay::relay_events;
pub use retry::RetryPolicy;
pub use server::{router, AppState};
pub use service::GenerationService;
pub use sse_stream::{SseEvent, SseStream};
pub use types::*;
