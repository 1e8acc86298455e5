//! Gemini binding over the Generative Language REST API.

mod client;
mod convert;
mod types;

pub use client::GeminiProvider;
pub use convert::to_contents;
