//! Provider bindings.

pub mod gemini;

pub use gemini::GeminiProvider;
