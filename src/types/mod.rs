//! Core types used throughout the relay.

pub mod config;
pub mod message;
pub mod wire;

// Re-export commonly used types
pub use config::*;
pub use message::*;
pub use wire::*;
