use super::types::{Content, Part};
use crate::types::{ChatMessage, Role};

/// Map the client-side message list into provider contents. Total over any
/// finite sequence; text passes through untouched.
pub fn to_contents(messages: &[ChatMessage]) -> Vec<Content> {
    messages
        .iter()
        .map(|message| Content {
            role: match message.role {
                Role::Bot => "model".to_string(),
                Role::User => "user".to_string(),
            },
            parts: vec![Part {
                text: message.text.clone(),
            }],
        })
        .collect()
}
