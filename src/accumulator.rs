//! Fragment accumulation for streaming consumption.

/// Accumulates streamed fragments into the full response text.
///
/// Fragments are concatenation-significant: appending them in emission
/// order reconstructs the response. After each push the consumer re-renders
/// the whole accumulated text rather than diffing.
#[derive(Debug, Default)]
pub struct TokenAccumulator {
    text: String,
}

impl TokenAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the full text accumulated so far.
    pub fn push(&mut self, token: &str) -> &str {
        self.text.push_str(token);
        &self.text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Finalize, giving up the accumulated text.
    pub fn into_text(self) -> String {
        self.text
    }
}
