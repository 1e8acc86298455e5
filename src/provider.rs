use std::pin::Pin;

use futures_util::Stream;

use crate::{Error, GenerationRequest};

/// A lazy, finite, non-restartable sequence of generated text fragments.
/// May fail at any pull, not only at open time.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// A remote text-generation provider.
///
/// The relay depends only on this capability: submit a conversation plus
/// instructions, receive either complete text or a lazy fragment sequence.
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync + 'static {
    /// Generate the complete response text in one call.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, Error>;

    /// Open a streaming generation. Failures after the stream is open
    /// surface as items of the returned stream.
    async fn generate_stream(&self, request: &GenerationRequest) -> Result<TokenStream, Error>;
}
