//! Generation service: composes the style catalog, conversation formatting
//! and the retry executor around a provider.

use std::sync::Arc;

use tracing::debug;

use crate::provider::{TextProvider, TokenStream};
use crate::retry::RetryPolicy;
use crate::styles;
use crate::types::{ChatMessage, GenerationRequest, TEMPERATURE};
use crate::Error;

pub struct GenerationService {
    provider: Arc<dyn TextProvider>,
    retry: RetryPolicy,
}

impl GenerationService {
    pub fn new(provider: Arc<dyn TextProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    fn build_request(
        model: &str,
        conversation: &[ChatMessage],
        style: Option<&str>,
    ) -> Result<GenerationRequest, Error> {
        if model.is_empty() {
            return Err(Error::malformed("model must not be empty"));
        }
        if conversation.is_empty() {
            return Err(Error::malformed("conversation must not be empty"));
        }
        Ok(GenerationRequest {
            model: model.to_string(),
            messages: conversation.to_vec(),
            system_instruction: styles::system_instruction(style),
            temperature: TEMPERATURE,
        })
    }

    /// Single-shot generation: returns the complete response text.
    pub async fn generate(
        &self,
        model: &str,
        conversation: &[ChatMessage],
        style: Option<&str>,
    ) -> Result<String, Error> {
        let request = Self::build_request(model, conversation, style)?;
        self.retry.run(|| self.provider.generate(&request)).await
    }

    /// Streaming generation. Retries apply only to opening the stream;
    /// failures after fragments start arriving surface as stream items and
    /// are not resumed.
    pub async fn generate_stream(
        &self,
        model: &str,
        conversation: &[ChatMessage],
        style: Option<&str>,
    ) -> Result<TokenStream, Error> {
        let request = Self::build_request(model, conversation, style)?;
        debug!(model, messages = conversation.len(), "starting stream");
        self.retry
            .run(|| self.provider.generate_stream(&request))
            .await
    }
}
