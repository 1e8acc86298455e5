use std::time::Duration;

use futures_util::{future, StreamExt};
use reqwest::Client;
use tracing::debug;

use super::convert::to_contents;
use super::types::{Content, GeminiRequest, GeminiResponse, GenerationConfig, Part};
use crate::provider::{TextProvider, TokenStream};
use crate::sse_stream::SseStream;
use crate::{Error, GenerationRequest};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini provider over the Generative Language REST API with API-key
/// authentication.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a provider against a custom base URL (for testing).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("Gemini API key is required"));
        }

        // No overall request timeout: streamed generations may legitimately
        // outlive any fixed bound. The client enforces its own wait limit.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, stream: bool, model: &str) -> String {
        let (method, query) = if stream {
            ("streamGenerateContent", "?alt=sse")
        } else {
            ("generateContent", "")
        };
        format!("{}/v1beta/models/{model}:{method}{query}", self.base_url)
    }

    fn build_body(request: &GenerationRequest) -> GeminiRequest {
        GeminiRequest {
            contents: to_contents(&request.messages),
            system_instruction: Some(Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: request.system_instruction.clone(),
                }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
            }),
        }
    }

    async fn dispatch(
        &self,
        stream: bool,
        request: &GenerationRequest,
    ) -> Result<reqwest::Response, Error> {
        let response = self
            .client
            .post(self.endpoint(stream, &request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(Some(status.as_u16()), body));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl TextProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, Error> {
        let response = self.dispatch(false, request).await?;
        let parsed: GeminiResponse = response.json().await?;
        Ok(parsed.text())
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<TokenStream, Error> {
        debug!(model = %request.model, "opening generation stream");
        let response = self.dispatch(true, request).await?;

        let sse = SseStream::new(response.bytes_stream());
        let tokens = sse.filter_map(|event| {
            future::ready(match event {
                Ok(event) => {
                    let data = event.data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        None
                    } else {
                        match serde_json::from_str::<GeminiResponse>(data) {
                            Ok(chunk) => {
                                let text = chunk.text();
                                if text.is_empty() {
                                    // Finish markers carry no text.
                                    None
                                } else {
                                    Some(Ok(text))
                                }
                            }
                            Err(e) => Some(Err(Error::provider(
                                None,
                                format!("unparseable stream chunk: {e}"),
                            ))),
                        }
                    }
                }
                Err(e) => Some(Err(e)),
            })
        });

        Ok(Box::pin(tokens))
    }
}
