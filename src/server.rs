//! HTTP surface of the relay: a unary chat endpoint and a streaming
//! endpoint speaking `text/event-stream`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{sse::Event, IntoResponse, Response, Sse},
    routing::post,
    Json, Router,
};
use futures::stream::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{Error, ErrorClass};
use crate::relay::relay_events;
use crate::service::GenerationService;
use crate::types::{ChatMessage, WireEvent};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GenerationService>,
    pub default_model: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "responseStyle")]
    pub response_style: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    details: &'static str,
}

/// Error wrapper that maps the relay taxonomy onto status codes:
/// malformed input → 400, rate limit → 429, everything else → 500.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::MalformedInput(_) => StatusCode::BAD_REQUEST,
            err if err.class() == ErrorClass::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let label = match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::TOO_MANY_REQUESTS => "Rate limit exceeded",
            _ => "Internal Server Error",
        };
        error!(%status, error = %self.0, "chat request failed");
        (
            status,
            Json(ErrorBody {
                error: label,
                details: self.0.user_message(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
        .with_state(state)
}

/// Deserialize the request body ourselves so malformed input maps to 400
/// rather than the extractor's 422.
fn parse_request(value: serde_json::Value) -> Result<ChatRequest, Error> {
    serde_json::from_value(value).map_err(|e| Error::malformed(format!("invalid chat request: {e}")))
}

async fn chat(
    State(state): State<AppState>,
    Json(value): Json<serde_json::Value>,
) -> Result<Json<ChatResponse>, ApiError> {
    let req = parse_request(value)?;
    let request_id = Uuid::new_v4().simple().to_string();
    let model = req.model.unwrap_or_else(|| state.default_model.clone());
    info!(request_id, %model, messages = req.conversation.len(), "chat request");

    let text = state
        .service
        .generate(&model, &req.conversation, req.response_style.as_deref())
        .await?;
    Ok(Json(ChatResponse { response: text }))
}

async fn chat_stream(
    State(state): State<AppState>,
    Json(value): Json<serde_json::Value>,
) -> Response {
    let req = match parse_request(value) {
        Ok(req) => req,
        Err(err) => return ApiError(err).into_response(),
    };
    let request_id = Uuid::new_v4().simple().to_string();
    let model = req.model.unwrap_or_else(|| state.default_model.clone());
    info!(request_id, %model, messages = req.conversation.len(), "streaming request");

    if req.conversation.is_empty() {
        return ApiError(Error::malformed("conversation must not be empty")).into_response();
    }

    let stream = wire_stream(state, model, req.conversation, req.response_style);
    Sse::new(stream).into_response()
}

/// Open the provider stream and frame every wire event as an SSE `data:`
/// line. Failures to open the stream are reported in-stream as the single
/// terminal `error` event, matching the unary endpoint's taxonomy.
fn wire_stream(
    state: AppState,
    model: String,
    conversation: Vec<ChatMessage>,
    style: Option<String>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        match state
            .service
            .generate_stream(&model, &conversation, style.as_deref())
            .await
        {
            Ok(tokens) => {
                let mut events = Box::pin(relay_events(tokens));
                while let Some(event) = events.next().await {
                    yield Ok(frame(&event));
                }
            }
            Err(err) => {
                error!(error = %err, "failed to open stream");
                yield Ok(frame(&WireEvent::error(err.user_message())));
            }
        }
    }
}

fn frame(event: &WireEvent) -> Event {
    Event::default().data(serde_json::to_string(event).unwrap_or_default())
}
