//! End-to-end tests: a scripted provider behind a real relay listener,
//! consumed by the chat client.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream;
use serde_json::json;

use chat_relay::{
    router, AppState, ChatClient, ChatMessage, ChatSession, Error, GenerationRequest,
    GenerationService, RetryPolicy, TextProvider, TokenStream,
};

#[derive(Clone)]
enum Behavior {
    Stream(Vec<&'static str>),
    StreamThenError(Vec<&'static str>),
    OpenFailure(u16, &'static str),
    Hang,
}

struct ScriptedProvider(Behavior);

#[async_trait::async_trait]
impl TextProvider for ScriptedProvider {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, Error> {
        match &self.0 {
            Behavior::Stream(tokens) => Ok(tokens.concat()),
            Behavior::StreamThenError(_) => Err(Error::streaming("provider dropped mid-call")),
            Behavior::OpenFailure(status, message) => {
                Err(Error::provider(Some(*status), message.to_string()))
            }
            Behavior::Hang => futures::future::pending().await,
        }
    }

    async fn generate_stream(&self, _request: &GenerationRequest) -> Result<TokenStream, Error> {
        match self.0.clone() {
            Behavior::Stream(tokens) => Ok(Box::pin(stream::iter(
                tokens.into_iter().map(|t| Ok(t.to_string())).collect::<Vec<_>>(),
            ))),
            Behavior::StreamThenError(tokens) => {
                let items: Vec<Result<String, Error>> = tokens
                    .into_iter()
                    .map(|t| Ok(t.to_string()))
                    .chain(std::iter::once(Err(Error::provider(
                        None,
                        "connection reset by provider",
                    ))))
                    .collect();
                Ok(Box::pin(stream::iter(items)))
            }
            Behavior::OpenFailure(status, message) => {
                Err(Error::provider(Some(status), message.to_string()))
            }
            Behavior::Hang => Ok(Box::pin(stream::pending())),
        }
    }
}

async fn spawn_relay(behavior: Behavior) -> String {
    let retry = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(20),
    };
    let service = Arc::new(GenerationService::new(
        Arc::new(ScriptedProvider(behavior)),
        retry,
    ));
    let app = router(AppState {
        service,
        default_model: "gemini-2.5-flash".to_string(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn streamed_turn_accumulates_and_appends_history() {
    let base = spawn_relay(Behavior::Stream(vec!["Hello", " there"])).await;
    let client = ChatClient::new(&base).unwrap();
    let mut session = ChatSession::new(20);

    let mut renders = Vec::new();
    let reply = session
        .send(&client, "gemini-2.5-flash", "explain", "Hi", |full| {
            renders.push(full.to_string())
        })
        .await
        .unwrap();

    assert_eq!(reply, "Hello there");
    // Full re-render after every fragment, in emission order.
    assert_eq!(renders, vec!["Hello", "Hello there"]);
    // Bot message appended only after done.
    assert_eq!(
        session.history(),
        &[ChatMessage::user("Hi"), ChatMessage::bot("Hello there")]
    );
}

#[tokio::test]
async fn mid_stream_failure_keeps_history_clean() {
    let base = spawn_relay(Behavior::StreamThenError(vec!["Hi"])).await;
    let client = ChatClient::new(&base).unwrap();
    let mut session = ChatSession::new(20);

    let mut renders = Vec::new();
    let err = session
        .send(&client, "gemini-2.5-flash", "explain", "question", |full| {
            renders.push(full.to_string())
        })
        .await
        .unwrap_err();

    // The partial fragment was rendered, but never committed to history.
    assert_eq!(renders, vec!["Hi"]);
    assert_eq!(session.history(), &[ChatMessage::user("question")]);
    assert!(matches!(err, Error::Streaming(_)));
}

#[tokio::test]
async fn open_failure_surfaces_as_stream_error() {
    let base = spawn_relay(Behavior::OpenFailure(401, "invalid api key")).await;
    let client = ChatClient::new(&base).unwrap();
    let mut session = ChatSession::new(20);

    let err = session
        .send(&client, "gemini-2.5-flash", "explain", "Hi", |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Streaming(_)));
    assert_eq!(session.history(), &[ChatMessage::user("Hi")]);
}

#[tokio::test]
async fn hung_stream_times_out_and_releases() {
    let base = spawn_relay(Behavior::Hang).await;
    let client = ChatClient::with_timeout(&base, Duration::from_millis(200)).unwrap();
    let mut session = ChatSession::new(20);

    let err = session
        .send(&client, "gemini-2.5-flash", "explain", "Hi", |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
    assert_eq!(session.history(), &[ChatMessage::user("Hi")]);
}

#[tokio::test]
async fn windowed_history_only_transmits_trailing_messages() {
    let base = spawn_relay(Behavior::Stream(vec!["ok"])).await;
    let client = ChatClient::new(&base).unwrap();

    let mut session = ChatSession::new(20);
    for i in 0..24 {
        let reply = session
            .send(&client, "gemini-2.5-flash", "explain", format!("m{i}"), |_| {})
            .await
            .unwrap();
        assert_eq!(reply, "ok");
    }

    // 24 turns = 48 messages retained locally; only the last 20 go upstream.
    assert_eq!(session.history().len(), 48);
    assert_eq!(session.window().len(), 20);
    assert_eq!(session.excluded_count(), 28);
    assert_eq!(session.window()[0].text, "m14");
}

#[tokio::test]
async fn unary_endpoint_returns_complete_response() {
    let base = spawn_relay(Behavior::Stream(vec!["Hello", " there"])).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{base}/api/chat"))
        .json(&json!({ "conversation": [{ "role": "user", "text": "Hi" }] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["response"], "Hello there");
}

#[tokio::test]
async fn malformed_conversation_is_rejected_with_400() {
    let base = spawn_relay(Behavior::Stream(vec!["ok"])).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{base}/api/chat"))
        .json(&json!({ "conversation": "not an array" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn rate_limited_provider_maps_to_429() {
    let base = spawn_relay(Behavior::OpenFailure(429, "quota exceeded")).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{base}/api/chat"))
        .json(&json!({ "conversation": [{ "role": "user", "text": "Hi" }] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 429);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Rate limit exceeded");
}

#[tokio::test]
async fn stream_endpoint_frames_wire_events() {
    let base = spawn_relay(Behavior::Stream(vec!["Hel", "lo"])).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{base}/api/chat/stream"))
        .json(&json!({ "conversation": [{ "role": "user", "text": "Hi" }] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let body = response.text().await.unwrap();
    let events: Vec<&str> = body
        .split("\n\n")
        .filter_map(|block| block.trim().strip_prefix("data: "))
        .collect();
    assert_eq!(
        events,
        vec![r#"{"token":"Hel"}"#, r#"{"token":"lo"}"#, r#"{"done":true}"#]
    );
}
