//! Server-side streaming relay: re-frames provider fragments as wire
//! events with exactly one terminal event.

use futures::stream::Stream;
use futures_util::StreamExt;
use tracing::info;

use crate::provider::TokenStream;
use crate::types::WireEvent;

/// Pull fragments one at a time and emit a `token` event per fragment in
/// order. Exhaustion emits a single `done`; the first pull failure emits a
/// single `error` and ends the stream. Nothing is emitted after a terminal
/// event.
pub fn relay_events(mut tokens: TokenStream) -> impl Stream<Item = WireEvent> {
    async_stream::stream! {
        let mut relayed = 0usize;
        while let Some(next) = tokens.next().await {
            match next {
                Ok(token) => {
                    relayed += token.len();
                    yield WireEvent::token(token);
                }
                Err(err) => {
                    yield WireEvent::error(err.user_message());
                    return;
                }
            }
        }
        info!(chars = relayed, "stream completed");
        yield WireEvent::done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn scripted(items: Vec<Result<String, Error>>) -> TokenStream {
        Box::pin(futures_util::stream::iter(items))
    }

    #[tokio::test]
    async fn tokens_then_done() {
        let events: Vec<WireEvent> =
            relay_events(scripted(vec![Ok("Hel".into()), Ok("lo".into())]))
                .collect()
                .await;

        assert_eq!(
            events,
            vec![
                WireEvent::token("Hel"),
                WireEvent::token("lo"),
                WireEvent::done(),
            ]
        );
    }

    #[tokio::test]
    async fn failure_mid_stream_emits_single_error_and_no_done() {
        let events: Vec<WireEvent> = relay_events(scripted(vec![
            Ok("Hi".into()),
            Err(Error::streaming("connection reset")),
            Ok("never delivered".into()),
        ]))
        .collect()
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], WireEvent::token("Hi"));
        assert!(matches!(events[1], WireEvent::Error { .. }));
        assert!(!events.iter().any(|e| matches!(e, WireEvent::Done { .. })));
    }

    #[tokio::test]
    async fn empty_stream_is_just_done() {
        let events: Vec<WireEvent> = relay_events(scripted(vec![])).collect().await;
        assert_eq!(events, vec![WireEvent::done()]);
    }

    #[tokio::test]
    async fn error_message_is_user_facing() {
        let events: Vec<WireEvent> = relay_events(scripted(vec![Err(Error::provider(
            Some(429),
            "quota exceeded; internal trace id abc123",
        ))]))
        .collect()
        .await;

        match &events[0] {
            WireEvent::Error { error } => {
                assert!(error.contains("rate limit"));
                assert!(!error.contains("abc123"));
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }
}
