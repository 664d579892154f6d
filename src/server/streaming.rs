//! Token streaming for `POST /chat` responses.
//!
//! The body is the raw concatenation of token fragments: no SSE framing, no
//! JSON envelope. Each fragment is written as soon as it arrives.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::chain::conversation::ChainEvent;
use crate::error::StreamAborted;
use crate::metrics::Metrics;

/// Media type of chat responses.
pub const EVENT_STREAM: &str = "text/event-stream";

/// Convert chain events into body chunks.
///
/// `first` is an event already taken off the channel by the handler. A
/// [`ChainEvent::Error`] ends the body with an error, which aborts the
/// connection.
pub fn chain_to_body_stream(
    first: Option<ChainEvent>,
    rx: mpsc::Receiver<ChainEvent>,
    metrics: Arc<Metrics>,
) -> impl Stream<Item = Result<Bytes, StreamAborted>> + Send + 'static {
    tokio_stream::iter(first)
        .chain(ReceiverStream::new(rx))
        .filter_map(move |event| match event {
            ChainEvent::Token(text) => {
                metrics.tokens_streamed.inc();
                Some(Ok(Bytes::from(text)))
            }
            ChainEvent::Done { .. } => None,
            ChainEvent::Error(e) => {
                metrics.generation_failures.inc();
                Some(Err(StreamAborted(e)))
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_body_stream_concatenates_tokens() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let (tx, rx) = mpsc::channel(8);
        tx.send(ChainEvent::Token(" world".into())).await.unwrap();
        tx.send(ChainEvent::Done { fragments: 2 }).await.unwrap();
        drop(tx);

        let chunks: Vec<Bytes> = chain_to_body_stream(
            Some(ChainEvent::Token("hello".into())),
            rx,
            metrics.clone(),
        )
        .map(|r| r.unwrap())
        .collect()
        .await;

        assert_eq!(chunks.concat(), b"hello world".to_vec());
        assert_eq!(metrics.tokens_streamed.get(), 2);
    }

    #[tokio::test]
    async fn test_body_stream_error_item() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let (tx, rx) = mpsc::channel(8);
        tx.send(ChainEvent::Error("reset".into())).await.unwrap();
        drop(tx);

        let items: Vec<Result<Bytes, StreamAborted>> =
            chain_to_body_stream(Some(ChainEvent::Token("a".into())), rx, metrics.clone())
                .collect()
                .await;

        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
        assert_eq!(metrics.generation_failures.get(), 1);
    }
}
