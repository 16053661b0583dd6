//! Where sessions write their frames.

use std::convert::Infallible;
use std::future::Future;

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;

/// Frames buffered between a session and the response body.
const FRAME_BUFFER: usize = 16;

/// The client is gone; nothing more can be written.
#[derive(Debug, thiserror::Error)]
#[error("event stream closed by client")]
pub(crate) struct StreamClosed;

/// Destination for event-stream frames.
///
/// Every successful [`send_frame`](Self::send_frame) hands one complete frame
/// to the transport as its own chunk, so the client sees it without waiting
/// for more output.
pub(crate) trait FrameSink: Send + Sync + 'static {
    fn send_frame(&self, frame: String) -> impl Future<Output = Result<(), StreamClosed>> + Send;

    /// Resolves once the client has disconnected.
    fn closed(&self) -> impl Future<Output = ()> + Send;
}

/// Sink backed by a streaming axum response body.
#[derive(Clone, Debug)]
pub(crate) struct ChannelSink {
    tx: mpsc::Sender<Result<Bytes, Infallible>>,
}

impl FrameSink for ChannelSink {
    async fn send_frame(&self, frame: String) -> Result<(), StreamClosed> {
        self.tx
            .send(Ok(Bytes::from(frame)))
            .await
            .map_err(|_| StreamClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await;
    }
}

/// Open an event stream.
///
/// The returned response carries the event-stream headers and a body fed by
/// the sink; the body ends when every clone of the sink is dropped.
pub(crate) fn event_stream() -> (ChannelSink, Response) {
    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(FRAME_BUFFER);
    let frames = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (frame, rx))
    });
    let body = Body::from_stream(frames);

    let response = (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response();

    (ChannelSink { tx }, response)
}
