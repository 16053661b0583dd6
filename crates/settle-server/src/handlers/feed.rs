//! Demo fragment feed.
//!
//! Pushes a fresh `#feed` fragment every [`FEED_INTERVAL`] so the page shows
//! the stream is alive.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;

use crate::live_reload::{FrameSink, event_stream};
use crate::live_reload::frame::FragmentFrame;
use crate::state::AppState;

pub(crate) const FEED_INTERVAL: Duration = Duration::from_millis(200);

/// Open the feed stream.
pub(crate) async fn get_feed(State(state): State<Arc<AppState>>) -> Response {
    let (sink, response) = event_stream();
    tokio::spawn(run_feed(sink, state.shutdown.child_token(), FEED_INTERVAL));
    response
}

/// Send one fragment per `period` until the client leaves or `shutdown` fires.
async fn run_feed<S: FrameSink>(sink: S, shutdown: CancellationToken, period: Duration) {
    let mut ticks = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            () = sink.closed() => break,
            _ = ticks.tick() => {
                if sink.send_frame(feed_frame().to_string()).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Feed stream closed");
}

fn feed_frame() -> FragmentFrame {
    FragmentFrame::new()
        .selector("#feed")
        .merge_type("morph")
        .fragment(format!(
            r#"<span id="feed">Server time: {}</span>"#,
            Utc::now().timestamp_millis()
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test(start_paused = true)]
    async fn test_feed_sends_fragments_until_shutdown() {
        let (sink, response) = event_stream();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run_feed(sink, shutdown.clone(), FEED_INTERVAL));

        let mut body = response.into_body().into_data_stream();
        for _ in 0..3 {
            let chunk = body.next().await.unwrap().unwrap();
            let frame = std::str::from_utf8(&chunk).unwrap();
            assert!(frame.starts_with(
                "event: datastar-fragment\n\
                 data: selector #feed\n\
                 data: mergeType morph\n\
                 data: fragment <span id=\"feed\">Server time: "
            ));
            assert!(frame.ends_with("</span>\n\n"));
        }

        shutdown.cancel();
        task.await.unwrap();
        assert!(body.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_stops_when_client_leaves() {
        let (sink, response) = event_stream();
        let task = tokio::spawn(run_feed(sink, CancellationToken::new(), FEED_INTERVAL));

        drop(response);
        task.await.unwrap();
    }
}
