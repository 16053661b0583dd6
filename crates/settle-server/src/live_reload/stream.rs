//! `/hotreload` endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::session::ReloadSession;
use super::sink::event_stream;
use crate::state::AppState;

/// Open a reload stream for one client.
///
/// The session runs on its own task until the client disconnects or the
/// server shuts down.
pub(crate) async fn reload_stream(State(state): State<Arc<AppState>>) -> Response {
    let Some(live_reload) = &state.live_reload else {
        return StatusCode::NOT_FOUND.into_response();
    };

    // Subscribe before answering so no change after the headers is missed
    let events = live_reload.bus.subscribe();
    let (sink, response) = event_stream();
    let session = ReloadSession::new(
        sink,
        Arc::clone(&state.templates),
        live_reload.session,
        state.shutdown.child_token(),
    );

    tracing::debug!(
        session = %session.id(),
        sessions = live_reload.bus.subscriber_count(),
        "Client connected to reload stream"
    );
    tokio::spawn(session.run(events));

    response
}
