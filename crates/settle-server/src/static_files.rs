//! Static file serving.
//!
//! The live reload client is compiled into the binary.

use std::sync::Arc;

use axum::Router;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::state::AppState;

/// Client script that listens on `/hotreload`.
const LIVE_RELOAD_JS: &str = include_str!("../assets/live-reload.js");

/// Create router for static assets.
pub(crate) fn static_router() -> Router<Arc<AppState>> {
    Router::new().route("/live-reload.js", get(live_reload_script))
}

async fn live_reload_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        LIVE_RELOAD_JS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_targets_reload_stream() {
        assert!(LIVE_RELOAD_JS.contains("new EventSource(\"/hotreload\")"));
        assert!(LIVE_RELOAD_JS.contains("reload-error"));
    }
}
