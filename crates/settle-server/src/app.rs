//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::live_reload;
use crate::middleware::security;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::home::get_home))
        .route("/feed", get(handlers::feed::get_feed));

    // Reload stream only exists while watching a local directory
    if state.live_reload_enabled() {
        router = router.route("/hotreload", get(live_reload::reload_stream));
    }

    router = router.merge(static_files::static_router());

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}
