//! Home page handler.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use serde::Serialize;

use crate::error::ServerError;
use crate::state::AppState;

/// Template rendered for `/`.
pub(crate) const HOME_TEMPLATE: &str = "base.html";

#[derive(Serialize)]
struct HomeContext {
    /// Include the live reload client script.
    live_reload: bool,
}

/// Render the home page from the current template snapshot.
pub(crate) async fn get_home(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ServerError> {
    let ctx = HomeContext {
        live_reload: state.live_reload_enabled(),
    };
    let html = state.templates.render(HOME_TEMPLATE, ctx)?;
    Ok(Html(html))
}
