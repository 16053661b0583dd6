//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use settle_templates::TemplateRegistry;
use tokio_util::sync::CancellationToken;

use crate::live_reload::LiveReload;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Current template set, swapped on reload.
    pub(crate) templates: Arc<TemplateRegistry>,
    /// Live reload wiring (local mode only).
    pub(crate) live_reload: Option<LiveReload>,
    /// Cancelled when the server begins shutting down.
    pub(crate) shutdown: CancellationToken,
}

impl AppState {
    /// Check if live reload is enabled.
    #[must_use]
    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.live_reload.is_some()
    }
}
