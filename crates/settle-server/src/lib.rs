//! HTTP server and live reload pipeline for settle.
//!
//! This crate provides an axum server that renders templates and, in local
//! mode, tells connected browsers to reload once template edits settle:
//! - `/` renders `base.html` from the current template snapshot
//! - `/hotreload` streams one reload frame per settle point (local mode)
//! - `/feed` streams a demo fragment every 200ms
//! - `/live-reload.js` is the client side of `/hotreload`
//!
//! # Quick Start
//!
//! ```ignore
//! use settle_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         local_mode: true,
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! notify ──► DirWatcher ──► relay task ──► EventBus (content changes only)
//!                                              │
//!                  ┌───────────────────────────┼──────────────── ...
//!                  ▼                           ▼
//!            ReloadSession               ReloadSession      one per /hotreload client
//!        (quiet window, event log,     (independent window)
//!         sequence counter)
//!                  │
//!                  └─► TemplateRegistry::reload ──► frame on the client's stream
//! ```

mod app;
mod error;
mod handlers;
mod live_reload;
mod middleware;
mod state;
mod static_files;

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use settle_templates::TemplateRegistry;
use settle_watch::DirWatcher;
use tokio_util::sync::CancellationToken;

pub use error::ServerError;
use live_reload::{BUS_CAPACITY, EventBus, LiveReload, SessionConfig};
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Template directory used in local mode.
    pub templates_dir: PathBuf,
    /// Glob selecting template files inside `templates_dir`.
    pub template_pattern: String,
    /// Serve templates from disk and enable live reload.
    pub local_mode: bool,
    /// Quiet window before a burst of changes triggers a reload.
    pub debounce: Duration,
    /// Reconnect hint sent with every reload frame.
    pub retry: Duration,
    /// Watch subdirectories of `templates_dir` too.
    pub recursive: bool,
    /// Globs selecting which changed paths are reported.
    pub watch_patterns: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            templates_dir: PathBuf::from("templates"),
            template_pattern: "*.html".to_owned(),
            local_mode: false,
            debounce: Duration::from_millis(50),
            retry: Duration::from_millis(250),
            recursive: false,
            watch_patterns: vec!["*.html".to_owned()],
        }
    }
}

/// Run the server until Ctrl-C or a fatal watcher error.
///
/// # Errors
///
/// Returns an error if the templates cannot be loaded, the directory cannot
/// be watched, the address cannot be bound, or the watcher fails while running.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let templates = if config.local_mode {
        TemplateRegistry::from_dir(&config.templates_dir, &config.template_pattern)?
    } else {
        TemplateRegistry::embedded()?
    };
    let templates = Arc::new(templates);
    let shutdown = CancellationToken::new();

    // Watch before binding so a bad directory fails fast
    let (live_reload, relay) = if config.local_mode {
        let watcher = DirWatcher::new(
            &config.templates_dir,
            config.recursive,
            &config.watch_patterns,
        )?;
        let bus = EventBus::new(BUS_CAPACITY);
        let relay = tokio::spawn(live_reload::run_relay(watcher, bus.clone()));
        let live_reload = LiveReload {
            bus,
            session: SessionConfig {
                quiet_window: config.debounce,
                retry: config.retry,
            },
        };
        (Some(live_reload), Some(relay))
    } else {
        (None, None)
    };

    let state = Arc::new(AppState {
        templates,
        live_reload,
        shutdown: shutdown.clone(),
    });
    let app = app::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(address = %addr, local_mode = config.local_mode, "Starting server");

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .into_future();

    let Some(mut relay) = relay else {
        server.await?;
        return Ok(());
    };

    let mut server = std::pin::pin!(server);
    tokio::select! {
        result = &mut server => result?,
        joined = &mut relay => {
            match joined {
                Ok(Ok(())) => server.await?,
                Ok(Err(err)) => {
                    tracing::error!(error = %err, "File watcher failed");
                    shutdown.cancel();
                    return Err(err.into());
                }
                Err(err) => {
                    shutdown.cancel();
                    return Err(ServerError::Io(std::io::Error::other(err)));
                }
            }
        }
    }

    relay.abort();
    Ok(())
}

/// Wait for Ctrl-C, then tell open streams to finish.
///
/// Graceful shutdown waits for every connection to close, so event streams
/// must end before the server can stop.
async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        () = shutdown.cancelled() => {}
        result = tokio::signal::ctrl_c() => {
            result.expect("Failed to install Ctrl+C handler");
            tracing::info!("Shutdown signal received, stopping server...");
        }
    }
    shutdown.cancel();
}

/// Create server configuration from settle config.
#[must_use]
pub fn server_config_from_config(config: &settle_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        templates_dir: config.templates_resolved.dir.clone(),
        template_pattern: config.templates_resolved.pattern.clone(),
        local_mode: config.templates_resolved.local_mode,
        debounce: config.live_reload.debounce(),
        retry: config.live_reload.retry(),
        recursive: config.live_reload.recursive,
        watch_patterns: config.live_reload.watch_patterns.clone(),
    }
}
