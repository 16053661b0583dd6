//! Live reload over server-sent events.
//!
//! The watcher publishes content changes into an [`EventBus`]. Every client
//! of `/hotreload` gets its own [`ReloadSession`](session::ReloadSession)
//! with an independent quiet window and sequence counter.

mod bus;
mod debouncer;
mod event_log;
pub(crate) mod frame;
mod session;
mod sink;
mod stream;

pub(crate) use bus::{BUS_CAPACITY, EventBus, run_relay};
pub(crate) use session::SessionConfig;
pub(crate) use sink::{FrameSink, event_stream};
pub(crate) use stream::reload_stream;

/// Live reload wiring held in the application state.
#[derive(Clone, Debug)]
pub(crate) struct LiveReload {
    pub(crate) bus: EventBus,
    pub(crate) session: SessionConfig,
}
