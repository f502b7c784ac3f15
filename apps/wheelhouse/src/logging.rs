//! Structured logging for events
//!
//! Every event that reaches the CLI is also recorded through `tracing`, at
//! the level the event itself declares.

use tracing::Level;
use wheelhouse_events::AppEvent;

macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!(target: "wheelhouse::events", $($arg)+),
            Level::WARN => tracing::warn!(target: "wheelhouse::events", $($arg)+),
            Level::INFO => tracing::info!(target: "wheelhouse::events", $($arg)+),
            Level::DEBUG => tracing::debug!(target: "wheelhouse::events", $($arg)+),
            _ => tracing::trace!(target: "wheelhouse::events", $($arg)+),
        }
    };
}

/// Log an `AppEvent` with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let level = event.log_level();
    let source = event.log_target();
    match event {
        AppEvent::Transfer(transfer) => {
            log_at!(level, source, key = transfer.key(), event = ?transfer, "transfer");
        }
        AppEvent::Resolver(resolver) => {
            log_at!(level, source, event = ?resolver, "resolver");
        }
        AppEvent::Index(index) => {
            log_at!(level, source, event = ?index, "index");
        }
        AppEvent::General(general) => {
            log_at!(level, source, event = ?general, "general");
        }
    }
}
