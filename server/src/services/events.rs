// Events
// Notifications pushed from the core to the UI
//
// Event catalog:
//   settings-changed   { "key": string | null }  one key was written; `null` after a full reset
//   language-changed   { "code": string }        a new translation bundle is active

use serde::Serialize;
use serde_json::Value;

pub const SETTINGS_CHANGED: &str = "settings-changed";
pub const LANGUAGE_CHANGED: &str = "language-changed";

/// Push channel to whatever renders the UI. Called from the command worker thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Writes events to the log; used by the headless transport, which has no push channel
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &str, payload: Value) {
        log::info!("event {event}: {payload}");
    }
}

/// Serialize a payload and hand it to the sink. Payloads that fail to serialize are dropped with a warning.
pub fn emit_event<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit(event, value),
        Err(e) => log::warn!("Dropped {event} event: {e}"),
    }
}
