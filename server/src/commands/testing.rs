// Test doubles for the command layer

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tempfile::TempDir;

use super::CommandBoundary;
use crate::config::AppConfig;
use crate::services::{EventSink, HostError, HostShell, LogManager};
use crate::state::CoreState;

#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<String>>,
    fail_next: AtomicBool,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: String) -> Result<(), HostError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(HostError::Failed("scripted failure".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl HostShell for RecordingHost {
    fn show_warning(&self, title: &str, message: &str) -> Result<(), HostError> {
        self.record(format!("warning:{title}:{message}"))
    }

    fn show_notification(&self, title: &str, body: &str) -> Result<(), HostError> {
        self.record(format!("notification:{title}:{body}"))
    }

    fn open_external(&self, url: &str) -> Result<(), HostError> {
        self.record(format!("open:{url}"))
    }

    fn minimize(&self) -> Result<(), HostError> {
        self.record("minimize".to_string())
    }

    fn toggle_maximize(&self) -> Result<(), HostError> {
        self.record("toggle_maximize".to_string())
    }

    fn close(&self) -> Result<(), HostError> {
        self.record("close".to_string())
    }
}

#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingEvents {
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: &str, payload: Value) {
        self.events.lock().unwrap().push((event.to_string(), payload));
    }
}

/// A boundary over a fresh data dir with `en`/`es` bundles and an `en-US` host
pub fn boundary(temp: &TempDir) -> (CommandBoundary, Arc<RecordingHost>, Arc<RecordingEvents>) {
    let resources_dir = temp.path().join("resources");
    let locales_dir = resources_dir.join("locales");
    fs::create_dir_all(&locales_dir).unwrap();
    fs::write(
        locales_dir.join("en.json"),
        r#"{ "main": { "ok": "OK" }, "home-view": { "hello-world": "Hello, world!" } }"#,
    )
    .unwrap();
    fs::write(
        locales_dir.join("es.json"),
        r#"{ "main": { "ok": "Aceptar" }, "home-view": { "hello-world": "¡Hola, mundo!" } }"#,
    )
    .unwrap();

    let config = AppConfig::new(temp.path().join("data"), resources_dir);
    let log = Arc::new(LogManager::new(config.log_file.clone(), false));
    let core =
        CoreState::load_with_host_locale(&config, log, Box::new(|| Some("en-US".to_string())));

    let host = Arc::new(RecordingHost::default());
    let events = Arc::new(RecordingEvents::default());
    let boundary = CommandBoundary::new(core, host.clone(), events.clone());
    (boundary, host, events)
}
