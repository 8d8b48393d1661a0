// Tauri host integration
// Window control, native dialogs, notifications and UI events

use candela_server::services::{EventSink, HostError, HostShell};
use serde_json::Value;
use tauri::{AppHandle, Emitter, Manager, Runtime, WebviewWindow};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_plugin_notification::NotificationExt;
use tauri_plugin_shell::ShellExt;

const MAIN_WINDOW: &str = "main";

pub struct TauriHost<R: Runtime> {
    app_handle: AppHandle<R>,
}

impl<R: Runtime> TauriHost<R> {
    pub fn new(app_handle: AppHandle<R>) -> Self {
        Self { app_handle }
    }

    fn window(&self) -> Result<WebviewWindow<R>, HostError> {
        self.app_handle
            .get_webview_window(MAIN_WINDOW)
            .ok_or(HostError::NoWindow)
    }
}

fn failed(error: impl std::fmt::Display) -> HostError {
    HostError::Failed(error.to_string())
}

impl<R: Runtime> HostShell for TauriHost<R> {
    fn show_warning(&self, title: &str, message: &str) -> Result<(), HostError> {
        // Runs on the command worker, never on the event loop, so blocking is safe.
        self.app_handle
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Warning)
            .blocking_show();
        Ok(())
    }

    fn show_notification(&self, title: &str, body: &str) -> Result<(), HostError> {
        self.app_handle
            .notification()
            .builder()
            .title(title)
            .body(body)
            .show()
            .map_err(failed)
    }

    #[allow(deprecated)]
    fn open_external(&self, url: &str) -> Result<(), HostError> {
        self.app_handle.shell().open(url, None).map_err(failed)
    }

    fn minimize(&self) -> Result<(), HostError> {
        self.window()?.minimize().map_err(failed)
    }

    fn toggle_maximize(&self) -> Result<(), HostError> {
        let window = self.window()?;
        if window.is_maximized().map_err(failed)? {
            window.unmaximize().map_err(failed)
        } else {
            window.maximize().map_err(failed)
        }
    }

    fn close(&self) -> Result<(), HostError> {
        self.window()?.close().map_err(failed)
    }
}

pub struct TauriEventSink<R: Runtime> {
    app_handle: AppHandle<R>,
}

impl<R: Runtime> TauriEventSink<R> {
    pub fn new(app_handle: AppHandle<R>) -> Self {
        Self { app_handle }
    }
}

impl<R: Runtime> EventSink for TauriEventSink<R> {
    fn emit(&self, event: &str, payload: Value) {
        if let Err(e) = self.app_handle.emit(event, payload) {
            log::warn!("Failed to emit {event}: {e}");
        }
    }
}
