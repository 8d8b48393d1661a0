// Host Shell
// Window, dialog, notification and link integration provided by the shell layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Main window is not available")]
    NoWindow,

    #[error("Host operation failed: {0}")]
    Failed(String),
}

/// Operations the core forwards to whatever owns the windows.
/// Implementations must be callable from the command worker thread.
pub trait HostShell: Send + Sync {
    /// Blocks until the user dismisses the dialog
    fn show_warning(&self, title: &str, message: &str) -> Result<(), HostError>;

    fn show_notification(&self, title: &str, body: &str) -> Result<(), HostError>;

    fn open_external(&self, url: &str) -> Result<(), HostError>;

    fn minimize(&self) -> Result<(), HostError>;

    /// Maximize, or restore when already maximized
    fn toggle_maximize(&self) -> Result<(), HostError>;

    fn close(&self) -> Result<(), HostError>;
}

/// Host used when the UI runs in a browser: there is no native window to drive,
/// so dialogs and notifications are recorded in the log and links open in the default browser.
pub struct HeadlessHost;

impl HostShell for HeadlessHost {
    fn show_warning(&self, title: &str, message: &str) -> Result<(), HostError> {
        log::warn!("[warning dialog] {title}: {message}");
        Ok(())
    }

    fn show_notification(&self, title: &str, body: &str) -> Result<(), HostError> {
        log::info!("[notification] {title}: {body}");
        Ok(())
    }

    fn open_external(&self, url: &str) -> Result<(), HostError> {
        opener::open_browser(url).map_err(|e| HostError::Failed(e.to_string()))
    }

    fn minimize(&self) -> Result<(), HostError> {
        log::info!("minimize-window ignored in headless mode");
        Ok(())
    }

    fn toggle_maximize(&self) -> Result<(), HostError> {
        log::info!("maximize-window ignored in headless mode");
        Ok(())
    }

    fn close(&self) -> Result<(), HostError> {
        log::info!("close-window ignored in headless mode");
        Ok(())
    }
}
