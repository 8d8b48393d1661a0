// Command Boundary
// Dispatches UI commands to the core services and the host shell

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use super::system::{get_platform, validate_external_url};
use super::{Command, CommandError};
use crate::models::SetSettingResult;
use crate::services::{
    derive_palette, emit_event, EventSink, HostError, HostShell, SettingsError, LANGUAGE_CHANGED,
    LANGUAGE_SETTING, SETTINGS_CHANGED,
};
use crate::state::CoreState;

pub const WALLPAPER_SETTING: &str = "wallpaper";
pub const AUTO_COLORS_SETTING: &str = "autoColors";
pub const COLORS_SETTING: &str = "colors";
pub const NOTIFICATIONS_SETTING: &str = "notifications";

pub struct CommandBoundary {
    core: CoreState,
    host: Arc<dyn HostShell>,
    events: Arc<dyn EventSink>,
}

impl CommandBoundary {
    pub fn new(core: CoreState, host: Arc<dyn HostShell>, events: Arc<dyn EventSink>) -> Self {
        Self { core, host, events }
    }

    #[cfg(test)]
    pub fn core(&self) -> &CoreState {
        &self.core
    }

    /// Run one command to completion
    pub fn dispatch(&mut self, command: Command) -> Result<Value, CommandError> {
        match command {
            Command::GetSetting { key } => self.core.settings.get(&key).map_err(|e| match e {
                SettingsError::UnknownKey(key) => CommandError::UnknownSetting(key),
                other => CommandError::Failed(other.to_string()),
            }),
            Command::SetSetting { key, value } => Ok(json!(self.set_setting(&key, value))),
            Command::SetDefaultSetting => {
                self.core
                    .settings
                    .reset()
                    .map_err(|e| CommandError::Failed(e.to_string()))?;
                emit_event(self.events.as_ref(), SETTINGS_CHANGED, &json!({ "key": null }));
                // `language` is back to its default; the active bundle must follow.
                self.reload_translations();
                Ok(Value::Null)
            }
            Command::GetConstants => Ok(self.core.constants.document().clone()),
            Command::GetTranslations { view } => Ok(json!(self.core.locale.get_view(&view))),
            Command::GetPaths { key } => self
                .core
                .paths
                .mapping(&key)
                .map(|mapping| json!(mapping))
                .ok_or_else(|| CommandError::InvalidArgument(format!("unknown path key {key}"))),
            Command::GetLog => match self.core.log.read() {
                Ok(content) => Ok(Value::String(content)),
                Err(e) => {
                    self.core.log.write(format!("Failed to read log file: {e}"));
                    Ok(Value::Null)
                }
            },
            Command::ClearLog => {
                self.core.log.clear();
                Ok(Value::Null)
            }
            Command::GetPlatform => Ok(json!(get_platform())),
            Command::ShowWarning { title, message } => {
                self.host.show_warning(&title, &message).map_err(host_error)?;
                Ok(Value::Null)
            }
            Command::ShowNotification { title, body } => {
                if self.notifications_enabled() {
                    self.host.show_notification(&title, &body).map_err(host_error)?;
                }
                Ok(Value::Null)
            }
            Command::OpenExternalLink { url } => {
                let url = validate_external_url(&url)?;
                self.host.open_external(url.as_str()).map_err(host_error)?;
                Ok(Value::Null)
            }
            Command::MinimizeWindow => self.host.minimize().map(|_| Value::Null).map_err(host_error),
            Command::MaximizeWindow => self
                .host
                .toggle_maximize()
                .map(|_| Value::Null)
                .map_err(host_error),
            Command::CloseWindow => self.host.close().map(|_| Value::Null).map_err(host_error),
        }
    }

    /// Run a fire-and-forget command; nobody is waiting, so failures go to the log
    pub fn deliver(&mut self, command: Command) {
        let name = command.name();
        if let Err(e) = self.dispatch(command) {
            self.core.log.write(format!("Command {name} failed: {e}"));
        }
    }

    /// Teardown hook run by the command worker before it exits
    pub fn shutdown(&mut self) {
        self.core.flush();
        self.core.log.write("Command boundary stopped");
    }

    fn set_setting(&mut self, key: &str, value: Value) -> SetSettingResult {
        if key.trim().is_empty() {
            return SetSettingResult::failed("setting key must not be empty");
        }

        if let Err(e) = self.core.settings.set(key, value) {
            self.core
                .log
                .write(format!("Failed to update setting \"{key}\": {e}"));
            return SetSettingResult::failed(e.to_string());
        }

        emit_event(self.events.as_ref(), SETTINGS_CHANGED, &json!({ "key": key }));

        match key {
            LANGUAGE_SETTING => self.reload_translations(),
            WALLPAPER_SETTING => self.refresh_colors(),
            _ => {}
        }

        SetSettingResult::ok()
    }

    fn reload_translations(&mut self) {
        let core = &mut self.core;
        if let Ok(code) = core.locale.load(&mut core.settings) {
            emit_event(self.events.as_ref(), LANGUAGE_CHANGED, &json!({ "code": code }));
        }
    }

    fn notifications_enabled(&mut self) -> bool {
        self.core
            .settings
            .get(NOTIFICATIONS_SETTING)
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(true)
    }

    /// Recompute the `colors` setting from the wallpaper when automatic colors are enabled
    fn refresh_colors(&mut self) {
        let auto_colors = self
            .core
            .settings
            .get(AUTO_COLORS_SETTING)
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        if !auto_colors {
            return;
        }

        let wallpaper = match self.core.settings.get(WALLPAPER_SETTING) {
            Ok(Value::String(path)) if !path.trim().is_empty() => PathBuf::from(path),
            _ => return,
        };

        let palette = match derive_palette(&wallpaper) {
            Ok(palette) => palette,
            Err(e) => {
                self.core.log.write(format!(
                    "Failed to generate colors from {}: {e}",
                    wallpaper.display()
                ));
                return;
            }
        };

        match self.core.settings.set(COLORS_SETTING, json!(palette)) {
            Ok(()) => emit_event(
                self.events.as_ref(),
                SETTINGS_CHANGED,
                &json!({ "key": COLORS_SETTING }),
            ),
            Err(e) => self
                .core
                .log
                .write(format!("Failed to save generated colors: {e}")),
        }
    }
}

fn host_error(error: HostError) -> CommandError {
    CommandError::Host(error.to_string())
}
