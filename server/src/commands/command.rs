// Command Catalog
// The fixed set of operations the UI may invoke

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("{0}")]
    Failed(String),

    #[error("Command worker is not running")]
    Unavailable,
}

/// Whether the caller waits for a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Request,
    FireAndForget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetSetting { key: String },
    SetSetting { key: String, value: Value },
    SetDefaultSetting,
    GetConstants,
    GetTranslations { view: String },
    GetPaths { key: String },
    GetLog,
    ClearLog,
    GetPlatform,
    ShowWarning { title: String, message: String },
    ShowNotification { title: String, body: String },
    OpenExternalLink { url: String },
    MinimizeWindow,
    MaximizeWindow,
    CloseWindow,
}

impl Command {
    /// Build a command from its wire name and JSON payload
    pub fn parse(name: &str, payload: &Value) -> Result<Self, CommandError> {
        let command = match name {
            "get-setting" => Command::GetSetting {
                key: get_arg(payload, "key")?,
            },
            "set-setting" => Command::SetSetting {
                key: get_arg(payload, "key")?,
                value: get_arg(payload, "value")?,
            },
            "set-default-setting" => Command::SetDefaultSetting,
            "get-constants" => Command::GetConstants,
            "get-translations" => Command::GetTranslations {
                view: get_arg(payload, "view")?,
            },
            "get-paths" => Command::GetPaths {
                key: get_arg(payload, "key")?,
            },
            "get-log" => Command::GetLog,
            "clear-log" => Command::ClearLog,
            "get-platform" => Command::GetPlatform,
            "show-warning" => Command::ShowWarning {
                title: get_arg(payload, "title")?,
                message: get_arg(payload, "message")?,
            },
            "show-notification" => Command::ShowNotification {
                title: get_arg(payload, "title")?,
                body: get_arg(payload, "body")?,
            },
            "open-external-link" => Command::OpenExternalLink {
                url: get_arg(payload, "url")?,
            },
            "minimize-window" => Command::MinimizeWindow,
            "maximize-window" => Command::MaximizeWindow,
            "close-window" => Command::CloseWindow,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::GetSetting { .. } => "get-setting",
            Command::SetSetting { .. } => "set-setting",
            Command::SetDefaultSetting => "set-default-setting",
            Command::GetConstants => "get-constants",
            Command::GetTranslations { .. } => "get-translations",
            Command::GetPaths { .. } => "get-paths",
            Command::GetLog => "get-log",
            Command::ClearLog => "clear-log",
            Command::GetPlatform => "get-platform",
            Command::ShowWarning { .. } => "show-warning",
            Command::ShowNotification { .. } => "show-notification",
            Command::OpenExternalLink { .. } => "open-external-link",
            Command::MinimizeWindow => "minimize-window",
            Command::MaximizeWindow => "maximize-window",
            Command::CloseWindow => "close-window",
        }
    }

    pub fn delivery(&self) -> Delivery {
        match self {
            Command::SetDefaultSetting
            | Command::OpenExternalLink { .. }
            | Command::MinimizeWindow
            | Command::MaximizeWindow
            | Command::CloseWindow => Delivery::FireAndForget,
            _ => Delivery::Request,
        }
    }
}

fn get_arg<T: DeserializeOwned>(payload: &Value, key: &str) -> Result<T, CommandError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| CommandError::InvalidArgument("payload must be an object".to_string()))?;
    let value = obj
        .get(key)
        .ok_or_else(|| CommandError::InvalidArgument(format!("missing {key}")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| CommandError::InvalidArgument(format!("{key}: {e}")))
}
