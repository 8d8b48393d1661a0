// LocaleManager Service
// Resolves the UI language and owns the active translation bundle

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::services::{LogManager, SettingsManager};

/// Sentinel value of the `language` setting that defers to the host locale
pub const SYSTEM_LANGUAGE: &str = "system";
pub const LANGUAGE_SETTING: &str = "language";

/// view id -> (message key -> localized string)
pub type Bundle = HashMap<String, HashMap<String, String>>;

#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("Failed to read translation file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse translation file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported language: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocaleState {
    Unloaded,
    Loaded { code: String, bundle: Bundle },
}

/// Source of the host locale string (e.g. `es-MX`)
pub type HostLocale = Box<dyn Fn() -> Option<String> + Send>;

pub struct LocaleManager {
    locales_dir: PathBuf,
    supported: Vec<String>,
    fallback: String,
    host_locale: HostLocale,
    state: LocaleState,
    log: Arc<LogManager>,
}

impl LocaleManager {
    pub fn new(
        locales_dir: PathBuf,
        supported: Vec<String>,
        fallback: impl Into<String>,
        log: Arc<LogManager>,
    ) -> Self {
        Self {
            locales_dir,
            supported,
            fallback: fallback.into(),
            host_locale: Box::new(sys_locale::get_locale),
            state: LocaleState::Unloaded,
            log,
        }
    }

    /// Replace the host locale probe
    pub fn with_host_locale(mut self, host_locale: HostLocale) -> Self {
        self.host_locale = host_locale;
        self
    }

    pub fn state(&self) -> &LocaleState {
        &self.state
    }

    #[cfg(test)]
    pub fn current_code(&self) -> Option<&str> {
        match &self.state {
            LocaleState::Loaded { code, .. } => Some(code),
            LocaleState::Unloaded => None,
        }
    }

    /// Work out which language to show from the `language` setting and the host locale
    pub fn resolve(&self, settings: &mut SettingsManager) -> String {
        let configured = match settings.get(LANGUAGE_SETTING) {
            Ok(Value::String(code)) => code,
            // Not a code at all; reported as unsupported below.
            Ok(other) => other.to_string(),
            Err(e) => {
                self.log.write(format!("Failed to read language setting: {e}"));
                SYSTEM_LANGUAGE.to_string()
            }
        };

        let requested = if configured == SYSTEM_LANGUAGE {
            let code = (self.host_locale)()
                .map(|locale| two_letter_code(&locale))
                .unwrap_or_default();
            self.log.write(format!("System language: {code}"));
            code
        } else {
            configured
        };

        let code = match self.check_supported(&requested) {
            Ok(code) => code,
            Err(e) => {
                self.log.write(format!(
                    "{e}, using \"{}\" by default.",
                    self.fallback
                ));
                self.fallback.clone()
            }
        };

        self.log.write(format!("Displayed language: {code}"));
        code
    }

    /// Resolve and load the bundle for the active language.
    /// On failure the previously loaded bundle stays in place.
    pub fn load(&mut self, settings: &mut SettingsManager) -> Result<String, LocaleError> {
        let code = self.resolve(settings);

        match self.read_bundle(&code) {
            Ok(bundle) => {
                self.state = LocaleState::Loaded {
                    code: code.clone(),
                    bundle,
                };
                Ok(code)
            }
            Err(e) => {
                self.log.write(format!("Failed to load translations: {e}"));
                Err(e)
            }
        }
    }

    /// Strings for one view; empty when the view or bundle is missing
    pub fn get_view(&self, view_id: &str) -> HashMap<String, String> {
        match &self.state {
            LocaleState::Loaded { bundle, .. } => bundle.get(view_id).cloned().unwrap_or_default(),
            LocaleState::Unloaded => HashMap::new(),
        }
    }

    fn check_supported(&self, code: &str) -> Result<String, LocaleError> {
        if self.supported.iter().any(|supported| supported == code) {
            Ok(code.to_string())
        } else {
            Err(LocaleError::Unsupported(code.to_string()))
        }
    }

    fn read_bundle(&self, code: &str) -> Result<Bundle, LocaleError> {
        let path = self.locales_dir.join(format!("{code}.json"));
        let content = fs::read_to_string(&path).map_err(|source| LocaleError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| LocaleError::Parse { path, source })
    }
}

/// `es-MX` / `es_MX.UTF-8` -> `es`
fn two_letter_code(locale: &str) -> String {
    locale
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect::<String>()
        .to_lowercase()
}
