// Core State
// Everything the command boundary mutates, owned in one place

use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::{AppPaths, Constants, DefaultCatalog};
use crate::services::{HostLocale, LocaleManager, LogManager, SettingsManager};

pub struct CoreState {
    pub log: Arc<LogManager>,
    pub settings: SettingsManager,
    pub locale: LocaleManager,
    pub paths: AppPaths,
    pub constants: Constants,
}

impl CoreState {
    /// Read settings and translations. Failures degrade to empty state and are logged.
    pub fn load(config: &AppConfig, log: Arc<LogManager>) -> Self {
        Self::load_with_host_locale(config, log, Box::new(sys_locale::get_locale))
    }

    pub fn load_with_host_locale(
        config: &AppConfig,
        log: Arc<LogManager>,
        host_locale: HostLocale,
    ) -> Self {
        let constants = Constants::bundled().clone();

        let mut settings = SettingsManager::new(
            config.settings_file.clone(),
            DefaultCatalog::bundled().clone(),
            log.clone(),
        );
        settings.load();

        let mut locale = LocaleManager::new(
            config.locales_dir(),
            constants.supported_language_codes(),
            config.fallback_language.clone(),
            log.clone(),
        )
        .with_host_locale(host_locale);
        // Failure is already logged; the UI gets empty views until a reload succeeds.
        let _ = locale.load(&mut settings);

        Self {
            log,
            settings,
            locale,
            paths: AppPaths::from_config(config),
            constants,
        }
    }

    /// Teardown: persist anything a failed write left behind
    pub fn flush(&mut self) {
        if let Err(e) = self.settings.flush() {
            self.log.write(format!("Failed to flush settings on exit: {e}"));
        }
    }
}
