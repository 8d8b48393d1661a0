// Paths Model
// Resolved locations the UI may ask about

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub app_data: PathBuf,
    pub settings: PathBuf,
    pub log: PathBuf,
    pub locales: PathBuf,
    pub image_cache: PathBuf,
}

impl AppPaths {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            app_data: config.data_dir.clone(),
            settings: config.settings_file.clone(),
            log: config.log_file.clone(),
            locales: config.locales_dir(),
            image_cache: config.image_cache_dir.clone(),
        }
    }

    /// Look up one path by its wire name
    pub fn resolve(&self, key: &str) -> Option<&PathBuf> {
        match key {
            "appData" => Some(&self.app_data),
            "settings" => Some(&self.settings),
            "log" => Some(&self.log),
            "locales" => Some(&self.locales),
            "imageCache" => Some(&self.image_cache),
            _ => None,
        }
    }

    /// `{ key: path }` for a known key
    pub fn mapping(&self, key: &str) -> Option<HashMap<String, String>> {
        self.resolve(key).map(|path| {
            HashMap::from([(key.to_string(), path.to_string_lossy().to_string())])
        })
    }
}
