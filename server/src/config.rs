// Candela Configuration
// Bundled global config plus environment overrides

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;

const GLOBAL_CONFIG_JSON: &str = include_str!("../../resources/config/global.json");

static GLOBAL_CONFIG: OnceLock<GlobalConfig> = OnceLock::new();

/// Static configuration compiled into the binary
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    pub app_name: String,
    pub settings_file: String,
    pub log_file: String,
    pub image_cache_dir: String,
    pub fallback_language: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            app_name: "Candela".to_string(),
            settings_file: "settings.json".to_string(),
            log_file: "candela.log".to_string(),
            image_cache_dir: "image-cache".to_string(),
            fallback_language: "en".to_string(),
        }
    }
}

impl GlobalConfig {
    /// Parsed once; a broken bundled file falls back to built-in values.
    pub fn bundled() -> &'static GlobalConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            serde_json::from_str(GLOBAL_CONFIG_JSON).unwrap_or_else(|e| {
                eprintln!("Bundled global config is invalid, using built-in values: {e}");
                GlobalConfig::default()
            })
        })
    }
}

/// Runtime configuration shared by the desktop shell and the HTTP transport
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub resources_dir: PathBuf,
    pub log_file: PathBuf,
    pub settings_file: PathBuf,
    pub image_cache_dir: PathBuf,
    pub fallback_language: String,
    /// Echo log lines to stderr
    pub dev: bool,
}

impl AppConfig {
    pub fn new(data_dir: PathBuf, resources_dir: PathBuf) -> Self {
        let global = GlobalConfig::bundled();
        Self {
            log_file: data_dir.join(&global.log_file),
            settings_file: data_dir.join(&global.settings_file),
            image_cache_dir: data_dir.join(&global.image_cache_dir),
            fallback_language: global.fallback_language.clone(),
            dev: cfg!(debug_assertions) || env_flag("CANDELA_DEV"),
            data_dir,
            resources_dir,
        }
    }

    /// Build from `CANDELA_*` environment variables, falling back to the
    /// platform data directory and a `resources` folder next to the working dir.
    pub fn from_env() -> Self {
        let global = GlobalConfig::bundled();
        let data_dir = env::var("CANDELA_DATA_DIR")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs_next::data_dir().map(|dir| dir.join(&global.app_name)))
            .unwrap_or_else(|| PathBuf::from("data"));
        let resources_dir = env::var("CANDELA_RESOURCES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| find_resources_dir());

        let mut config = Self::new(data_dir, resources_dir);
        if let Ok(log_file) = env::var("CANDELA_LOG_FILE") {
            config.log_file = PathBuf::from(log_file);
        }
        config
    }

    pub fn locales_dir(&self) -> PathBuf {
        self.resources_dir.join("locales")
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(false)
}

/// Look for `resources/locales` relative to the working directory, then next to the executable.
fn find_resources_dir() -> PathBuf {
    let mut candidates = vec![PathBuf::from("resources"), PathBuf::from("../resources")];
    if let Some(exe_dir) = env::current_exe().ok().and_then(|p| p.parent().map(PathBuf::from)) {
        candidates.push(exe_dir.join("resources"));
    }

    candidates
        .into_iter()
        .find(|dir| dir.join("locales").is_dir())
        .unwrap_or_else(|| PathBuf::from("resources"))
}
