// Catalog Models
// Immutable bundled data: factory defaults and program constants

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DEFAULT_SETTINGS_JSON: &str = include_str!("../../../resources/config/default-settings.json");
const CONSTANTS_JSON: &str = include_str!("../../../resources/config/constants.json");

static DEFAULT_CATALOG: OnceLock<DefaultCatalog> = OnceLock::new();
static CONSTANTS: OnceLock<Constants> = OnceLock::new();

/// Factory defaults, key -> value
#[derive(Debug, Clone, Default)]
pub struct DefaultCatalog {
    values: Map<String, Value>,
}

impl DefaultCatalog {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// The catalog compiled into the binary
    pub fn bundled() -> &'static DefaultCatalog {
        DEFAULT_CATALOG.get_or_init(|| match serde_json::from_str(DEFAULT_SETTINGS_JSON) {
            Ok(Value::Object(values)) => DefaultCatalog::new(values),
            Ok(_) | Err(_) => {
                log::error!("Bundled default settings are not a JSON object");
                DefaultCatalog::default()
            }
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|value| !value.is_null())
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// A language the UI ships translations for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

/// Program constants handed to the UI verbatim
#[derive(Debug, Clone)]
pub struct Constants {
    document: Value,
    languages: Vec<Language>,
}

impl Constants {
    pub fn from_value(document: Value) -> Self {
        let languages = document
            .get("languages")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        Self {
            document,
            languages,
        }
    }

    pub fn bundled() -> &'static Constants {
        CONSTANTS.get_or_init(|| match serde_json::from_str(CONSTANTS_JSON) {
            Ok(document) => Constants::from_value(document),
            Err(e) => {
                log::error!("Bundled constants are invalid: {e}");
                Constants::from_value(Value::Object(Map::new()))
            }
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    #[cfg(test)]
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn supported_language_codes(&self) -> Vec<String> {
        self.languages.iter().map(|lang| lang.code.clone()).collect()
    }
}
