// SettingsManager Service
// Key/value settings persisted to disk with default-on-read

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::models::DefaultCatalog;
use crate::services::LogManager;

/// The persisted key -> value document
pub type Document = Map<String, Value>;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings document is not a JSON object")]
    NotAnObject,

    #[error("Unknown setting: {0}")]
    UnknownKey(String),
}

/// Owns the settings document and is the only writer of the settings file
pub struct SettingsManager {
    settings_path: PathBuf,
    defaults: DefaultCatalog,
    document: Document,
    /// A default applied during `get` could not be persisted
    dirty: bool,
    log: Arc<LogManager>,
}

impl SettingsManager {
    pub fn new(settings_path: PathBuf, defaults: DefaultCatalog, log: Arc<LogManager>) -> Self {
        Self {
            settings_path,
            defaults,
            document: Document::new(),
            dirty: false,
            log,
        }
    }

    /// Read the document from disk, degrading to an empty one on failure
    pub fn load(&mut self) {
        self.document = match self.read() {
            Ok(document) => document,
            Err(e) => {
                self.log.write(format!(
                    "Failed to read settings from {}: {e}",
                    self.settings_path.display()
                ));
                Document::new()
            }
        };
        self.dirty = false;
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Deserialize the on-disk document. A missing or blank file is an empty document.
    pub fn read(&self) -> Result<Document, SettingsError> {
        if !self.settings_path.exists() {
            return Ok(Document::new());
        }

        let content = fs::read_to_string(&self.settings_path)?;
        if content.trim().is_empty() {
            return Ok(Document::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(SettingsError::NotAnObject),
        }
    }

    /// Replace the whole document on disk and in memory. Memory only changes once the file is persisted.
    pub fn write(&mut self, document: Document) -> Result<(), SettingsError> {
        self.persist(&document)?;
        self.document = document;
        self.dirty = false;
        Ok(())
    }

    /// Readers see either the old or the new file, never a partial one.
    fn persist(&self, document: &Document) -> Result<(), SettingsError> {
        let parent = self
            .settings_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let content = serde_json::to_string_pretty(document)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.settings_path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Stored value, or the catalog default written back and persisted
    pub fn get(&mut self, key: &str) -> Result<Value, SettingsError> {
        if let Some(value) = self.document.get(key).filter(|value| !value.is_null()) {
            return Ok(value.clone());
        }

        let default = self
            .defaults
            .get(key)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;

        self.log.write(format!(
            "Setting \"{key}\" not found. Writing default value: {default}"
        ));
        self.document.insert(key.to_string(), default.clone());

        match self.persist(&self.document) {
            Ok(()) => self.dirty = false,
            Err(e) => {
                self.dirty = true;
                self.log.write(format!("Failed to save settings: {e}"));
            }
        }

        Ok(default)
    }

    /// Update one key and persist. The in-memory change is undone if persisting fails.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let previous = self.document.insert(key.to_string(), value.clone());

        if let Err(e) = self.persist(&self.document) {
            match previous {
                Some(previous) => self.document.insert(key.to_string(), previous),
                None => self.document.remove(key),
            };
            return Err(e);
        }

        self.dirty = false;
        self.log.write(format!("Setting \"{key}\" updated to: {value}"));
        Ok(())
    }

    /// Forget every stored value; later reads repopulate from defaults
    pub fn reset(&mut self) -> Result<(), SettingsError> {
        let previous = std::mem::take(&mut self.document);

        if let Err(e) = self.persist(&self.document) {
            self.document = previous;
            self.log.write(format!("Failed to reset settings: {e}"));
            return Err(e);
        }

        self.dirty = false;
        self.log.write("Settings reset to defaults");
        Ok(())
    }

    /// Persist defaults that were applied while the disk was unwritable
    pub fn flush(&mut self) -> Result<(), SettingsError> {
        if !self.dirty {
            return Ok(());
        }
        self.persist(&self.document)?;
        self.dirty = false;
        Ok(())
    }

    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn catalog() -> DefaultCatalog {
        let mut values = Map::new();
        values.insert("language".to_string(), json!("system"));
        values.insert("wallpaper".to_string(), json!(""));
        values.insert("autoColors".to_string(), json!(true));
        DefaultCatalog::new(values)
    }

    fn manager(temp: &TempDir) -> (SettingsManager, Arc<LogManager>) {
        let log = Arc::new(LogManager::new(temp.path().join("app.log"), false));
        let mut manager =
            SettingsManager::new(temp.path().join("settings.json"), catalog(), log.clone());
        manager.load();
        (manager, log)
    }

    fn on_disk(manager: &SettingsManager) -> Value {
        serde_json::from_str(&fs::read_to_string(manager.path()).unwrap()).unwrap()
    }

    #[test]
    fn test_get_applies_and_persists_default() {
        let temp = tempdir().unwrap();
        let (mut manager, log) = manager(&temp);

        for key in ["language", "wallpaper", "autoColors"] {
            let value = manager.get(key).unwrap();
            assert_eq!(Some(&value), catalog().get(key));
            assert_eq!(manager.document().get(key), Some(&value));
        }

        assert_eq!(
            on_disk(&manager),
            json!({ "language": "system", "wallpaper": "", "autoColors": true })
        );
        assert!(log.read().unwrap().contains("Setting \"language\" not found"));
    }

    #[test]
    fn test_empty_file_get_language_writes_minimal_document() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("settings.json"), "").unwrap();
        let (mut manager, _log) = manager(&temp);

        assert_eq!(manager.get("language").unwrap(), json!("system"));
        assert_eq!(on_disk(&manager), json!({ "language": "system" }));
    }

    #[test]
    fn test_unknown_key_is_error_and_does_not_mutate() {
        let temp = tempdir().unwrap();
        let (mut manager, _log) = manager(&temp);

        let result = manager.get("nope");
        assert!(matches!(result, Err(SettingsError::UnknownKey(ref key)) if key == "nope"));
        assert!(manager.document().is_empty());
        assert!(!manager.path().exists());
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let temp = tempdir().unwrap();
        let (mut manager, _log) = manager(&temp);

        let mut document = Document::new();
        document.insert("language".to_string(), json!("es"));
        document.insert("volume".to_string(), json!(0.5));
        document.insert("window".to_string(), json!({ "width": 400, "height": 360 }));

        manager.write(document.clone()).unwrap();
        assert_eq!(manager.read().unwrap(), document);
    }

    #[test]
    fn test_write_is_visible_to_get_and_survives_later_sets() {
        let temp = tempdir().unwrap();
        let (mut manager, _log) = manager(&temp);
        manager.get("language").unwrap();

        let mut document = Document::new();
        document.insert("language".to_string(), json!("es"));
        manager.write(document).unwrap();

        assert_eq!(manager.get("language").unwrap(), json!("es"));
        manager.set("wallpaper", json!("/img/b.png")).unwrap();
        assert_eq!(
            on_disk(&manager),
            json!({ "language": "es", "wallpaper": "/img/b.png" })
        );
    }

    #[test]
    fn test_failed_write_keeps_memory() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let log = Arc::new(LogManager::new(temp.path().join("app.log"), false));
        let mut manager = SettingsManager::new(blocker.join("settings.json"), catalog(), log);

        let mut document = Document::new();
        document.insert("language".to_string(), json!("es"));
        assert!(manager.write(document).is_err());
        assert!(manager.document().is_empty());
    }

    #[test]
    fn test_set_then_get_skips_catalog() {
        let temp = tempdir().unwrap();
        let (mut manager, log) = manager(&temp);

        manager.set("wallpaper", json!("/img/a.png")).unwrap();
        assert_eq!(manager.get("wallpaper").unwrap(), json!("/img/a.png"));

        let content = log.read().unwrap();
        assert!(content.contains("Setting \"wallpaper\" updated to: \"/img/a.png\""));
        assert!(!content.contains("Setting \"wallpaper\" not found"));
    }

    #[test]
    fn test_falsy_values_are_kept() {
        let temp = tempdir().unwrap();
        let (mut manager, _log) = manager(&temp);

        manager.set("autoColors", json!(false)).unwrap();
        assert_eq!(manager.get("autoColors").unwrap(), json!(false));
    }

    #[test]
    fn test_reset_then_get_reproduces_default() {
        let temp = tempdir().unwrap();
        let (mut manager, _log) = manager(&temp);
        manager.set("language", json!("es")).unwrap();

        manager.reset().unwrap();
        assert_eq!(on_disk(&manager), json!({}));
        assert_eq!(manager.get("language").unwrap(), json!("system"));

        manager.reset().unwrap();
        assert_eq!(manager.get("language").unwrap(), json!("system"));
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_logs() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("settings.json"), "{ not json").unwrap();
        let (manager, log) = manager(&temp);

        assert!(manager.read().is_err());
        assert!(manager.document().is_empty());
        assert!(log.read().unwrap().contains("Failed to read settings"));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("settings.json"), "[1, 2]").unwrap();
        let (manager, _log) = manager(&temp);

        assert!(matches!(manager.read(), Err(SettingsError::NotAnObject)));
    }

    #[test]
    fn test_failed_set_rolls_back_memory() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let log = Arc::new(LogManager::new(temp.path().join("app.log"), false));
        let mut manager = SettingsManager::new(blocker.join("settings.json"), catalog(), log);

        assert!(manager.set("wallpaper", json!("/img/a.png")).is_err());
        assert!(manager.document().get("wallpaper").is_none());
    }

    #[test]
    fn test_failed_default_write_marks_dirty() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let log = Arc::new(LogManager::new(temp.path().join("app.log"), false));
        let mut manager =
            SettingsManager::new(blocker.join("settings.json"), catalog(), log.clone());

        assert_eq!(manager.get("language").unwrap(), json!("system"));
        assert!(manager.is_dirty());
        assert!(manager.flush().is_err());
        assert!(log.read().unwrap().contains("Failed to save settings"));
    }

    #[test]
    fn test_flush_is_noop_when_clean() {
        let temp = tempdir().unwrap();
        let (mut manager, _log) = manager(&temp);

        manager.flush().unwrap();
        assert!(!manager.path().exists());
    }
}
