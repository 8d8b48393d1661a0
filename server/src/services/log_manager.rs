// LogManager Service
// Append-only diagnostic log shared by every component

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use log::{LevelFilter, Log, Metadata, Record};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to access log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Process-wide log sink. The append handle is opened once and held for the
/// lifetime of the process; it is reopened if the file disappears underneath it.
pub struct LogManager {
    path: PathBuf,
    file: Mutex<Option<File>>,
    echo: bool,
}

impl LogManager {
    pub fn new(path: impl Into<PathBuf>, echo: bool) -> Self {
        let path = path.into();
        let file = open_append(&path).ok();
        Self {
            path,
            file: Mutex::new(file),
            echo,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `[timestamp] message` line. Never fails the caller.
    pub fn write(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let line = format!("[{}] {}\n", timestamp(), message);

        if let Ok(mut guard) = self.file.lock() {
            if guard.is_none() || !self.path.exists() {
                *guard = open_append(&self.path).ok();
            }
            if let Some(file) = guard.as_mut() {
                let _ = file.write_all(line.as_bytes());
            }
        }

        if self.echo {
            eprintln!("(log) >> {message}");
        }
    }

    /// Full current log content
    pub fn read(&self) -> Result<String, LogError> {
        let bytes = fs::read(&self.path).map_err(|source| LogError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Truncate the log. A failure is written to the log itself so it stays discoverable.
    pub fn clear(&self) {
        if let Err(e) = self.truncate() {
            self.write(format!("Failed to clear log file: {e}"));
        }
    }

    /// Truncate through a write handle; append-only handles cannot change the file length on every platform.
    fn truncate(&self) -> std::io::Result<()> {
        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        *guard = Some(open_append(&self.path)?);
        Ok(())
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Routes `log` macro records into the shared [`LogManager`].
struct LogBridge {
    inner: Arc<LogManager>,
    level: LevelFilter,
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.inner.write(format!(
            "{} {}: {}",
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

/// Install the log manager as the global `log` backend.
pub fn init_logger(log_manager: Arc<LogManager>) -> Result<(), log::SetLoggerError> {
    let bridge = LogBridge {
        inner: log_manager,
        level: LevelFilter::Info,
    };
    log::set_boxed_logger(Box::new(bridge))?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}
