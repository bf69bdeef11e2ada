//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve the data directory, storage backend, blob names and log level.
//! - Open the configured storage backend.
//!
//! # Invariants
//! - `data_dir` is always absolute.
//! - Environment overrides are trimmed; blank values count as unset.

use crate::logging::default_log_level;
use crate::repo::gateway::{CATEGORIES_BLOB, NOTES_BLOB};
use crate::storage::{AnyStorage, FileStorage, SqliteStorage, StorageResult};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Overrides the data directory.
pub const ENV_DATA_DIR: &str = "HUSHNOTE_DATA_DIR";
/// Selects the storage backend (`file` or `sqlite`).
pub const ENV_STORAGE: &str = "HUSHNOTE_STORAGE";
/// Overrides the log level.
pub const ENV_LOG_LEVEL: &str = "HUSHNOTE_LOG_LEVEL";

const DEFAULT_DIR_NAME: &str = "hushnote";
const SQLITE_FILE_NAME: &str = "hushnote.sqlite3";
const LOG_DIR_NAME: &str = "logs";

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// One JSON file per blob.
    #[default]
    File,
    /// One SQLite database holding every blob.
    Sqlite,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "sqlite" | "db" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedBackend(String),
    RelativeDataDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedBackend(value) => {
                write!(f, "unsupported storage backend `{value}`; expected file|sqlite")
            }
            Self::RelativeDataDir(path) => {
                write!(f, "data dir must be an absolute path, got `{}`", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub storage_backend: StorageBackend,
    pub notes_blob: String,
    pub categories_blob: String,
    pub log_level: String,
}

impl CoreConfig {
    /// Defaults rooted at `data_dir`.
    ///
    /// # Errors
    /// - `RelativeDataDir` when `data_dir` is not absolute.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data_dir = data_dir.as_ref();
        if !data_dir.is_absolute() {
            return Err(ConfigError::RelativeDataDir(data_dir.to_path_buf()));
        }
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            storage_backend: StorageBackend::default(),
            notes_blob: NOTES_BLOB.to_string(),
            categories_blob: CATEGORIES_BLOB.to_string(),
            log_level: default_log_level().to_string(),
        })
    }

    /// Reads overrides from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = read(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DIR_NAME));
        let mut config = Self::new(data_dir)?;
        if let Some(backend) = read(ENV_STORAGE) {
            config.storage_backend = StorageBackend::parse(&backend)?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        Ok(config)
    }

    /// Directory for rolling log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    /// Opens the configured backend, creating `data_dir` when needed.
    pub fn open_storage(&self) -> StorageResult<AnyStorage> {
        match self.storage_backend {
            StorageBackend::File => Ok(AnyStorage::File(FileStorage::new(&self.data_dir)?)),
            StorageBackend::Sqlite => {
                std::fs::create_dir_all(&self.data_dir)?;
                let path = self.data_dir.join(SQLITE_FILE_NAME);
                Ok(AnyStorage::Sqlite(SqliteStorage::open(path)?))
            }
        }
    }
}
