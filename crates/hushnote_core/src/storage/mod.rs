//! Whole-blob storage capability and its backends.
//!
//! # Responsibility
//! - Define the `Storage` contract consumed by persistence gateways.
//! - Provide file, SQLite and in-memory backends.
//!
//! # Invariants
//! - `write_all` replaces the named blob atomically: readers observe either
//!   the previous bytes or the new bytes, never a truncated mix.
//! - `read_all` reports a missing blob as `Ok(None)`, not as an error.
//! - Blob names are flat identifiers without path separators.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod file;
mod memory;
mod sqlite;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage backend failure.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Sqlite(DbError),
    /// Blob name is empty, a dot segment or contains a path separator.
    InvalidName(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "storage io failure: {err}"),
            Self::Sqlite(err) => write!(f, "storage sqlite failure: {err}"),
            Self::InvalidName(name) => write!(f, "invalid blob name `{name}`"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::InvalidName(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Sqlite(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(DbError::Sqlite(value))
    }
}

/// Named whole-blob storage.
pub trait Storage {
    /// Reads the full blob, or `None` when it was never written.
    fn read_all(&self, name: &str) -> StorageResult<Option<Vec<u8>>>;
    /// Atomically replaces the full blob.
    fn write_all(&self, name: &str, bytes: &[u8]) -> StorageResult<()>;
}

/// Backend selected at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AnyStorage {
    File(FileStorage),
    Sqlite(SqliteStorage),
    Memory(MemoryStorage),
}

impl AnyStorage {
    /// Short backend label used in log lines.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Sqlite(_) => "sqlite",
            Self::Memory(_) => "memory",
        }
    }
}

impl Storage for AnyStorage {
    fn read_all(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        match self {
            Self::File(storage) => storage.read_all(name),
            Self::Sqlite(storage) => storage.read_all(name),
            Self::Memory(storage) => storage.read_all(name),
        }
    }

    fn write_all(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        match self {
            Self::File(storage) => storage.write_all(name, bytes),
            Self::Sqlite(storage) => storage.write_all(name, bytes),
            Self::Memory(storage) => storage.write_all(name, bytes),
        }
    }
}

/// Rejects names that could escape a storage root.
pub(crate) fn validate_blob_name(name: &str) -> StorageResult<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
