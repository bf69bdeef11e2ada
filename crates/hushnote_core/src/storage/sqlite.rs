//! SQLite-backed blob storage.
//!
//! # Invariants
//! - One row per blob name in the `blobs` table.
//! - Each write is a single immediate transaction, so readers never see a
//!   partially replaced blob.

use super::{validate_blob_name, Storage, StorageResult};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Blob storage over a migrated SQLite connection.
///
/// Clones share one connection.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Every write runs inside a transaction that rolls back on drop.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for SqliteStorage {
    fn read_all(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_blob_name(name)?;
        let conn = self.conn();
        let bytes = conn
            .query_row(
                "SELECT data FROM blobs WHERE name = ?1;",
                [name],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(bytes)
    }

    fn write_all(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        validate_blob_name(name)?;
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO blobs (name, data, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(name) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at;",
            params![name, bytes],
        )?;
        tx.commit()?;
        debug!(
            "event=blob_write module=storage status=ok backend=sqlite blob={} bytes={}",
            name,
            bytes.len()
        );
        Ok(())
    }
}
