//! Directory-backed blob storage.
//!
//! Each blob is one file under the storage root. Writes go to a temporary
//! file in the same directory, are synced, then renamed over the target so
//! a crash never leaves a truncated blob behind. The directory is synced
//! after the rename so the new entry itself is durable.

use super::{validate_blob_name, Storage, StorageResult};
use log::{debug, error};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File-per-blob storage rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens storage at `root`, creating the directory when missing.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of one blob.
    pub fn blob_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_blob_name(name)?;
        Ok(self.root.join(name))
    }
}

impl Storage for FileStorage {
    fn read_all(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.blob_path(name)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        let path = self.blob_path(name)?;
        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(&path).map_err(|err| {
            error!(
                "event=blob_write module=storage status=error backend=file blob={} error={}",
                name, err.error
            );
            err.error
        })?;
        sync_dir(&self.root)?;
        debug!(
            "event=blob_write module=storage status=ok backend=file blob={} bytes={}",
            name,
            bytes.len()
        );
        Ok(())
    }
}

/// Flushes directory entries of `dir` to disk.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

// Directory handles cannot be opened for syncing on other platforms.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{sync_dir, FileStorage};
    use crate::storage::Storage;

    #[test]
    fn missing_blob_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path()).expect("open storage");
        assert!(storage.read_all("notes.json").expect("read").is_none());
    }

    #[test]
    fn write_replaces_previous_content_without_leftovers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path().join("nested")).expect("open storage");

        storage.write_all("notes.json", b"first version, longer").expect("write");
        storage.write_all("notes.json", b"second").expect("rewrite");

        let bytes = storage.read_all("notes.json").expect("read").expect("present");
        assert_eq!(bytes, b"second");

        let entries = std::fs::read_dir(storage.root())
            .expect("list root")
            .count();
        assert_eq!(entries, 1, "temporary files must not survive a write");
    }

    #[test]
    fn directory_sync_succeeds_on_the_storage_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path()).expect("open storage");
        storage.write_all("notes.json", b"[]").expect("write");
        sync_dir(storage.root()).expect("sync root directory");
    }

    #[test]
    fn directory_sync_reports_a_missing_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("gone");
        if cfg!(unix) {
            assert!(sync_dir(&missing).is_err());
        } else {
            assert!(sync_dir(&missing).is_ok());
        }
    }
}
