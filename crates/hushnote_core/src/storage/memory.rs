//! In-process blob storage for previews and tests.

use super::{validate_blob_name, Storage, StorageResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Shared in-memory blob map. Clones observe the same blobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_blobs<T>(&self, f: impl FnOnce(&mut BTreeMap<String, Vec<u8>>) -> T) -> T {
        // Writes are single inserts; a poisoned map is still consistent.
        let mut guard = self
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl Storage for MemoryStorage {
    fn read_all(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_blob_name(name)?;
        Ok(self.with_blobs(|blobs| blobs.get(name).cloned()))
    }

    fn write_all(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        validate_blob_name(name)?;
        self.with_blobs(|blobs| blobs.insert(name.to_string(), bytes.to_vec()));
        Ok(())
    }
}
