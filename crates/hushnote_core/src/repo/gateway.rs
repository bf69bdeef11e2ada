//! Persistence gateway: one JSON document per named blob.
//!
//! # Responsibility
//! - Encode a whole record collection into one blob and write it in one
//!   storage call.
//! - Decode defensively: unknown fields are ignored, missing fields take
//!   serde defaults, unreadable records are dropped individually.
//!
//! # Invariants
//! - A missing blob decodes as an empty collection.
//! - `save` never performs partial or segmented writes.

use crate::storage::{Storage, StorageError};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default blob holding the note collection.
pub const NOTES_BLOB: &str = "notes.json";
/// Default blob holding category definitions.
pub const CATEGORIES_BLOB: &str = "categories.json";

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure reading or writing one collection blob.
#[derive(Debug)]
pub enum GatewayError {
    Storage(StorageError),
    Encode(serde_json::Error),
    /// The blob exists but is not a JSON array.
    Decode(serde_json::Error),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode collection: {err}"),
            Self::Decode(err) => write!(f, "failed to decode collection: {err}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) | Self::Decode(err) => Some(err),
        }
    }
}

impl From<StorageError> for GatewayError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Decoded collection plus the count of records that had to be skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub dropped: usize,
}

/// Whole-collection codec bound to one blob name.
#[derive(Debug, Clone)]
pub struct Gateway<S: Storage> {
    storage: S,
    blob: String,
}

impl<S: Storage> Gateway<S> {
    pub fn new(storage: S, blob: impl Into<String>) -> Self {
        Self {
            storage,
            blob: blob.into(),
        }
    }

    pub fn blob(&self) -> &str {
        &self.blob
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Reads and decodes the whole collection.
    ///
    /// # Errors
    /// - `Storage` when the backend read fails.
    /// - `Decode` when the blob is not a JSON array at all.
    pub fn load<T: DeserializeOwned>(&self) -> GatewayResult<Decoded<T>> {
        let Some(bytes) = self.storage.read_all(&self.blob)? else {
            debug!(
                "event=blob_load module=gateway status=missing blob={}",
                self.blob
            );
            return Ok(Decoded {
                records: Vec::new(),
                dropped: 0,
            });
        };

        let raw: Vec<Value> = serde_json::from_slice(&bytes).map_err(GatewayError::Decode)?;
        let total = raw.len();
        let records = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(
                        "event=blob_load module=gateway status=skip blob={} index={} error={}",
                        self.blob, index, err
                    );
                    None
                }
            })
            .collect::<Vec<_>>();

        Ok(Decoded {
            dropped: total - records.len(),
            records,
        })
    }

    /// Encodes and writes the whole collection in one storage call.
    pub fn save<T: Serialize>(&self, records: &[T]) -> GatewayResult<()> {
        let bytes = serde_json::to_vec_pretty(records).map_err(GatewayError::Encode)?;
        self.storage.write_all(&self.blob, &bytes)?;
        Ok(())
    }
}
