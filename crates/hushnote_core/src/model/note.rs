//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record owned by the note repository.
//! - Provide timestamp helpers shared by repository write paths.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `date` only moves on content-changing edits, never on field touches.
//! - `is_locked` is the source of truth for private-space membership.

use crate::model::category::{CategoryId, CategoryRef};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for one note.
pub type NoteId = Uuid;

/// Canonical note record.
///
/// Persisted as one element of the notes blob. Every field except `id` has a
/// serde default so blobs written by older builds still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Stable id assigned at creation.
    pub id: NoteId,
    /// Private-space membership flag.
    #[serde(default)]
    pub is_locked: bool,
    /// Last-modified time in Unix epoch milliseconds.
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Optional category tag with denormalized display fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
}

impl Note {
    /// Creates an unlocked note with a generated id and the current time.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, content)
    }

    /// Creates a note with a caller-provided id.
    ///
    /// A nil id is replaced by a generated one when the note is added to the
    /// repository.
    pub fn with_id(id: NoteId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            is_locked: false,
            date: now_epoch_ms(),
            title: title.into(),
            content: content.into(),
            category: None,
        }
    }

    /// Returns the same note with `is_locked` set.
    pub fn locked(mut self, is_locked: bool) -> Self {
        self.is_locked = is_locked;
        self
    }

    /// Returns the same note tagged with `category`.
    pub fn in_category(mut self, category: CategoryRef) -> Self {
        self.category = Some(category);
        self
    }

    /// Category id used for filtering; untagged notes count as `fallback`.
    pub fn category_id_or(&self, fallback: CategoryId) -> CategoryId {
        self.category
            .as_ref()
            .map_or(fallback, |category| category.id)
    }

    /// Whether title or content differ from `other`.
    pub fn content_differs(&self, other: &Note) -> bool {
        self.title != other.title || self.content != other.content
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Clocks set before 1970 collapse to `0` instead of failing.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
