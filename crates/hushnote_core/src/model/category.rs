//! Category tagging model.
//!
//! # Responsibility
//! - Define category definitions and the reference stored on notes.
//! - Model "show all" as a selection variant instead of a fake category.
//!
//! # Invariants
//! - Exactly one reserved id (`GENERAL_CATEGORY_ID`) names the general
//!   category; it always exists and cannot be deleted.
//! - `CategorySelection::All` never collides with a real category id.
//! - Colors are stored as uppercase `#RRGGBB`.

use crate::model::note::Note;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color regex"));

/// Stable identifier for one category definition.
pub type CategoryId = Uuid;

/// Reserved id of the general category.
pub const GENERAL_CATEGORY_ID: CategoryId =
    Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);
/// Display name of the general category.
pub const GENERAL_CATEGORY_NAME: &str = "General";
/// Display color of the general category.
pub const GENERAL_CATEGORY_COLOR: &str = "#8E8E93";

/// User-defined category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "general_color")]
    pub color: String,
}

impl Category {
    /// The general category sentinel.
    pub fn general() -> Self {
        Self {
            id: GENERAL_CATEGORY_ID,
            name: GENERAL_CATEGORY_NAME.to_string(),
            color: GENERAL_CATEGORY_COLOR.to_string(),
        }
    }

    pub fn is_general(&self) -> bool {
        self.id == GENERAL_CATEGORY_ID
    }

    /// Denormalized reference embedded into notes.
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

/// Category reference stored on a note.
///
/// Name and color are copies so a notes blob renders without the categories
/// blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "general_color")]
    pub color: String,
}

/// Category filter applied on top of the tab/search views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategorySelection {
    /// No selection: every category is shown.
    #[default]
    All,
    /// Only notes tagged with this category.
    Only(CategoryId),
}

impl CategorySelection {
    /// Whether `note` passes this selection. Untagged notes count as general.
    pub fn matches(&self, note: &Note) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => note.category_id_or(GENERAL_CATEGORY_ID) == *id,
        }
    }
}

/// Normalizes a `#RRGGBB` color to uppercase; `None` when malformed.
pub fn normalize_color(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if HEX_COLOR_RE.is_match(trimmed) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        None
    }
}

fn general_color() -> String {
    GENERAL_CATEGORY_COLOR.to_string()
}
