//! Category definitions repository.
//!
//! # Responsibility
//! - Own user-defined categories and persist them in their own blob.
//! - Guarantee the general category sentinel exists.
//!
//! # Invariants
//! - The general category is always present, first, and never deleted.
//! - Names are trimmed and non-empty; colors are uppercase `#RRGGBB`.

use crate::model::category::{normalize_color, Category, CategoryId, GENERAL_CATEGORY_ID};
use crate::repo::gateway::{Gateway, CATEGORIES_BLOB};
use crate::storage::Storage;
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Rejected category mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    /// The general category cannot be deleted.
    ProtectedCategory,
    InvalidName(String),
    InvalidColor(String),
}

impl Display for CategoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProtectedCategory => write!(f, "the general category cannot be deleted"),
            Self::InvalidName(value) => write!(f, "invalid category name: `{value}`"),
            Self::InvalidColor(value) => write!(f, "invalid category color: `{value}`"),
        }
    }
}

impl Error for CategoryError {}

/// Owner of category definitions.
#[derive(Debug)]
pub struct CategoryRepository<S: Storage> {
    gateway: Gateway<S>,
    categories: Vec<Category>,
}

impl<S: Storage> CategoryRepository<S> {
    /// Creates a repository holding only the general category.
    pub fn new(storage: S) -> Self {
        Self::with_blob(storage, CATEGORIES_BLOB)
    }

    pub fn with_blob(storage: S, blob: impl Into<String>) -> Self {
        Self {
            gateway: Gateway::new(storage, blob),
            categories: vec![Category::general()],
        }
    }

    pub fn open(storage: S, blob: impl Into<String>) -> Self {
        let mut repo = Self::with_blob(storage, blob);
        repo.load();
        repo
    }

    /// Replaces definitions with the persisted ones.
    ///
    /// Missing or unreadable blobs fall back to the general category alone.
    pub fn load(&mut self) {
        let records = match self.gateway.load::<Category>() {
            Ok(decoded) => decoded.records,
            Err(err) => {
                warn!(
                    "event=categories_load module=repo status=error blob={} error={}",
                    self.gateway.blob(),
                    err
                );
                Vec::new()
            }
        };

        let general = records
            .iter()
            .find(|category| category.is_general())
            .cloned()
            .unwrap_or_else(Category::general);
        let mut seen = HashSet::from([GENERAL_CATEGORY_ID]);
        let mut categories = vec![general];
        categories.extend(
            records
                .into_iter()
                .filter(|category| !category.id.is_nil() && seen.insert(category.id)),
        );
        info!(
            "event=categories_load module=repo status=ok count={}",
            categories.len()
        );
        self.categories = categories;
    }

    /// Writes all definitions; `false` when the flush failed.
    pub fn save_all(&self) -> bool {
        match self.gateway.save(&self.categories) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "event=categories_save module=repo status=error count={} error={}",
                    self.categories.len(),
                    err
                );
                false
            }
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Creates a category with a generated id.
    ///
    /// # Errors
    /// - `InvalidName` for blank names, `InvalidColor` for malformed colors.
    pub fn add(&mut self, name: &str, color: &str) -> Result<Category, CategoryError> {
        let category = Category {
            id: Uuid::new_v4(),
            name: normalize_name(name)?,
            color: normalize_color(color)
                .ok_or_else(|| CategoryError::InvalidColor(color.to_string()))?,
        };
        self.categories.push(category.clone());
        self.save_all();
        Ok(category)
    }

    /// Renames a category; `Ok(None)` when the id is unknown.
    pub fn rename(
        &mut self,
        id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>, CategoryError> {
        let name = normalize_name(name)?;
        self.modify(id, |category| category.name = name)
    }

    /// Recolors a category; `Ok(None)` when the id is unknown.
    pub fn recolor(
        &mut self,
        id: CategoryId,
        color: &str,
    ) -> Result<Option<Category>, CategoryError> {
        let color =
            normalize_color(color).ok_or_else(|| CategoryError::InvalidColor(color.to_string()))?;
        self.modify(id, |category| category.color = color)
    }

    /// Deletes a category; `Ok(false)` when it did not exist.
    ///
    /// # Errors
    /// - `ProtectedCategory` for the general category.
    pub fn delete(&mut self, id: CategoryId) -> Result<bool, CategoryError> {
        if id == GENERAL_CATEGORY_ID {
            return Err(CategoryError::ProtectedCategory);
        }
        let before = self.categories.len();
        self.categories.retain(|category| category.id != id);
        if self.categories.len() == before {
            warn!(
                "event=category_delete module=repo status=not_found category_id={}",
                id
            );
            return Ok(false);
        }
        self.save_all();
        Ok(true)
    }

    fn modify(
        &mut self,
        id: CategoryId,
        apply: impl FnOnce(&mut Category),
    ) -> Result<Option<Category>, CategoryError> {
        let Some(category) = self.categories.iter_mut().find(|category| category.id == id) else {
            warn!(
                "event=category_update module=repo status=not_found category_id={}",
                id
            );
            return Ok(None);
        };
        apply(category);
        let updated = category.clone();
        self.save_all();
        Ok(Some(updated))
    }
}

fn normalize_name(name: &str) -> Result<String, CategoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CategoryError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}
