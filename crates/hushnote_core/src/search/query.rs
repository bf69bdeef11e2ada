//! Derived note views: partition, date order, tab, category and text search.
//!
//! # Responsibility
//! - Recompute read-only views over the authoritative collection on demand.
//!
//! # Invariants
//! - Views borrow from the collection and never mutate or cache it.
//! - `locked` and `non-locked` views are disjoint and cover the collection.
//! - Date order is descending, ties broken by ascending id.
//! - An empty search string leaves the view unchanged; a non-empty one keeps
//!   exactly the notes whose title or content contains it, ignoring case.

use crate::model::category::CategorySelection;
use crate::model::note::Note;
use log::warn;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// One side of the private/public partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSubset {
    Locked,
    NonLocked,
}

impl NoteSubset {
    pub fn contains(self, note: &Note) -> bool {
        match self {
            Self::Locked => note.is_locked,
            Self::NonLocked => !note.is_locked,
        }
    }
}

/// Tab selected in the notes list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotesTab {
    #[default]
    Notes,
    Private,
}

impl NotesTab {
    pub fn subset(self) -> NoteSubset {
        match self {
            Self::Notes => NoteSubset::NonLocked,
            Self::Private => NoteSubset::Locked,
        }
    }
}

/// Newest first; equal dates fall back to id order.
pub fn compare_by_date(left: &Note, right: &Note) -> Ordering {
    right
        .date
        .cmp(&left.date)
        .then_with(|| left.id.cmp(&right.id))
}

pub fn locked_notes(notes: &[Note]) -> Vec<&Note> {
    subset_notes(notes, NoteSubset::Locked)
}

pub fn non_locked_notes(notes: &[Note]) -> Vec<&Note> {
    subset_notes(notes, NoteSubset::NonLocked)
}

/// Unsorted notes on one side of the partition, in collection order.
pub fn subset_notes(notes: &[Note], subset: NoteSubset) -> Vec<&Note> {
    notes.iter().filter(|note| subset.contains(note)).collect()
}

pub fn sorted_by_date<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<&'a Note> {
    let mut sorted = notes.into_iter().collect::<Vec<_>>();
    sorted.sort_by(|left, right| compare_by_date(left, right));
    sorted
}

/// Date-sorted partition selected by `tab`.
pub fn current_notes(notes: &[Note], tab: NotesTab) -> Vec<&Note> {
    sorted_by_date(subset_notes(notes, tab.subset()))
}

/// `current_notes` narrowed by a free-text search.
pub fn filtered_notes<'a>(notes: &'a [Note], tab: NotesTab, search: &str) -> Vec<&'a Note> {
    let matcher = TextMatcher::new(search);
    current_notes(notes, tab)
        .into_iter()
        .filter(|note| matcher.matches(note))
        .collect()
}

/// Case-insensitive literal substring matcher over title and content.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    mode: MatchMode,
}

#[derive(Debug, Clone)]
enum MatchMode {
    Everything,
    Pattern(Regex),
    Lowercase(String),
}

impl TextMatcher {
    pub fn new(search: &str) -> Self {
        if search.is_empty() {
            return Self {
                mode: MatchMode::Everything,
            };
        }

        let mode = match RegexBuilder::new(&regex::escape(search))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => MatchMode::Pattern(pattern),
            Err(err) => {
                // Only size limits can fail for an escaped literal.
                warn!(
                    "event=search_compile module=search status=fallback chars={} error={}",
                    search.chars().count(),
                    err
                );
                MatchMode::Lowercase(search.to_lowercase())
            }
        };
        Self { mode }
    }

    pub fn matches(&self, note: &Note) -> bool {
        match &self.mode {
            MatchMode::Everything => true,
            MatchMode::Pattern(pattern) => {
                pattern.is_match(&note.title) || pattern.is_match(&note.content)
            }
            MatchMode::Lowercase(needle) => {
                note.title.to_lowercase().contains(needle.as_str())
                    || note.content.to_lowercase().contains(needle.as_str())
            }
        }
    }
}

/// Full list query as driven by the notes screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub tab: NotesTab,
    pub search: String,
    pub category: CategorySelection,
}

impl NoteQuery {
    pub fn new(tab: NotesTab) -> Self {
        Self {
            tab,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: CategorySelection) -> Self {
        self.category = category;
        self
    }

    /// Offset removal is only meaningful while no search narrows the view.
    pub fn allows_removal(&self) -> bool {
        self.search.is_empty()
    }

    /// Evaluates tab, category and search filters in that order.
    pub fn apply<'a>(&self, notes: &'a [Note]) -> Vec<&'a Note> {
        let matcher = TextMatcher::new(&self.search);
        current_notes(notes, self.tab)
            .into_iter()
            .filter(|note| self.category.matches(note) && matcher.matches(note))
            .collect()
    }
}
