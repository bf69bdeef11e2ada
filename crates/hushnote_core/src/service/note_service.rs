//! Note use-case service: the root object behind the notes screens.
//!
//! # Responsibility
//! - Own the note repository, the category repository and the access session.
//! - Apply visibility rules for private notes on every read and edit.
//! - Route lifecycle events and gated lock toggles.
//!
//! # Invariants
//! - Private notes are neither listed, returned nor editable while locked.
//! - Editing bumps `date` only when title or content actually change.
//! - Offset removal is refused while a search string narrows the view.

use crate::access::authenticator::{AuthError, AuthReason, Authenticator};
use crate::access::session::{AccessSession, AppPhase, AuthTicket};
use crate::model::category::{Category, CategoryId, CategorySelection, GENERAL_CATEGORY_ID};
use crate::model::note::{Note, NoteId};
use crate::repo::category_repo::{CategoryError, CategoryRepository};
use crate::repo::note_repo::NoteRepository;
use crate::search::query::{NoteQuery, NotesTab};
use crate::storage::Storage;
use log::{info, warn};

/// Input for [`NoteService::create_note`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub is_locked: bool,
    pub category: Option<CategoryId>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Root object owning notes, categories and session permissions.
#[derive(Debug)]
pub struct NoteService<S: Storage> {
    notes: NoteRepository<S>,
    categories: CategoryRepository<S>,
    session: AccessSession,
}

impl<S: Storage + Clone> NoteService<S> {
    /// Loads notes and categories from the named blobs of `storage`.
    pub fn open_with_blobs(storage: S, notes_blob: &str, categories_blob: &str) -> Self {
        let notes = NoteRepository::open(storage.clone(), notes_blob);
        let categories = CategoryRepository::open(storage, categories_blob);
        info!(
            "event=service_open module=service status=ok notes={} categories={}",
            notes.len(),
            categories.categories().len()
        );
        Self {
            notes,
            categories,
            session: AccessSession::new(),
        }
    }
}

impl<S: Storage> NoteService<S> {
    /// Builds a service from already constructed parts.
    pub fn from_parts(notes: NoteRepository<S>, categories: CategoryRepository<S>) -> Self {
        Self {
            notes,
            categories,
            session: AccessSession::new(),
        }
    }

    pub fn repository(&self) -> &NoteRepository<S> {
        &self.notes
    }

    pub fn session(&self) -> &AccessSession {
        &self.session
    }

    pub fn categories(&self) -> &[Category] {
        self.categories.categories()
    }

    /// Notes shown for `query`; the private tab is empty while locked.
    pub fn visible_notes(&self, query: &NoteQuery) -> Vec<&Note> {
        if query.tab == NotesTab::Private && !self.session.is_unlocked() {
            return Vec::new();
        }
        query.apply(self.notes.notes())
    }

    /// One note, unless it is private and the session is locked.
    pub fn note(&self, note_id: NoteId) -> Option<&Note> {
        self.notes
            .get(note_id)
            .filter(|note| self.is_readable(note))
    }

    /// Stores a new note built from `draft`.
    ///
    /// Unknown category ids leave the note untagged.
    pub fn create_note(&mut self, draft: NoteDraft) -> Note {
        let category = draft.category.and_then(|id| match self.categories.get(id) {
            Some(category) => Some(category.to_ref()),
            None => {
                warn!(
                    "event=note_create module=service status=unknown_category category_id={}",
                    id
                );
                None
            }
        });

        let mut note = Note::new(draft.title, draft.content).locked(draft.is_locked);
        note.category = category;
        self.notes.add(note)
    }

    /// Replaces title and content; `false` when missing or hidden.
    pub fn edit_note(
        &mut self,
        note_id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> bool {
        let Some(current) = self.note(note_id) else {
            warn!(
                "event=note_edit module=service status=unavailable note_id={}",
                note_id
            );
            return false;
        };

        let mut edited = current.clone();
        edited.title = title.into();
        edited.content = content.into();
        let changed = current.content_differs(&edited);
        self.notes.update(&edited, changed)
    }

    /// Re-tags a note without touching its date.
    ///
    /// `None` removes the tag. Returns `false` when the note is missing or
    /// hidden, or the category is unknown.
    pub fn set_note_category(&mut self, note_id: NoteId, category: Option<CategoryId>) -> bool {
        let category_ref = match category {
            Some(id) => match self.categories.get(id) {
                Some(category) => Some(category.to_ref()),
                None => return false,
            },
            None => None,
        };
        let Some(current) = self.note(note_id) else {
            return false;
        };

        let mut edited = current.clone();
        edited.category = category_ref;
        self.notes.update(&edited, false)
    }

    /// Deletes a note; `false` when missing or hidden.
    pub fn delete_note(&mut self, note_id: NoteId) -> bool {
        if self.note(note_id).is_none() {
            warn!(
                "event=note_delete module=service status=unavailable note_id={}",
                note_id
            );
            return false;
        }
        self.notes.delete(note_id)
    }

    /// Swipe-to-delete on the list produced by `query`.
    ///
    /// Returns the number of removed notes; `0` while a search is active or
    /// the requested tab is hidden.
    pub fn remove_at_offsets(&mut self, query: &NoteQuery, offsets: &[usize]) -> usize {
        if !query.allows_removal() {
            warn!("event=note_remove module=service status=refused cause=search_active");
            return 0;
        }
        if query.tab == NotesTab::Private && !self.session.is_unlocked() {
            warn!("event=note_remove module=service status=refused cause=locked");
            return 0;
        }
        if query.category == CategorySelection::All {
            return self.notes.remove_at_offsets(offsets, query.tab.subset());
        }

        let visible = self.visible_notes(query);
        let doomed = offsets
            .iter()
            .filter_map(|offset| visible.get(*offset).map(|note| note.id))
            .collect::<Vec<_>>();
        self.notes.delete_many(&doomed)
    }

    /// Unlocks private notes for this session.
    ///
    /// # Errors
    /// - The classified authentication failure; the session stays as it was.
    pub fn unlock<A>(&mut self, authenticator: &A) -> Result<(), AuthError>
    where
        A: Authenticator + ?Sized,
    {
        self.session
            .authenticate(authenticator, AuthReason::ViewNotes, || {})
    }

    /// Authenticates, then toggles the note's lock flag.
    ///
    /// # Errors
    /// - The classified authentication failure; the note is untouched.
    pub fn toggle_lock<A>(&mut self, note_id: NoteId, authenticator: &A) -> Result<bool, AuthError>
    where
        A: Authenticator + ?Sized,
    {
        self.notes
            .update_lock_status(note_id, &mut self.session, authenticator)
    }

    /// Starts an authentication whose prompt runs outside the core.
    pub fn begin_authentication(&mut self, reason: AuthReason) -> Result<AuthTicket, AuthError> {
        self.session.begin(reason)
    }

    /// Applies the outcome of an externally prompted authentication.
    pub fn complete_authentication(
        &mut self,
        ticket: AuthTicket,
        outcome: Result<(), AuthError>,
    ) -> Result<(), AuthError> {
        self.session.complete(ticket, outcome)
    }

    /// Toggles the note's lock flag using a permission granted earlier.
    pub fn apply_lock_toggle(&mut self, note_id: NoteId) -> bool {
        self.notes.apply_lock_toggle(note_id, &mut self.session)
    }

    pub fn lock(&mut self) {
        self.session.lock();
    }

    pub fn handle_phase(&mut self, phase: AppPhase) {
        self.session.handle_phase(phase);
    }

    pub fn add_category(&mut self, name: &str, color: &str) -> Result<Category, CategoryError> {
        self.categories.add(name, color)
    }

    /// Renames a category and refreshes the copies stored on notes.
    pub fn rename_category(
        &mut self,
        id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>, CategoryError> {
        let updated = self.categories.rename(id, name)?;
        if let Some(category) = &updated {
            self.notes.reassign_category(id, &category.to_ref());
        }
        Ok(updated)
    }

    /// Recolors a category and refreshes the copies stored on notes.
    pub fn recolor_category(
        &mut self,
        id: CategoryId,
        color: &str,
    ) -> Result<Option<Category>, CategoryError> {
        let updated = self.categories.recolor(id, color)?;
        if let Some(category) = &updated {
            self.notes.reassign_category(id, &category.to_ref());
        }
        Ok(updated)
    }

    /// Deletes a category and moves its notes to the general category.
    ///
    /// # Errors
    /// - `ProtectedCategory` for the general category.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<bool, CategoryError> {
        if !self.categories.delete(id)? {
            return Ok(false);
        }
        let general = self
            .categories
            .get(GENERAL_CATEGORY_ID)
            .map_or_else(|| Category::general().to_ref(), Category::to_ref);
        let moved = self.notes.reassign_category(id, &general);
        info!(
            "event=category_delete module=service status=ok category_id={} reassigned={}",
            id, moved
        );
        Ok(true)
    }

    fn is_readable(&self, note: &Note) -> bool {
        !note.is_locked || self.session.is_unlocked()
    }
}
