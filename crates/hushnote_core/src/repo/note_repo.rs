//! Note repository: the authoritative in-memory note collection.
//!
//! # Responsibility
//! - Own the note collection and its create/update/delete invariants.
//! - Flush the whole collection through the persistence gateway after every
//!   mutation.
//! - Gate lock-status toggles behind the access session.
//!
//! # Invariants
//! - No two notes in the collection share an id.
//! - Id misses on update/delete are logged no-ops, never errors.
//! - Persistence failures are logged; the in-memory collection stays
//!   authoritative and is never rolled back.
//! - Log lines carry ids and counts only, never titles or contents.

use crate::access::authenticator::{AuthError, AuthReason, Authenticator};
use crate::access::session::AccessSession;
use crate::model::category::{CategoryId, CategoryRef};
use crate::model::note::{now_epoch_ms, Note, NoteId};
use crate::repo::gateway::{Gateway, NOTES_BLOB};
use crate::search::query::{compare_by_date, NoteSubset};
use crate::storage::Storage;
use log::{error, info, warn};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Clock used for `date` stamps, in Unix epoch milliseconds.
pub type Clock = fn() -> i64;

/// Owner of the note collection.
#[derive(Debug)]
pub struct NoteRepository<S: Storage> {
    gateway: Gateway<S>,
    notes: Vec<Note>,
    clock: Clock,
}

impl<S: Storage> NoteRepository<S> {
    /// Creates an empty repository over the default notes blob.
    ///
    /// Call [`NoteRepository::load`] to read persisted notes.
    pub fn new(storage: S) -> Self {
        Self::with_blob(storage, NOTES_BLOB)
    }

    pub fn with_blob(storage: S, blob: impl Into<String>) -> Self {
        Self {
            gateway: Gateway::new(storage, blob),
            notes: Vec::new(),
            clock: now_epoch_ms,
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Creates a repository over `blob` and loads persisted notes.
    pub fn open(storage: S, blob: impl Into<String>) -> Self {
        let mut repo = Self::with_blob(storage, blob);
        repo.load();
        repo
    }

    pub fn storage(&self) -> &S {
        self.gateway.storage()
    }

    /// All notes in collection order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, note_id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    /// Replaces the collection with the persisted one.
    ///
    /// Missing or unreadable blobs load as an empty collection. Records
    /// repeating an earlier id are dropped.
    pub fn load(&mut self) {
        let decoded = match self.gateway.load::<Note>() {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(
                    "event=notes_load module=repo status=error blob={} error={}",
                    self.gateway.blob(),
                    err
                );
                self.notes.clear();
                return;
            }
        };

        let mut seen = HashSet::with_capacity(decoded.records.len());
        let mut notes = decoded.records;
        let decoded_count = notes.len();
        notes.retain(|note| !note.id.is_nil() && seen.insert(note.id));
        info!(
            "event=notes_load module=repo status=ok count={} skipped={}",
            notes.len(),
            decoded.dropped + (decoded_count - notes.len())
        );
        self.notes = notes;
    }

    /// Writes the whole collection; `false` when the flush failed.
    pub fn save_all(&self) -> bool {
        match self.gateway.save(&self.notes) {
            Ok(()) => {
                info!(
                    "event=notes_save module=repo status=ok count={}",
                    self.notes.len()
                );
                true
            }
            Err(err) => {
                error!(
                    "event=notes_save module=repo status=error count={} error={}",
                    self.notes.len(),
                    err
                );
                false
            }
        }
    }

    /// Stores `note` as a new entry and returns the stored copy.
    ///
    /// A nil id is replaced by a generated one and `date` is stamped with the
    /// current time. An id already present overwrites that entry in place so
    /// the collection never holds duplicates.
    pub fn add(&mut self, mut note: Note) -> Note {
        if note.id.is_nil() {
            note.id = Uuid::new_v4();
        }
        note.date = (self.clock)();

        match self.position(note.id) {
            Some(index) => {
                warn!(
                    "event=note_add module=repo status=overwrite note_id={}",
                    note.id
                );
                self.notes[index] = note.clone();
            }
            None => self.notes.push(note.clone()),
        }
        self.save_all();
        note
    }

    /// Replaces the mutable fields of the stored note with `note`'s.
    ///
    /// Returns `false` (after logging) when no note has `note.id`.
    pub fn update(&mut self, note: &Note, updating_date: bool) -> bool {
        let Some(index) = self.position(note.id) else {
            warn!(
                "event=note_update module=repo status=not_found note_id={}",
                note.id
            );
            return false;
        };

        let now = (self.clock)();
        let stored = &mut self.notes[index];
        stored.title.clone_from(&note.title);
        stored.content.clone_from(&note.content);
        stored.is_locked = note.is_locked;
        stored.category.clone_from(&note.category);
        if updating_date {
            stored.date = now;
        }
        self.save_all();
        true
    }

    /// Removes the note with `note_id`; `false` when it was already gone.
    pub fn delete(&mut self, note_id: NoteId) -> bool {
        let Some(index) = self.position(note_id) else {
            warn!(
                "event=note_delete module=repo status=not_found note_id={}",
                note_id
            );
            return false;
        };
        self.notes.remove(index);
        self.save_all();
        true
    }

    /// Removes every listed id in one flush; returns how many were present.
    pub fn delete_many(&mut self, note_ids: &[NoteId]) -> usize {
        let doomed = note_ids.iter().copied().collect::<HashSet<_>>();
        let before = self.notes.len();
        self.notes.retain(|note| !doomed.contains(&note.id));
        let removed = before - self.notes.len();
        if removed > 0 {
            self.save_all();
        }
        removed
    }

    /// Removes positions of the date-sorted `subset` view.
    ///
    /// The subset is sorted, the offsets are dropped from it, and the
    /// collection is rebuilt as the remaining subset followed by the
    /// untouched complement. Out-of-range offsets are ignored. Returns the
    /// number of removed notes.
    pub fn remove_at_offsets(&mut self, offsets: &[usize], subset: NoteSubset) -> usize {
        let (mut selected, complement): (Vec<Note>, Vec<Note>) = std::mem::take(&mut self.notes)
            .into_iter()
            .partition(|note| subset.contains(note));
        selected.sort_by(compare_by_date);

        let doomed = offsets
            .iter()
            .copied()
            .filter(|offset| *offset < selected.len())
            .collect::<BTreeSet<_>>();

        self.notes = selected
            .into_iter()
            .enumerate()
            .filter(|(offset, _)| !doomed.contains(offset))
            .map(|(_, note)| note)
            .chain(complement)
            .collect();

        if !doomed.is_empty() {
            self.save_all();
        }
        doomed.len()
    }

    /// Toggles `is_locked` after a successful `ChangeLockStatus` request.
    ///
    /// Returns `Ok(true)` when a note was toggled and `Ok(false)` when the
    /// note disappeared meanwhile.
    ///
    /// # Errors
    /// - The classified authentication failure; nothing is mutated.
    pub fn update_lock_status<A>(
        &mut self,
        note_id: NoteId,
        session: &mut AccessSession,
        authenticator: &A,
    ) -> Result<bool, AuthError>
    where
        A: Authenticator + ?Sized,
    {
        session.authenticate(authenticator, AuthReason::ChangeLockStatus, || {})?;
        Ok(self.apply_lock_toggle(note_id, session))
    }

    /// Toggles `is_locked` by consuming a permission granted earlier.
    ///
    /// Without a granted permission nothing changes. The permission is
    /// consumed even when the note no longer exists.
    pub fn apply_lock_toggle(&mut self, note_id: NoteId, session: &mut AccessSession) -> bool {
        if !session.take_change_permission() {
            warn!(
                "event=note_lock_toggle module=repo status=denied note_id={}",
                note_id
            );
            return false;
        }

        let Some(index) = self.position(note_id) else {
            warn!(
                "event=note_lock_toggle module=repo status=not_found note_id={}",
                note_id
            );
            return false;
        };

        let stored = &mut self.notes[index];
        stored.is_locked = !stored.is_locked;
        info!(
            "event=note_lock_toggle module=repo status=ok note_id={} locked={}",
            note_id, stored.is_locked
        );
        self.save_all();
        true
    }

    /// Points notes tagged with `from` at `to`, refreshing the denormalized
    /// name and color. Returns the number of rewritten notes.
    pub fn reassign_category(&mut self, from: CategoryId, to: &CategoryRef) -> usize {
        let mut changed = 0;
        for note in &mut self.notes {
            if note.category.as_ref().is_some_and(|current| current.id == from) {
                note.category = Some(to.clone());
                changed += 1;
            }
        }
        if changed > 0 {
            self.save_all();
        }
        changed
    }

    fn position(&self, note_id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == note_id)
    }
}
