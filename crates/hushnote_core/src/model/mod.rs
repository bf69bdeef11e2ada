//! Domain model for notes and their category tags.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep persisted field names stable across builds.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is a hard removal from the collection; ids are never reused.

pub mod category;
pub mod note;
