//! Repository layer: authoritative in-memory collections and their gateway.
//!
//! # Responsibility
//! - Own the note and category collections.
//! - Persist each collection as one whole blob after every mutation.
//!
//! # Invariants
//! - Each repository is the sole writer of its blob.
//! - Lookup misses are non-fatal no-ops; persistence failures are logged.

pub mod category_repo;
pub mod gateway;
pub mod note_repo;
