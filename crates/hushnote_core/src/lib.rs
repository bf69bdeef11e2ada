//! Core domain logic for HushNote.
//! This crate is the single source of truth for note and access invariants.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod storage;

pub use access::authenticator::{
    AuthError, AuthPolicy, AuthReason, Authenticator, NoDeviceAuthenticator,
};
pub use access::session::{AccessSession, AppPhase, AuthTicket, SessionState};
pub use config::{ConfigError, CoreConfig, StorageBackend};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{
    Category, CategoryId, CategoryRef, CategorySelection, GENERAL_CATEGORY_ID,
};
pub use model::note::{Note, NoteId};
pub use repo::category_repo::{CategoryError, CategoryRepository};
pub use repo::gateway::{Gateway, GatewayError, CATEGORIES_BLOB, NOTES_BLOB};
pub use repo::note_repo::NoteRepository;
pub use search::query::{
    current_notes, filtered_notes, locked_notes, non_locked_notes, sorted_by_date, NoteQuery,
    NoteSubset, NotesTab,
};
pub use service::note_service::{NoteDraft, NoteService};
pub use storage::{AnyStorage, FileStorage, MemoryStorage, SqliteStorage, Storage, StorageError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
