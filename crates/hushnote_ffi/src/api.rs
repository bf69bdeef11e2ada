//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide `NoteService` and serialize access to it.
//! - Bridge the Dart-side `local_auth` prompt through the two-phase
//!   authentication API.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every fallible call returns an envelope with `ok` and `message`.
//! - Private notes never cross the boundary while the session is locked.

use hushnote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AnyStorage, AppPhase, AuthError, AuthReason, Category, CategorySelection, CoreConfig, Note,
    NoteDraft, NoteQuery, NoteService, NotesTab, SessionState, StorageBackend,
};
use log::{info, warn};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

static NOTE_SERVICE: Mutex<Option<NoteService<AnyStorage>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Note projection returned to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub note_id: String,
    pub title: String,
    pub content: String,
    pub is_locked: bool,
    /// Last-modified time in epoch milliseconds.
    pub date_epoch_ms: i64,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

/// Category projection returned to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryItem {
    pub category_id: String,
    pub name: String,
    pub color: String,
    pub is_general: bool,
}

/// Response of `notes_open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenResponse {
    pub ok: bool,
    /// Number of notes loaded, private ones included.
    pub note_count: u32,
    /// Active backend label (`file|sqlite`).
    pub backend: String,
    pub message: String,
}

/// List response for one notes screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListResponse {
    pub ok: bool,
    pub items: Vec<NoteItem>,
    /// `true` when the private tab was requested while locked.
    pub requires_unlock: bool,
    pub message: String,
}

/// Generic action response envelope for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    pub ok: bool,
    pub note_id: Option<String>,
    pub message: String,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note_id: String) -> Self {
        Self {
            ok: true,
            note_id: Some(note_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
        }
    }
}

/// Response of `notes_remove_at_offsets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveResponse {
    pub ok: bool,
    pub removed: u32,
    pub message: String,
}

/// Category list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListResponse {
    pub ok: bool,
    pub items: Vec<CategoryItem>,
    pub message: String,
}

/// Category action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryActionResponse {
    pub ok: bool,
    pub category_id: Option<String>,
    pub message: String,
}

/// Response of `session_begin_auth`.
///
/// On success Dart runs the device prompt with `prompt` as the localized
/// reason and reports the outcome through `session_complete_auth(ticket, ..)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthBeginResponse {
    pub ok: bool,
    pub ticket: Option<u64>,
    pub prompt: Option<String>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Session snapshot returned by every session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub ok: bool,
    pub is_unlocked: bool,
    pub are_changes_allowed: bool,
    /// `locked|authenticating|unlocked`.
    pub state: String,
    pub pending_ticket: Option<u64>,
    /// Code of the last recorded authentication failure.
    pub error_code: Option<String>,
    /// `true` when the last failure needs a device settings change.
    pub error_blocking: bool,
    pub message: String,
}

impl SessionStatus {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            is_unlocked: false,
            are_changes_allowed: false,
            state: "locked".to_string(),
            pending_ticket: None,
            error_code: None,
            error_blocking: false,
            message: message.into(),
        }
    }
}

/// Opens (or reopens) the note store at `data_dir`.
///
/// Input semantics:
/// - `data_dir`: absolute directory; blank falls back to `HUSHNOTE_DATA_DIR`
///   or the temp directory.
/// - `backend`: `file|sqlite`; `None` uses `HUSHNOTE_STORAGE` or `file`.
///
/// # FFI contract
/// - Reopening replaces the previous store and resets the session to locked.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_open(data_dir: String, backend: Option<String>) -> OpenResponse {
    let failure = |message: String| OpenResponse {
        ok: false,
        note_count: 0,
        backend: String::new(),
        message,
    };

    let config = match resolve_config(data_dir.trim(), backend.as_deref()) {
        Ok(config) => config,
        Err(err) => return failure(format!("notes_open failed: {err}")),
    };
    let service = match open_service(&config) {
        Ok(service) => service,
        Err(err) => return failure(format!("notes_open failed: {err}")),
    };

    let note_count = count_u32(service.repository().len());
    let backend = service.repository().storage().backend_name().to_string();
    *lock_service() = Some(service);
    OpenResponse {
        ok: true,
        note_count,
        backend,
        message: format!("Opened {note_count} note(s)."),
    }
}

/// Lists notes for one screen.
///
/// Input semantics:
/// - `private_tab`: `true` selects locked notes, `false` the public ones.
/// - `search`: case-insensitive text filter; empty shows everything.
/// - `category_id`: optional category filter; `None` shows all categories.
///
/// # FFI contract
/// - Items are sorted newest first.
/// - The private tab is empty with `requires_unlock=true` while locked.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list(
    private_tab: bool,
    search: String,
    category_id: Option<String>,
) -> NoteListResponse {
    let failure = |message: String| NoteListResponse {
        ok: false,
        items: Vec::new(),
        requires_unlock: false,
        message,
    };

    let query = match build_query(private_tab, search, category_id.as_deref()) {
        Ok(query) => query,
        Err(err) => return failure(format!("notes_list failed: {err}")),
    };

    let result = with_service(|service| {
        let requires_unlock = query.tab == NotesTab::Private && !service.session().is_unlocked();
        let items = service
            .visible_notes(&query)
            .into_iter()
            .map(to_note_item)
            .collect::<Vec<_>>();
        (items, requires_unlock)
    });

    match result {
        Ok((items, requires_unlock)) => {
            let message = if requires_unlock {
                "Unlock to view private notes.".to_string()
            } else if items.is_empty() {
                "No notes.".to_string()
            } else {
                format!("{} note(s).", items.len())
            };
            NoteListResponse {
                ok: true,
                items,
                requires_unlock,
                message,
            }
        }
        Err(err) => failure(format!("notes_list failed: {err}")),
    }
}

/// Creates a note.
///
/// Unknown category ids leave the note untagged.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_create(
    title: String,
    content: String,
    is_locked: bool,
    category_id: Option<String>,
) -> NoteActionResponse {
    let category = match parse_optional_id(category_id.as_deref(), "category_id") {
        Ok(category) => category,
        Err(err) => return NoteActionResponse::failure(format!("notes_create failed: {err}")),
    };
    let draft = NoteDraft {
        title,
        content,
        is_locked,
        category,
    };

    match with_service(|service| service.create_note(draft)) {
        Ok(note) => NoteActionResponse::success("Note created.", note.id.to_string()),
        Err(err) => NoteActionResponse::failure(format!("notes_create failed: {err}")),
    }
}

/// Replaces title and content of one note.
///
/// # FFI contract
/// - The note date moves only when the text actually changed.
/// - Private notes cannot be edited while locked.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_update(note_id: String, title: String, content: String) -> NoteActionResponse {
    note_action("notes_update", &note_id, "Note updated.", |service, id| {
        service.edit_note(id, title, content)
    })
}

/// Moves one note to a category; `None` removes the tag.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_set_category(note_id: String, category_id: Option<String>) -> NoteActionResponse {
    let category = match parse_optional_id(category_id.as_deref(), "category_id") {
        Ok(category) => category,
        Err(err) => {
            return NoteActionResponse::failure(format!("notes_set_category failed: {err}"))
        }
    };
    note_action(
        "notes_set_category",
        &note_id,
        "Note category updated.",
        |service, id| service.set_note_category(id, category),
    )
}

/// Deletes one note.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_delete(note_id: String) -> NoteActionResponse {
    note_action("notes_delete", &note_id, "Note deleted.", |service, id| {
        service.delete_note(id)
    })
}

/// Swipe-to-delete on the list returned by `notes_list` with the same
/// arguments.
///
/// # FFI contract
/// - Offsets index the sorted, filtered list; out-of-range ones are ignored.
/// - Nothing is removed while `search` is non-empty.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_remove_at_offsets(
    private_tab: bool,
    search: String,
    category_id: Option<String>,
    offsets: Vec<u32>,
) -> RemoveResponse {
    let failure = |message: String| RemoveResponse {
        ok: false,
        removed: 0,
        message,
    };

    let query = match build_query(private_tab, search, category_id.as_deref()) {
        Ok(query) => query,
        Err(err) => return failure(format!("notes_remove_at_offsets failed: {err}")),
    };
    if !query.allows_removal() {
        return failure("Clear the search to delete notes.".to_string());
    }

    let offsets = offsets
        .into_iter()
        .map(|offset| offset as usize)
        .collect::<Vec<_>>();
    match with_service(|service| service.remove_at_offsets(&query, &offsets)) {
        Ok(removed) => RemoveResponse {
            ok: true,
            removed: count_u32(removed),
            message: format!("Removed {removed} note(s)."),
        },
        Err(err) => failure(format!("notes_remove_at_offsets failed: {err}")),
    }
}

/// Toggles the lock flag of one note.
///
/// Requires a successful `change_lock_status` authentication completed
/// through `session_begin_auth`/`session_complete_auth`; the permission is
/// consumed by this call.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_toggle_lock(note_id: String) -> NoteActionResponse {
    let id = match parse_id(&note_id, "note_id") {
        Ok(id) => id,
        Err(err) => {
            return NoteActionResponse::failure(format!("notes_toggle_lock failed: {err}"))
        }
    };

    let result = with_service(|service| {
        if !service.session().are_changes_allowed() {
            return Err("Authenticate to change the lock status first.".to_string());
        }
        if service.apply_lock_toggle(id) {
            Ok(())
        } else {
            Err("Note not found.".to_string())
        }
    });

    match result {
        Ok(Ok(())) => NoteActionResponse::success("Lock status changed.", id.to_string()),
        Ok(Err(message)) => NoteActionResponse::failure(message),
        Err(err) => NoteActionResponse::failure(format!("notes_toggle_lock failed: {err}")),
    }
}

/// Lists category definitions; the general category comes first.
#[flutter_rust_bridge::frb(sync)]
pub fn categories_list() -> CategoryListResponse {
    match with_service(|service| {
        service
            .categories()
            .iter()
            .map(to_category_item)
            .collect::<Vec<_>>()
    }) {
        Ok(items) => CategoryListResponse {
            ok: true,
            message: format!("{} category(ies).", items.len()),
            items,
        },
        Err(err) => CategoryListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("categories_list failed: {err}"),
        },
    }
}

/// Creates a category; `color` is `#RRGGBB`.
#[flutter_rust_bridge::frb(sync)]
pub fn categories_create(name: String, color: String) -> CategoryActionResponse {
    match with_service(|service| service.add_category(&name, &color)) {
        Ok(Ok(category)) => CategoryActionResponse {
            ok: true,
            category_id: Some(category.id.to_string()),
            message: "Category created.".to_string(),
        },
        Ok(Err(err)) => category_failure("categories_create", err),
        Err(err) => category_failure("categories_create", err),
    }
}

/// Deletes a category and moves its notes to the general category.
#[flutter_rust_bridge::frb(sync)]
pub fn categories_delete(category_id: String) -> CategoryActionResponse {
    let id = match parse_id(&category_id, "category_id") {
        Ok(id) => id,
        Err(err) => return category_failure("categories_delete", err),
    };
    match with_service(|service| service.delete_category(id)) {
        Ok(Ok(true)) => CategoryActionResponse {
            ok: true,
            category_id: Some(id.to_string()),
            message: "Category deleted.".to_string(),
        },
        Ok(Ok(false)) => category_failure("categories_delete", "category not found"),
        Ok(Err(err)) => category_failure("categories_delete", err),
        Err(err) => category_failure("categories_delete", err),
    }
}

/// Starts an authentication request.
///
/// Input semantics:
/// - `reason`: `view_notes|change_lock_status`.
///
/// # FFI contract
/// - Fails with `busy` while another request is pending.
#[flutter_rust_bridge::frb(sync)]
pub fn session_begin_auth(reason: String) -> AuthBeginResponse {
    let failure = |error_code: Option<&str>, message: String| AuthBeginResponse {
        ok: false,
        ticket: None,
        prompt: None,
        error_code: error_code.map(str::to_string),
        message,
    };

    let Some(reason) = AuthReason::parse(&reason) else {
        return failure(
            None,
            format!("session_begin_auth failed: unsupported reason `{}`", reason.trim()),
        );
    };

    match with_service(|service| service.begin_authentication(reason)) {
        Ok(Ok(ticket)) => AuthBeginResponse {
            ok: true,
            ticket: Some(ticket.id()),
            prompt: Some(reason.prompt().to_string()),
            error_code: None,
            message: "Authentication started.".to_string(),
        },
        Ok(Err(err)) => failure(Some(err.code()), err.message()),
        Err(err) => failure(None, format!("session_begin_auth failed: {err}")),
    }
}

/// Reports the outcome of the device prompt started by `session_begin_auth`.
///
/// Input semantics:
/// - `ticket`: value returned by `session_begin_auth`.
/// - `outcome_code`: `ok` on success, otherwise one of
///   `failed|user_cancel|unavailable|biometry_unavailable|biometry_not_enrolled`;
///   anything else is recorded as `other` with `message` as details.
#[flutter_rust_bridge::frb(sync)]
pub fn session_complete_auth(ticket: u64, outcome_code: String, message: String) -> SessionStatus {
    let outcome = match outcome_code.trim() {
        "ok" | "success" => Ok(()),
        code => Err(AuthError::from_code(code, &message)),
    };

    let result = with_service(|service| {
        let pending = service
            .session()
            .pending_ticket()
            .filter(|pending| pending.id() == ticket);
        let completed = match pending {
            Some(pending) => service.complete_authentication(pending, outcome),
            None => Err(AuthError::NoPendingRequest),
        };
        let mut status = session_snapshot(service);
        if let Err(err) = completed {
            status.ok = false;
            status.error_code = Some(err.code().to_string());
            status.error_blocking = err.is_blocking();
            status.message = err.message();
        }
        status
    });

    result.unwrap_or_else(|err| {
        SessionStatus::failure(format!("session_complete_auth failed: {err}"))
    })
}

/// Hides private notes again.
#[flutter_rust_bridge::frb(sync)]
pub fn session_lock() -> SessionStatus {
    with_service(|service| {
        service.lock();
        session_snapshot(service)
    })
    .unwrap_or_else(|err| SessionStatus::failure(format!("session_lock failed: {err}")))
}

/// Forwards an app lifecycle change.
///
/// Input semantics:
/// - `phase`: Flutter `AppLifecycleState` name (`resumed|inactive|paused|hidden|detached`)
///   or `active|background`.
#[flutter_rust_bridge::frb(sync)]
pub fn app_phase_changed(phase: String) -> SessionStatus {
    let Some(parsed) = AppPhase::parse(&phase) else {
        return SessionStatus::failure(format!(
            "app_phase_changed failed: unsupported phase `{}`",
            phase.trim()
        ));
    };
    with_service(|service| {
        service.handle_phase(parsed);
        session_snapshot(service)
    })
    .unwrap_or_else(|err| SessionStatus::failure(format!("app_phase_changed failed: {err}")))
}

/// Current session flags.
#[flutter_rust_bridge::frb(sync)]
pub fn session_status() -> SessionStatus {
    with_service(|service| session_snapshot(service))
        .unwrap_or_else(|err| SessionStatus::failure(format!("session_status failed: {err}")))
}

fn lock_service() -> MutexGuard<'static, Option<NoteService<AnyStorage>>> {
    NOTE_SERVICE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs `f` on the shared service, opening it from the environment first
/// when `notes_open` was never called.
fn with_service<T>(f: impl FnOnce(&mut NoteService<AnyStorage>) -> T) -> Result<T, String> {
    let mut guard = lock_service();
    if guard.is_none() {
        let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
        *guard = Some(open_service(&config)?);
    }
    match guard.as_mut() {
        Some(service) => Ok(f(service)),
        None => Err("note store is not open".to_string()),
    }
}

fn resolve_config(data_dir: &str, backend: Option<&str>) -> Result<CoreConfig, String> {
    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if !data_dir.is_empty() {
        let log_level = config.log_level.clone();
        config = CoreConfig::new(data_dir).map_err(|err| err.to_string())?;
        config.log_level = log_level;
    }
    if let Some(backend) = backend {
        config.storage_backend = StorageBackend::parse(backend).map_err(|err| err.to_string())?;
    }
    Ok(config)
}

fn open_service(config: &CoreConfig) -> Result<NoteService<AnyStorage>, String> {
    let storage = config.open_storage().map_err(|err| {
        warn!(
            "event=ffi_open module=ffi status=error backend={:?} error={}",
            config.storage_backend, err
        );
        err.to_string()
    })?;
    let service =
        NoteService::open_with_blobs(storage, &config.notes_blob, &config.categories_blob);
    info!(
        "event=ffi_open module=ffi status=ok backend={} notes={}",
        service.repository().storage().backend_name(),
        service.repository().len()
    );
    Ok(service)
}

fn note_action(
    operation: &str,
    note_id: &str,
    success_message: &str,
    f: impl FnOnce(&mut NoteService<AnyStorage>, Uuid) -> bool,
) -> NoteActionResponse {
    let id = match parse_id(note_id, "note_id") {
        Ok(id) => id,
        Err(err) => return NoteActionResponse::failure(format!("{operation} failed: {err}")),
    };
    match with_service(|service| f(service, id)) {
        Ok(true) => NoteActionResponse::success(success_message, id.to_string()),
        Ok(false) => NoteActionResponse::failure(format!("{operation} failed: note unavailable")),
        Err(err) => NoteActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn build_query(
    private_tab: bool,
    search: String,
    category_id: Option<&str>,
) -> Result<NoteQuery, String> {
    let tab = if private_tab {
        NotesTab::Private
    } else {
        NotesTab::Notes
    };
    let category = match parse_optional_id(category_id, "category_id")? {
        Some(id) => CategorySelection::Only(id),
        None => CategorySelection::All,
    };
    Ok(NoteQuery::new(tab).with_search(search).with_category(category))
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid {field} `{}`", raw.trim()))
}

/// Blank strings count as "no id".
fn parse_optional_id(raw: Option<&str>, field: &str) -> Result<Option<Uuid>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(value, field).map(Some),
    }
}

fn session_snapshot(service: &NoteService<AnyStorage>) -> SessionStatus {
    let session = service.session();
    let state = match session.state() {
        SessionState::Locked => "locked",
        SessionState::Authenticating(_) => "authenticating",
        SessionState::Unlocked => "unlocked",
    };
    let error = session.authentication_error();
    SessionStatus {
        ok: true,
        is_unlocked: session.is_unlocked(),
        are_changes_allowed: session.are_changes_allowed(),
        state: state.to_string(),
        pending_ticket: session.pending_ticket().map(|ticket| ticket.id()),
        error_code: error.map(|err| err.code().to_string()),
        error_blocking: error.is_some_and(AuthError::is_blocking),
        message: error.map_or_else(|| "OK".to_string(), AuthError::message),
    }
}

fn category_failure(operation: &str, err: impl std::fmt::Display) -> CategoryActionResponse {
    CategoryActionResponse {
        ok: false,
        category_id: None,
        message: format!("{operation} failed: {err}"),
    }
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        note_id: note.id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        is_locked: note.is_locked,
        date_epoch_ms: note.date,
        category_id: note.category.as_ref().map(|category| category.id.to_string()),
        category_name: note.category.as_ref().map(|category| category.name.clone()),
        category_color: note.category.as_ref().map(|category| category.color.clone()),
    }
}

fn to_category_item(category: &Category) -> CategoryItem {
    CategoryItem {
        category_id: category.id.to_string(),
        name: category.name.clone(),
        color: category.color.clone(),
        is_general: category.is_general(),
    }
}

fn count_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        app_phase_changed, build_query, categories_create, categories_delete, categories_list,
        core_version, init_logging, notes_create, notes_delete, notes_list, notes_open,
        notes_remove_at_offsets, notes_set_category, notes_toggle_lock, notes_update,
        parse_optional_id, ping, session_begin_auth, session_complete_auth, session_lock,
        session_status,
    };
    use hushnote_core::{CategorySelection, NotesTab};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn build_query_maps_tab_and_category() {
        let query = build_query(true, "x".to_string(), Some("  ")).expect("valid query");
        assert_eq!(query.tab, NotesTab::Private);
        assert_eq!(query.category, CategorySelection::All);
        assert!(!query.allows_removal());

        assert!(build_query(false, String::new(), Some("not-a-uuid")).is_err());
        assert_eq!(parse_optional_id(None, "category_id"), Ok(None));
    }

    // Shares the process-wide service, so the whole flow stays in one test.
    #[test]
    fn note_flow_through_the_shared_service() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = dir.path().to_string_lossy().to_string();

        let opened = notes_open(data_dir.clone(), Some("sqlite".to_string()));
        assert!(opened.ok, "{}", opened.message);
        assert_eq!(opened.backend, "sqlite");
        assert_eq!(opened.note_count, 0);

        let public = notes_create("groceries".to_string(), "milk".to_string(), false, None);
        assert!(public.ok, "{}", public.message);
        let public_id = public.note_id.expect("note id");
        let private = notes_create("diary".to_string(), "secret".to_string(), true, None);
        let private_id = private.note_id.expect("note id");

        let listed = notes_list(false, String::new(), None);
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].note_id, public_id);

        let hidden = notes_list(true, String::new(), None);
        assert!(hidden.ok);
        assert!(hidden.requires_unlock);
        assert!(hidden.items.is_empty());
        assert!(!notes_update(private_id.clone(), "x".to_string(), "y".to_string()).ok);

        // A cancelled prompt leaves the session locked.
        let begun = session_begin_auth("view_notes".to_string());
        assert!(begun.ok, "{}", begun.message);
        let ticket = begun.ticket.expect("ticket");
        assert!(!session_begin_auth("view_notes".to_string()).ok);
        let status = session_complete_auth(ticket, "user_cancel".to_string(), String::new());
        assert!(!status.ok);
        assert_eq!(status.state, "locked");
        assert!(!status.is_unlocked);
        assert_eq!(status.error_code.as_deref(), Some("user_cancel"));

        let ticket = session_begin_auth("view_notes".to_string())
            .ticket
            .expect("ticket");
        assert!(!session_complete_auth(ticket + 1, "ok".to_string(), String::new()).ok);
        let status = session_complete_auth(ticket, "ok".to_string(), String::new());
        assert!(status.is_unlocked);
        assert_eq!(status.state, "unlocked");
        assert_eq!(notes_list(true, String::new(), None).items.len(), 1);

        assert!(!notes_toggle_lock(public_id.clone()).ok);
        let ticket = session_begin_auth("change_lock_status".to_string())
            .ticket
            .expect("ticket");
        let status = session_complete_auth(ticket, "ok".to_string(), String::new());
        assert!(status.are_changes_allowed);
        assert!(notes_toggle_lock(public_id.clone()).ok);
        assert!(!session_status().are_changes_allowed);
        assert_eq!(notes_list(true, String::new(), None).items.len(), 2);

        let status = app_phase_changed("paused".to_string());
        assert!(!status.is_unlocked);
        assert!(notes_list(true, String::new(), None).requires_unlock);
        assert!(!app_phase_changed("sleeping".to_string()).ok);

        let work = categories_create("Work".to_string(), "#ff9500".to_string());
        assert!(work.ok, "{}", work.message);
        let work_id = work.category_id.expect("category id");
        assert_eq!(categories_list().items.len(), 2);
        let another = notes_create("standup".to_string(), String::new(), false, None);
        let another_id = another.note_id.expect("note id");
        assert!(notes_set_category(another_id.clone(), Some(work_id.clone())).ok);
        let work_notes = notes_list(false, String::new(), Some(work_id.clone()));
        assert_eq!(work_notes.items.len(), 1);
        assert_eq!(work_notes.items[0].category_name.as_deref(), Some("Work"));
        assert!(categories_delete(work_id).ok);

        assert!(!notes_remove_at_offsets(false, "stand".to_string(), None, vec![0]).ok);
        let removed = notes_remove_at_offsets(false, String::new(), None, vec![0, 7]);
        assert!(removed.ok, "{}", removed.message);
        assert_eq!(removed.removed, 1);
        assert!(notes_list(false, String::new(), None).items.is_empty());

        assert!(!notes_delete(private_id.clone()).ok);
        assert!(!notes_delete("not-a-uuid".to_string()).ok);
        assert!(!session_lock().is_unlocked);

        let reopened = notes_open(data_dir, Some("sqlite".to_string()));
        assert!(reopened.ok, "{}", reopened.message);
        assert_eq!(reopened.note_count, 2);
        assert_eq!(session_status().state, "locked");
    }
}
