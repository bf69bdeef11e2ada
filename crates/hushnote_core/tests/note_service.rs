mod support;

use hushnote_core::{
    AppPhase, AuthError, AuthReason, CategoryRepository, CategorySelection, MemoryStorage,
    NoteDraft, NoteQuery, NoteRepository, NoteService, NotesTab,
};
use support::{ticking_clock, ScriptedAuthenticator};

fn new_service() -> NoteService<MemoryStorage> {
    let storage = MemoryStorage::new();
    NoteService::from_parts(
        NoteRepository::new(storage.clone()).with_clock(ticking_clock),
        CategoryRepository::new(storage),
    )
}

fn private_draft(title: &str) -> NoteDraft {
    let mut draft = NoteDraft::new(title, "secret");
    draft.is_locked = true;
    draft
}

fn titles(service: &NoteService<MemoryStorage>, query: &NoteQuery) -> Vec<String> {
    service
        .visible_notes(query)
        .into_iter()
        .map(|note| note.title.clone())
        .collect()
}

#[test]
fn private_notes_stay_hidden_until_unlocked() {
    let mut service = new_service();
    service.create_note(NoteDraft::new("public", ""));
    let private = service.create_note(private_draft("private"));
    let private_tab = NoteQuery::new(NotesTab::Private);

    assert!(service.visible_notes(&private_tab).is_empty());
    assert!(service.note(private.id).is_none());
    assert!(!service.edit_note(private.id, "changed", "changed"));
    assert!(!service.delete_note(private.id));
    assert_eq!(titles(&service, &NoteQuery::new(NotesTab::Notes)), vec!["public"]);

    service
        .unlock(&ScriptedAuthenticator::succeeding())
        .expect("unlock");
    assert_eq!(titles(&service, &private_tab), vec!["private"]);
    assert!(service.note(private.id).is_some());

    service.handle_phase(AppPhase::Background);
    assert!(service.visible_notes(&private_tab).is_empty());
}

#[test]
fn lock_hides_private_notes_again() {
    let mut service = new_service();
    service.create_note(private_draft("private"));
    let private_tab = NoteQuery::new(NotesTab::Private);
    service
        .unlock(&ScriptedAuthenticator::succeeding())
        .expect("unlock");
    assert_eq!(titles(&service, &private_tab), vec!["private"]);

    service.lock();

    assert!(!service.session().is_unlocked());
    assert!(service.visible_notes(&private_tab).is_empty());
}

#[test]
fn failed_unlock_keeps_private_tab_empty() {
    let mut service = new_service();
    service.create_note(private_draft("private"));

    let err = service
        .unlock(&ScriptedAuthenticator::incapable())
        .expect_err("device cannot authenticate");
    assert_eq!(err, AuthError::Unavailable);
    assert!(service
        .visible_notes(&NoteQuery::new(NotesTab::Private))
        .is_empty());
    assert_eq!(
        service.session().authentication_error(),
        Some(&AuthError::Unavailable)
    );
}

#[test]
fn edit_bumps_date_only_when_text_changes() {
    let mut service = new_service();
    let note = service.create_note(NoteDraft::new("title", "body"));

    assert!(service.edit_note(note.id, "title", "body"));
    assert_eq!(service.note(note.id).expect("note").date, note.date);

    assert!(service.edit_note(note.id, "title", "new body"));
    let edited = service.note(note.id).expect("note");
    assert_eq!(edited.content, "new body");
    assert!(edited.date > note.date);
}

#[test]
fn removal_is_refused_while_searching() {
    let mut service = new_service();
    service.create_note(NoteDraft::new("alpha", ""));
    service.create_note(NoteDraft::new("beta", ""));

    let searching = NoteQuery::new(NotesTab::Notes).with_search("alpha");
    assert_eq!(service.remove_at_offsets(&searching, &[0]), 0);
    assert_eq!(service.repository().len(), 2);
}

#[test]
fn removal_on_locked_private_tab_is_refused() {
    let mut service = new_service();
    service.create_note(private_draft("private"));

    let private_tab = NoteQuery::new(NotesTab::Private);
    assert_eq!(service.remove_at_offsets(&private_tab, &[0]), 0);
    assert_eq!(service.repository().len(), 1);
}

#[test]
fn removal_uses_offsets_of_the_visible_sorted_list() {
    let mut service = new_service();
    let older = service.create_note(NoteDraft::new("older", ""));
    let newer = service.create_note(NoteDraft::new("newer", ""));
    service.create_note(private_draft("private"));

    let notes_tab = NoteQuery::new(NotesTab::Notes);
    assert_eq!(titles(&service, &notes_tab), vec!["newer", "older"]);
    assert_eq!(service.remove_at_offsets(&notes_tab, &[0]), 1);
    assert!(service.repository().get(newer.id).is_none());
    assert!(service.repository().get(older.id).is_some());
    assert_eq!(service.repository().len(), 2);
}

#[test]
fn removal_with_category_filter_targets_the_filtered_list() {
    let mut service = new_service();
    let work = service.add_category("Work", "#FF9500").expect("category");
    let untagged = service.create_note(NoteDraft::new("untagged", ""));
    let mut draft = NoteDraft::new("work", "");
    draft.category = Some(work.id);
    let tagged = service.create_note(draft);
    service.create_note(NoteDraft::new("newest untagged", ""));

    let work_view =
        NoteQuery::new(NotesTab::Notes).with_category(CategorySelection::Only(work.id));
    assert_eq!(service.remove_at_offsets(&work_view, &[0]), 1);
    assert!(service.repository().get(tagged.id).is_none());
    assert!(service.repository().get(untagged.id).is_some());
    assert_eq!(service.repository().len(), 2);
}

#[test]
fn unknown_category_leaves_new_note_untagged() {
    let mut service = new_service();
    let mut draft = NoteDraft::new("orphan", "");
    draft.category = Some(uuid::Uuid::new_v4());
    let note = service.create_note(draft);
    assert!(note.category.is_none());
    assert!(!service.set_note_category(note.id, Some(uuid::Uuid::new_v4())));
}

#[test]
fn two_phase_toggle_through_the_service() {
    let mut service = new_service();
    let note = service.create_note(NoteDraft::new("soon private", ""));

    assert!(!service.apply_lock_toggle(note.id));

    let ticket = service
        .begin_authentication(AuthReason::ChangeLockStatus)
        .expect("begin");
    service
        .complete_authentication(ticket, Err(AuthError::UserCancelled))
        .expect_err("cancelled");
    assert!(!service.apply_lock_toggle(note.id));

    let ticket = service
        .begin_authentication(AuthReason::ChangeLockStatus)
        .expect("begin");
    service
        .complete_authentication(ticket, Ok(()))
        .expect("complete");
    assert!(service.apply_lock_toggle(note.id));
    assert!(service.repository().get(note.id).expect("note").is_locked);
    assert!(service.note(note.id).is_none());
}

#[test]
fn blocking_toggle_uses_the_authenticator() {
    let mut service = new_service();
    let note = service.create_note(private_draft("private"));
    let authenticator = ScriptedAuthenticator::succeeding();

    assert_eq!(service.toggle_lock(note.id, &authenticator), Ok(true));
    assert!(!service.repository().get(note.id).expect("note").is_locked);
    assert_eq!(authenticator.prompts(), vec![AuthReason::ChangeLockStatus]);
}
