use hushnote_core::{
    current_notes, filtered_notes, locked_notes, non_locked_notes, sorted_by_date, Category,
    CategorySelection, Note, NoteQuery, NotesTab, GENERAL_CATEGORY_ID,
};
use std::collections::HashSet;
use uuid::Uuid;

fn note_at(date: i64, title: &str, content: &str, locked: bool) -> Note {
    let mut note = Note::new(title, content).locked(locked);
    note.date = date;
    note
}

fn sample_collection() -> Vec<Note> {
    vec![
        note_at(30, "Groceries", "milk and eggs", false),
        note_at(10, "Diary", "dear diary, today", true),
        note_at(50, "Passwords", "wifi: hunter2", true),
        note_at(20, "Ideas", "a GROCERY delivery app", false),
        note_at(40, "Meeting", "quarterly review", false),
    ]
}

fn ids<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<Uuid> {
    notes.into_iter().map(|note| note.id).collect()
}

#[test]
fn partition_is_disjoint_and_complete() {
    let notes = sample_collection();
    let locked = ids(locked_notes(&notes)).into_iter().collect::<HashSet<_>>();
    let open = ids(non_locked_notes(&notes)).into_iter().collect::<HashSet<_>>();
    let all = ids(&notes).into_iter().collect::<HashSet<_>>();

    assert!(locked.is_disjoint(&open));
    assert_eq!(locked.union(&open).copied().collect::<HashSet<_>>(), all);
}

#[test]
fn locked_view_contains_only_the_locked_note() {
    let notes = vec![
        note_at(1, "public", "", false),
        note_at(2, "private", "", true),
    ];
    let locked = locked_notes(&notes);
    assert_eq!(locked.len(), 1);
    assert_eq!(locked[0].title, "private");
}

#[test]
fn current_notes_are_date_descending_per_tab() {
    let notes = sample_collection();
    let public_titles = current_notes(&notes, NotesTab::Notes)
        .into_iter()
        .map(|note| note.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(public_titles, vec!["Meeting", "Groceries", "Ideas"]);

    let private_titles = current_notes(&notes, NotesTab::Private)
        .into_iter()
        .map(|note| note.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(private_titles, vec!["Passwords", "Diary"]);
}

#[test]
fn sorting_does_not_touch_the_collection() {
    let notes = sample_collection();
    let before = notes.clone();
    let _ = sorted_by_date(&notes);
    let _ = filtered_notes(&notes, NotesTab::Notes, "milk");
    assert_eq!(notes, before);
}

#[test]
fn empty_search_equals_current_notes() {
    let notes = sample_collection();
    for tab in [NotesTab::Notes, NotesTab::Private] {
        assert_eq!(
            ids(filtered_notes(&notes, tab, "")),
            ids(current_notes(&notes, tab))
        );
    }
}

#[test]
fn search_keeps_exactly_the_case_insensitive_matches() {
    let notes = sample_collection();
    for search in ["grocer", "DIARY", "e", "zzz", "a G"] {
        for tab in [NotesTab::Notes, NotesTab::Private] {
            let needle = search.to_lowercase();
            let expected = current_notes(&notes, tab)
                .into_iter()
                .filter(|note| {
                    note.title.to_lowercase().contains(&needle)
                        || note.content.to_lowercase().contains(&needle)
                })
                .map(|note| note.id)
                .collect::<Vec<_>>();
            assert_eq!(
                ids(filtered_notes(&notes, tab, search)),
                expected,
                "search `{search}` on {tab:?}"
            );
        }
    }
}

#[test]
fn query_combines_tab_category_and_search() {
    let work = Category {
        id: Uuid::new_v4(),
        name: "Work".to_string(),
        color: "#FF9500".to_string(),
    };
    let mut notes = sample_collection();
    notes[4] = notes[4].clone().in_category(work.to_ref());
    notes[3] = notes[3].clone().in_category(work.to_ref());

    let work_only = NoteQuery::new(NotesTab::Notes).with_category(CategorySelection::Only(work.id));
    let titles = work_only
        .apply(&notes)
        .into_iter()
        .map(|note| note.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Meeting", "Ideas"]);

    let general_only =
        NoteQuery::new(NotesTab::Notes).with_category(CategorySelection::Only(GENERAL_CATEGORY_ID));
    let titles = general_only
        .apply(&notes)
        .into_iter()
        .map(|note| note.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Groceries"]);

    let searched = work_only.clone().with_search("review");
    assert!(!searched.allows_removal());
    assert_eq!(searched.apply(&notes).len(), 1);
    assert!(work_only.allows_removal());
}
