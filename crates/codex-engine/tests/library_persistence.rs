use codex_engine::editing::Cmd;
use codex_engine::io::DataStore;
use codex_engine::models::{Notebook, PageRef};
use codex_engine::session::{DragItem, DropTarget, Session};
use pretty_assertions::assert_eq;

fn page_files(session: &Session) -> Vec<String> {
    let mut files: Vec<String> = session
        .library()
        .notebooks
        .iter()
        .flat_map(|n| n.pages.iter().map(|p| p.file_name.to_string()))
        .collect();
    files.sort();
    files
}

#[test]
fn test_file_names_follow_counter_and_are_never_reused() {
    let data_dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(DataStore::new(data_dir.path()));
    let nb = session.create_notebook(Notebook::new("Notes", "#336699", "book"));

    let first = session.create_page(nb, "One").unwrap();
    assert_eq!(session.library().page(first).unwrap().file_name, "0.json");
    assert_eq!(session.library().next_page_index, 1);

    session.delete_page(first);
    let second = session.create_page(nb, "Two").unwrap();
    assert_eq!(session.library().page(second).unwrap().file_name, "1.json");
    assert_eq!(session.library().next_page_index, 2);
}

#[test]
fn test_reorder_keeps_every_page_and_its_content() {
    let data_dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(DataStore::new(data_dir.path()));
    let a = session.create_notebook(Notebook::new("A", "", ""));
    let b = session.create_notebook(Notebook::new("B", "", ""));
    for (nb, title) in [(a, "a1"), (a, "a2"), (b, "b1")] {
        session.create_page(nb, title).unwrap();
        session.run(&Cmd::InsertText { text: title.into() }).unwrap();
    }
    session.save();
    let before = page_files(&session);

    session.begin_drag(DragItem::Page(PageRef::new(a, 0)));
    assert!(session.drop_on(DropTarget::Page(PageRef::new(b, 0))));
    session.begin_drag(DragItem::Notebook(b));
    assert!(session.drop_on(DropTarget::Notebook(a)));

    assert_eq!(session.library().page_count(), 3);
    assert_eq!(page_files(&session), before);

    let mut reloaded = Session::load(DataStore::new(data_dir.path()));
    assert_eq!(reloaded.library(), session.library());
    let names: Vec<_> = reloaded.library().notebooks.iter().map(|n| n.name.clone()).collect();
    assert_eq!(names, vec!["B", "A"]);

    // B now holds a1 then b1
    assert!(reloaded.open_page(PageRef::new(0, 0)));
    assert_eq!(reloaded.editor().unwrap().text(), "a1");
    assert!(reloaded.open_page(PageRef::new(0, 1)));
    assert_eq!(reloaded.editor().unwrap().text(), "b1");
    assert!(reloaded.take_notices().is_empty());
}
