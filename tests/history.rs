use pdf_overlay::element::{TextStyle, factory};
use pdf_overlay::{Command, Document, EditorConfig, EditorContext, HistoryManager, HistoryState, PageSize, Position, ToolSettings};

fn state(n: usize) -> HistoryState {
    HistoryState {
        elements: (0..n)
            .map(|i| factory::create_text(1, Position::new(i as f32, 0.0), "x", TextStyle::default()))
            .collect(),
        current_page: 1,
    }
}

#[test]
fn history_is_bounded_to_fifty_snapshots() {
    let mut editor = EditorContext::new(
        Document::new(vec![PageSize::LETTER]),
        EditorConfig::default(),
        ToolSettings::default(),
    );
    for i in 0..60 {
        let text = factory::create_text(1, Position::new(i as f32, 0.0), "x", TextStyle::default());
        editor.execute(Command::AddElement(text)).unwrap();
    }
    assert_eq!(editor.history().len(), 50);

    let mut undos = 0;
    while editor.undo() {
        undos += 1;
    }
    assert_eq!(undos, 49);
    // The oldest kept snapshot holds the eleventh addition.
    assert_eq!(editor.document().elements().len(), 11);
}

#[test]
fn recording_after_undo_drops_the_redo_branch() {
    let mut history = HistoryManager::new(state(0), 50);
    history.snapshot(state(1));
    history.snapshot(state(2));
    history.undo();
    history.snapshot(state(3));

    assert!(!history.can_redo());
    assert_eq!(history.len(), 3);
    assert_eq!(history.current().elements.len(), 3);
}

#[test]
fn undo_then_redo_is_identity() {
    let mut history = HistoryManager::new(state(0), 50);
    for n in 1..=5 {
        history.snapshot(state(n));
    }
    let top = history.current().clone();
    for _ in 0..3 {
        history.undo();
    }
    for _ in 0..3 {
        history.redo();
    }
    assert_eq!(history.current(), &top);
    assert!(history.redo().is_none());
}

#[test]
fn page_changes_are_recorded() {
    let mut editor = EditorContext::new(
        Document::new(vec![PageSize::LETTER; 3]),
        EditorConfig::default(),
        ToolSettings::default(),
    );
    assert!(editor.set_page(3).unwrap());
    assert!(!editor.set_page(7).unwrap());
    assert!(editor.undo());
    assert_eq!(editor.document().current_page(), 1);
}
