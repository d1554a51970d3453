use std::cell::RefCell;
use std::rc::Rc;

use egui::pos2;
use pdf_overlay::element::{ElementKind, ShapeKind, TextStyle, factory};
use pdf_overlay::{
    CoordinateMapper, Document, EditorConfig, EditorContext, EditorEvent, PageSize, Position, Size, ToolKind,
    ToolSettings,
};

/// A single 1000x1000pt page: at 100% zoom one device pixel is a tenth of a percent.
fn editor() -> EditorContext {
    EditorContext::new(
        Document::new(vec![PageSize::new(1000.0, 1000.0)]),
        EditorConfig::default(),
        ToolSettings::default(),
    )
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn drag_text_by_hundred_pixels() {
    let mut editor = editor();
    editor.settings_mut().font_size = 16.0;
    editor.set_tool(ToolKind::Text);
    editor.pointer_down(1, pos2(500.0, 500.0), 1.0);

    let text = editor.document().elements().elements()[0].clone();
    assert_eq!(text.position, Position::new(50.0, 50.0));
    assert_eq!(text.text_style().map(|s| s.font_size), Some(16.0));

    editor.set_tool(ToolKind::Select);
    editor.pointer_down(1, pos2(510.0, 510.0), 1.0);
    editor.pointer_move(1, pos2(610.0, 510.0), 1.0);
    editor.pointer_up(1, pos2(610.0, 510.0), 1.0);

    let moved = editor.document().elements().get(text.id).unwrap();
    assert!(close(moved.position.x, 60.0));
    assert!(close(moved.position.y, 50.0));
}

#[test]
fn draw_rectangle_from_corner_to_corner() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Shape(ShapeKind::Rectangle));
    editor.pointer_down(1, pos2(100.0, 100.0), 1.0);
    editor.pointer_move(1, pos2(400.0, 300.0), 1.0);
    editor.pointer_up(1, pos2(400.0, 300.0), 1.0);

    let elements = editor.document().elements().elements();
    assert_eq!(elements.len(), 1);
    let rect = &elements[0];
    assert!(matches!(&rect.kind, ElementKind::Shape(s) if s.shape_kind == ShapeKind::Rectangle));
    assert_eq!(rect.position, Position::new(10.0, 10.0));
    assert_eq!(rect.size(), Some(Size::new(30.0, 20.0)));
}

#[test]
fn add_undo_redo_restores_identical_state() {
    let mut editor = editor();
    editor
        .execute(pdf_overlay::Command::AddElement(factory::create_text(
            1,
            Position::new(5.0, 5.0),
            "hello",
            TextStyle::default(),
        )))
        .unwrap();
    let after_add = editor.document().elements().to_vec();

    assert!(editor.undo());
    assert!(editor.document().elements().is_empty());
    assert!(editor.redo());
    assert_eq!(editor.document().elements().to_vec(), after_add);
}

#[test]
fn duplicate_is_offset_with_same_style() {
    let mut editor = editor();
    let mut original = factory::create_shape(
        1,
        ShapeKind::Star,
        Position::new(20.0, 20.0),
        Size::new(10.0, 10.0),
        egui::Color32::RED,
        4.0,
    );
    original.opacity = 0.5;
    let id = original.id;
    editor.execute(pdf_overlay::Command::AddElement(original.clone())).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    editor
        .event_bus()
        .subscribe(move |event: &EditorEvent| sink.borrow_mut().push(event.clone()));

    editor.select(Some(id));
    assert!(editor.duplicate_selected().unwrap());

    let copy = editor.selected_element().unwrap().clone();
    assert_ne!(copy.id, id);
    assert_eq!(copy.position, Position::new(25.0, 25.0));
    assert_eq!(copy.kind, original.kind);
    assert_eq!(copy.opacity, original.opacity);
    assert!(events
        .borrow()
        .iter()
        .any(|e| matches!(e, EditorEvent::ElementAdded { id, .. } if *id == copy.id)));
}

#[test]
fn document_origin_is_bottom_left() {
    let mapper = CoordinateMapper::for_zoom(PageSize::LETTER, 100.0, 1.0);
    let point = mapper.to_document(Position::new(0.0, 0.0), 0.0);
    assert_eq!(point.x, 0.0);
    assert_eq!(point.y, 792.0);
}
