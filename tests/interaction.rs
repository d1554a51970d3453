use std::cell::RefCell;
use std::rc::Rc;

use egui::{Pos2, pos2};
use pdf_overlay::element::{TextStyle, factory};
use pdf_overlay::renderer::{OverlayFrame, display_list};
use pdf_overlay::{
    Command, CommandError, Document, EditorConfig, EditorContext, EditorEvent, PageSize, Position, Size, ToolKind,
    ToolSettings,
};

fn editor() -> EditorContext {
    EditorContext::new(
        Document::new(vec![PageSize::new(1000.0, 1000.0)]),
        EditorConfig::default(),
        ToolSettings::default(),
    )
}

fn record(editor: &EditorContext) -> Rc<RefCell<Vec<EditorEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    editor
        .event_bus()
        .subscribe(move |event: &EditorEvent| sink.borrow_mut().push(event.clone()));
    events
}

fn click(editor: &mut EditorContext, from: Pos2, to: Pos2) {
    editor.pointer_down(1, from, 1.0);
    editor.pointer_move(1, to, 1.0);
    editor.pointer_up(1, to, 1.0);
}

#[test]
fn comment_click_and_drag_threshold() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Comment);
    let events = record(&editor);

    click(&mut editor, pos2(100.0, 100.0), pos2(104.9, 100.0));
    click(&mut editor, pos2(100.0, 100.0), pos2(105.1, 100.0));

    let events = events.borrow();
    assert!(matches!(events[0], EditorEvent::MarkerPlaced { page: 1, .. }));
    assert!(matches!(events[1], EditorEvent::RangeSelected { page: 1, .. }));
    assert!(editor.document().elements().is_empty());
}

#[test]
fn tiny_shapes_are_discarded() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Shape(pdf_overlay::element::ShapeKind::Circle));
    // 30% wide but only 1.9% tall.
    click(&mut editor, pos2(100.0, 100.0), pos2(400.0, 119.0));
    assert!(editor.document().elements().is_empty());

    click(&mut editor, pos2(100.0, 100.0), pos2(400.0, 120.0));
    assert_eq!(editor.document().elements().len(), 1);
}

#[test]
fn redaction_minimum_is_one_percent() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Redact);
    click(&mut editor, pos2(0.0, 0.0), pos2(15.0, 15.0));
    assert_eq!(editor.document().elements().len(), 1);
    click(&mut editor, pos2(0.0, 0.0), pos2(9.0, 200.0));
    assert_eq!(editor.document().elements().len(), 1);
}

#[test]
fn single_point_freehand_is_kept() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Draw);
    editor.pointer_down(1, pos2(300.0, 300.0), 1.0);
    editor.pointer_up(1, pos2(300.0, 300.0), 1.0);
    let path = &editor.document().elements().elements()[0];
    assert_eq!(path.points().map(<[Position]>::len), Some(1));
}

#[test]
fn drawing_is_zoom_invariant() {
    let mut shapes = Vec::new();
    for zoom in [50.0, 100.0, 200.0] {
        let mut editor = editor();
        editor.set_zoom(zoom);
        editor.set_tool(ToolKind::Shape(pdf_overlay::element::ShapeKind::Rectangle));
        let scale = zoom / 100.0;
        click(&mut editor, pos2(100.0 * scale, 100.0 * scale), pos2(400.0 * scale, 300.0 * scale));
        let element = &editor.document().elements().elements()[0];
        shapes.push((element.position, element.size()));
    }
    for (position, size) in &shapes {
        assert!((position.x - 10.0).abs() < 1e-3 && (position.y - 10.0).abs() < 1e-3);
        let size = size.unwrap();
        assert!((size.width - 30.0).abs() < 1e-3 && (size.height - 20.0).abs() < 1e-3);
    }
}

#[test]
fn zooming_and_redrawing_never_touch_stored_geometry() {
    let mut editor = editor();
    editor.set_tool(ToolKind::Draw);
    editor.pointer_down(1, pos2(123.0, 123.0), 1.0);
    editor.pointer_move(1, pos2(137.0, 131.0), 1.0);
    editor.pointer_up(1, pos2(157.0, 148.0), 1.0);
    editor.set_tool(ToolKind::Shape(pdf_overlay::element::ShapeKind::Circle));
    click(&mut editor, pos2(500.0, 500.0), pos2(700.0, 600.0));
    let text = factory::create_text(1, Position::new(33.3, 66.6), "keep", TextStyle::default());
    editor.execute(Command::AddElement(text.clone())).unwrap();
    editor.select(Some(text.id));

    let before = editor.document().elements().to_vec();
    let config = EditorConfig {
        show_grid: true,
        ..Default::default()
    };
    for (step, zoom) in [75.0, 200.0, 25.0, 133.0, 100.0, 50.0].into_iter().enumerate() {
        editor.set_zoom(zoom);
        let ppp = if step % 2 == 0 { 1.0 } else { 2.0 };
        let mapper = editor.document().mapper(1, ppp).unwrap();
        let frame = OverlayFrame {
            page: 1,
            mapper: &mapper,
            config: &config,
            selected: editor.selected(),
            preview: None,
            marquee: None,
        };
        assert!(!display_list(editor.document().elements().elements(), &frame).is_empty());
    }
    editor.zoom_in();
    editor.zoom_out();

    let after = editor.document().elements().to_vec();
    assert_eq!(after.len(), before.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.position.x.to_bits(), b.position.x.to_bits());
        assert_eq!(a.position.y.to_bits(), b.position.y.to_bits());
        assert_eq!(a.size(), b.size());
        assert_eq!(a.points(), b.points());
    }
}

#[test]
fn dragged_element_rejects_outside_writes_until_release() {
    let mut editor = editor();
    let text = factory::create_text(1, Position::new(10.0, 10.0), "lock", TextStyle::default());
    let id = text.id;
    editor.execute(Command::AddElement(text)).unwrap();

    editor.pointer_down(1, pos2(110.0, 110.0), 1.0);
    editor.pointer_move(1, pos2(150.0, 110.0), 1.0);

    let patch = pdf_overlay::element::ElementPatch {
        opacity: Some(0.2),
        ..Default::default()
    };
    assert_eq!(
        editor.execute(Command::UpdateElement { id, patch: patch.clone() }),
        Err(CommandError::ElementBusy(id))
    );
    assert_eq!(editor.document().elements().get(id).unwrap().opacity, 1.0);

    editor.pointer_leave(1.0);
    assert!(!editor.controller().is_busy());
    assert_eq!(editor.execute(Command::UpdateElement { id, patch }), Ok(true));
    assert_eq!(editor.document().elements().get(id).unwrap().position, Position::new(14.0, 10.0));
}

#[test]
fn resize_from_top_left_keeps_opposite_edge() {
    let mut editor = editor();
    let shape = factory::create_shape(
        1,
        pdf_overlay::element::ShapeKind::Rectangle,
        Position::new(20.0, 20.0),
        Size::new(20.0, 10.0),
        egui::Color32::BLUE,
        2.0,
    );
    let id = shape.id;
    editor.execute(Command::AddElement(shape)).unwrap();
    editor.select(Some(id));

    // Top-left grip sits on (200px, 200px).
    click(&mut editor, pos2(200.0, 200.0), pos2(250.0, 220.0));

    let resized = editor.document().elements().get(id).unwrap();
    assert_eq!(resized.position, Position::new(25.0, 22.0));
    assert_eq!(resized.size(), Some(Size::new(15.0, 8.0)));
}

#[test]
fn eraser_removes_hit_element() {
    let mut editor = editor();
    let text = factory::create_text(1, Position::new(10.0, 10.0), "bye", TextStyle::default());
    editor.execute(Command::AddElement(text)).unwrap();
    editor.set_tool(ToolKind::Erase);
    editor.pointer_down(1, pos2(120.0, 120.0), 1.0);
    editor.pointer_up(1, pos2(120.0, 120.0), 1.0);
    assert!(editor.document().elements().is_empty());
    assert!(editor.can_undo());
}
