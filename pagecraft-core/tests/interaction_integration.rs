//! Editor Interaction Integration Tests
//!
//! Drives the editor through complete gestures against a synthetic layout:
//! - Drag threshold and absolute moves
//! - Reparenting, flow reordering and grid drops
//! - Marquee selection
//! - Resize, keyboard shortcuts and the context menu

use pagecraft_core::{
    ContextMenuAction, Disposition, Document, Editor, EditorConfig, ElementId, ElementType,
    InteractionState, KeyEvent, KeyModifiers, NewElement, PointerButton, PointerEvent, Rect,
    ResizeDirection, StaticLayout,
};

const CANVAS: Rect = Rect::new(0.0, 0.0, 1200.0, 900.0);

fn number(editor: &Editor<StaticLayout>, id: ElementId, key: &str) -> Option<f64> {
    editor.document().element(id)?.style.number(key)
}

fn text(editor: &Editor<StaticLayout>, id: ElementId, key: &str) -> Option<String> {
    editor
        .document()
        .element(id)?
        .style
        .text(key)
        .map(str::to_string)
}

/// Press at `from`, move through `path`, release at the last point.
fn drag(editor: &mut Editor<StaticLayout>, from: (f64, f64), path: &[(f64, f64)]) {
    editor.on_pointer_down(&PointerEvent::at(from.0, from.1));
    for &(x, y) in path {
        editor.on_pointer_move(&PointerEvent::at(x, y));
    }
    let last = path.last().copied().unwrap_or(from);
    editor.on_pointer_up(&PointerEvent::at(last.0, last.1));
}

/// A root text element at its default box (100, 100, 200×40).
fn single_text() -> (Editor<StaticLayout>, ElementId) {
    let mut doc = Document::new();
    let id = doc.add_element(NewElement::new(ElementType::Text), None);
    let layout = StaticLayout::new(CANVAS).with_box(id, Rect::new(100.0, 100.0, 200.0, 40.0));
    (Editor::new(layout).with_document(doc), id)
}

/// A relative section holding three stacked text blocks.
fn flow_section() -> (Editor<StaticLayout>, ElementId, [ElementId; 3]) {
    let mut doc = Document::new();
    let section = doc.add_element(NewElement::new(ElementType::Container), None);
    doc.edit_style(section, |s| s.set("position", "relative"))
        .expect("section exists");
    let a = doc.add_element(NewElement::new(ElementType::Text).with_name("A"), Some(section));
    let b = doc.add_element(NewElement::new(ElementType::Text).with_name("B"), Some(section));
    let c = doc.add_element(NewElement::new(ElementType::Text).with_name("C"), Some(section));
    let layout = StaticLayout::new(CANVAS)
        .with_box(section, Rect::new(0.0, 0.0, 400.0, 300.0))
        .with_box(a, Rect::new(0.0, 0.0, 400.0, 100.0))
        .with_box(b, Rect::new(0.0, 100.0, 400.0, 100.0))
        .with_box(c, Rect::new(0.0, 200.0, 400.0, 100.0));
    (Editor::new(layout).with_document(doc), section, [a, b, c])
}

// ============================================================================
// Drag threshold and absolute moves
// ============================================================================

#[test]
fn test_movement_below_threshold_never_mutates() {
    let (mut editor, id) = single_text();
    editor.on_pointer_down(&PointerEvent::at(150.0, 120.0));
    editor.on_pointer_move(&PointerEvent::at(154.0, 120.0));

    assert!(matches!(editor.state(), InteractionState::PreparingDrag(_)));
    assert_eq!(number(&editor, id, "left"), Some(100.0));
    assert_eq!(editor.history().undo_len(), 0);

    editor.on_pointer_up(&PointerEvent::at(154.0, 120.0));
    assert!(editor.is_idle());
    assert_eq!(editor.history().undo_len(), 0);
    assert!(editor.document().is_selected(id));
}

#[test]
fn test_drag_past_threshold_snapshots_once() {
    let (mut editor, id) = single_text();
    editor.on_pointer_down(&PointerEvent::at(150.0, 120.0));
    editor.on_pointer_move(&PointerEvent::at(156.0, 120.0));

    assert!(matches!(editor.state(), InteractionState::Dragging(_)));
    assert_eq!(number(&editor, id, "left"), Some(106.0));
    assert_eq!(editor.history().undo_len(), 1);

    editor.on_pointer_move(&PointerEvent::at(170.0, 130.0));
    editor.on_pointer_move(&PointerEvent::at(190.0, 150.0));
    editor.on_pointer_up(&PointerEvent::at(190.0, 150.0));

    assert!(editor.is_idle());
    assert_eq!(number(&editor, id, "left"), Some(140.0));
    assert_eq!(number(&editor, id, "top"), Some(130.0));
    assert_eq!(editor.history().undo_len(), 1);

    assert!(editor.undo());
    assert_eq!(number(&editor, id, "left"), Some(100.0));
    assert_eq!(number(&editor, id, "top"), Some(100.0));
}

#[test]
fn test_drag_delta_is_divided_by_zoom() {
    let (mut editor, id) = single_text();
    editor.viewport_mut().set_zoom(2.0);
    drag(&mut editor, (150.0, 120.0), &[(170.0, 160.0)]);
    assert_eq!(number(&editor, id, "left"), Some(110.0));
    assert_eq!(number(&editor, id, "top"), Some(120.0));
}

#[test]
fn test_drag_snaps_when_enabled() {
    let (mut editor, id) = single_text();
    editor.viewport_mut().snap_to_grid = true;
    // 100 + 13 = 113 snaps down to 110; 100 + 18 = 118 snaps up to 120.
    drag(&mut editor, (150.0, 120.0), &[(163.0, 138.0)]);
    assert_eq!(number(&editor, id, "left"), Some(110.0));
    assert_eq!(number(&editor, id, "top"), Some(120.0));
}

#[test]
fn test_multi_selection_moves_together() {
    let mut doc = Document::new();
    let a = doc.add_element(NewElement::new(ElementType::Text), None);
    let b = doc.add_element(NewElement::new(ElementType::Button), None);
    doc.edit_style(b, |s| s.set("top", 300.0)).expect("exists");
    let layout = StaticLayout::new(CANVAS)
        .with_box(a, Rect::new(100.0, 100.0, 200.0, 40.0))
        .with_box(b, Rect::new(100.0, 300.0, 120.0, 40.0));
    let mut editor = Editor::new(layout).with_document(doc);
    editor.select_multiple([a, b]);

    drag(&mut editor, (150.0, 120.0), &[(180.0, 120.0)]);
    assert_eq!(number(&editor, a, "left"), Some(130.0));
    assert_eq!(number(&editor, b, "left"), Some(130.0));
    assert_eq!(number(&editor, b, "top"), Some(300.0));
}

#[test]
fn test_click_on_multi_selection_member_collapses() {
    let mut doc = Document::new();
    let a = doc.add_element(NewElement::new(ElementType::Text), None);
    let b = doc.add_element(NewElement::new(ElementType::Text), None);
    let layout = StaticLayout::new(CANVAS)
        .with_box(a, Rect::new(0.0, 0.0, 100.0, 40.0))
        .with_box(b, Rect::new(0.0, 100.0, 100.0, 40.0));
    let mut editor = Editor::new(layout).with_document(doc);

    editor.on_pointer_down(&PointerEvent::at(10.0, 10.0));
    editor.on_pointer_up(&PointerEvent::at(10.0, 10.0));
    editor.on_pointer_down(&PointerEvent::at(10.0, 110.0).with_modifiers(KeyModifiers::SHIFT));
    editor.on_pointer_up(&PointerEvent::at(10.0, 110.0));
    assert_eq!(editor.document().selected_element_ids().len(), 2);

    editor.on_pointer_down(&PointerEvent::at(10.0, 10.0));
    editor.on_pointer_up(&PointerEvent::at(10.0, 10.0));
    let selected: Vec<ElementId> = editor.document().selected_element_ids().iter().copied().collect();
    assert_eq!(selected, vec![a]);
}

#[test]
fn test_shift_click_toggles_off() {
    let (mut editor, id) = single_text();
    editor.select_element(id, false).expect("select");
    editor.on_pointer_down(&PointerEvent::at(150.0, 120.0).with_modifiers(KeyModifiers::SHIFT));
    assert!(editor.is_idle());
    assert!(!editor.document().is_selected(id));
}

#[test]
fn test_hidden_elements_are_not_hit() {
    let (mut editor, id) = single_text();
    editor.apply(|doc| doc.set_hidden(id, true)).expect("hide");
    editor.on_pointer_down(&PointerEvent::at(150.0, 120.0));
    assert!(matches!(editor.state(), InteractionState::MarqueeSelecting(_)));
    assert!(!editor.document().is_selected(id));
}

#[test]
fn test_escape_mid_drag_keeps_committed_moves() {
    let (mut editor, id) = single_text();
    editor.on_pointer_down(&PointerEvent::at(150.0, 120.0));
    editor.on_pointer_move(&PointerEvent::at(180.0, 120.0));
    let disposition = editor.on_key_down(&KeyEvent::new("Escape", KeyModifiers::NONE));

    assert_eq!(disposition, Disposition::Consumed);
    assert!(editor.is_idle());
    assert_eq!(number(&editor, id, "left"), Some(130.0));
    assert!(editor.drop_indicator().is_none());
}

#[test]
fn test_drag_from_string_offset_starts_at_measured_box() {
    let mut doc = Document::new();
    let id = doc.add_element(NewElement::new(ElementType::Text), None);
    doc.edit_style(id, |s| s.set("left", "50%")).expect("exists");
    let layout = StaticLayout::new(CANVAS).with_box(id, Rect::new(500.0, 100.0, 200.0, 40.0));
    let mut editor = Editor::new(layout).with_document(doc);

    drag(&mut editor, (550.0, 120.0), &[(560.0, 120.0)]);

    assert_eq!(number(&editor, id, "left"), Some(510.0));
    assert_eq!(number(&editor, id, "top"), Some(100.0));
}

#[test]
fn test_root_drop_on_empty_canvas_becomes_absolute() {
    let (mut editor, id) = single_text();
    editor
        .apply(|doc| doc.edit_style(id, |s| s.set("position", "static")))
        .expect("exists");

    drag(&mut editor, (150.0, 120.0), &[(300.0, 400.0)]);

    assert_eq!(editor.document().parent_of(id), None);
    assert_eq!(text(&editor, id, "position").as_deref(), Some("absolute"));
    assert_eq!(number(&editor, id, "left"), Some(250.0));
    assert_eq!(number(&editor, id, "top"), Some(380.0));
}

// ============================================================================
// Reparenting and flow reordering
// ============================================================================

#[test]
fn test_drop_onto_section_reparents_into_flow() {
    let mut doc = Document::new();
    let section = doc.add_element(NewElement::new(ElementType::Container), None);
    let label = doc.add_element(NewElement::new(ElementType::Text), None);
    let layout = StaticLayout::new(CANVAS)
        .with_box(section, Rect::new(0.0, 300.0, 1200.0, 200.0))
        .with_box(label, Rect::new(100.0, 100.0, 200.0, 40.0));
    let mut editor = Editor::new(layout).with_document(doc);

    drag(&mut editor, (150.0, 120.0), &[(150.0, 250.0), (150.0, 400.0)]);

    let doc = editor.document();
    assert_eq!(doc.parent_of(label), Some(section));
    assert_eq!(doc.children_of(section), &[label]);
    assert_eq!(doc.root_element_ids(), &[section]);
    assert_eq!(text(&editor, label, "position").as_deref(), Some("relative"));
    assert_eq!(number(&editor, label, "left"), None);
    assert_eq!(number(&editor, label, "top"), None);
    assert_eq!(number(&editor, label, "width"), Some(200.0));
    assert!(editor.document().check_invariants().is_ok());
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn test_drop_on_empty_canvas_returns_to_root() {
    let (mut editor, section, [a, _, _]) = flow_section();
    drag(&mut editor, (50.0, 50.0), &[(600.0, 500.0), (700.0, 600.0)]);

    let doc = editor.document();
    assert_eq!(doc.parent_of(a), None);
    assert!(doc.root_element_ids().contains(&a));
    assert_eq!(doc.children_of(section).len(), 2);
    assert_eq!(text(&editor, a, "position").as_deref(), Some("absolute"));
    // Positioned at its last measured canvas box.
    assert_eq!(number(&editor, a, "left"), Some(0.0));
    assert_eq!(number(&editor, a, "top"), Some(0.0));
    assert!(editor.document().check_invariants().is_ok());
}

#[test]
fn test_flow_child_returning_to_its_section_keeps_flow_slot() {
    let (mut editor, section, [a, _, _]) = flow_section();
    drag(&mut editor, (50.0, 50.0), &[(600.0, 500.0), (50.0, 60.0)]);

    let doc = editor.document();
    assert_eq!(doc.parent_of(a), Some(section));
    assert_eq!(doc.children_of(section).len(), 3);
    assert_eq!(text(&editor, a, "position").as_deref(), Some("relative"));
    assert_eq!(number(&editor, a, "left"), None);
    assert_eq!(number(&editor, a, "top"), None);
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn test_flow_drag_reorders_live() {
    let (mut editor, section, [a, b, c]) = flow_section();

    editor.on_pointer_down(&PointerEvent::at(50.0, 250.0));
    editor.on_pointer_move(&PointerEvent::at(50.0, 30.0));

    assert_eq!(editor.document().children_of(section), &[c, a, b]);
    assert_eq!(editor.highlighted_drop_target(), Some(section));
    assert!(editor.drop_indicator().is_some());

    editor.on_pointer_up(&PointerEvent::at(50.0, 30.0));
    assert_eq!(editor.document().children_of(section), &[c, a, b]);
    assert!(editor.drop_indicator().is_none());
    assert!(editor.highlighted_drop_target().is_none());
    assert_eq!(editor.history().undo_len(), 1);

    assert!(editor.undo());
    assert_eq!(editor.document().children_of(section), &[a, b, c]);
}

#[test]
fn test_drop_container_excludes_own_subtree() {
    let mut doc = Document::new();
    let outer = doc.add_element(NewElement::new(ElementType::Container), None);
    let box_ = doc.add_element(NewElement::new(ElementType::Container), None);
    let inner = doc.add_element(NewElement::new(ElementType::Container), Some(box_));
    let layout = StaticLayout::new(CANVAS)
        .with_box(outer, Rect::new(0.0, 600.0, 1200.0, 200.0))
        .with_box(box_, Rect::new(0.0, 0.0, 1200.0, 200.0))
        .with_box(inner, Rect::new(0.0, 0.0, 1200.0, 100.0));
    let mut editor = Editor::new(layout).with_document(doc);
    editor.select_element(box_, false).expect("select");

    // Grab the parent by its exposed lower half and drop it over its child.
    drag(&mut editor, (10.0, 150.0), &[(10.0, 160.0), (10.0, 50.0)]);

    let doc = editor.document();
    assert_eq!(doc.parent_of(box_), None);
    assert_eq!(doc.parent_of(inner), Some(box_));
    assert!(doc.check_invariants().is_ok());
}

// ============================================================================
// Grids
// ============================================================================

#[test]
fn test_external_grid_drop_generates_cells() {
    let mut editor = Editor::new(StaticLayout::new(CANVAS));
    let disposition = editor.on_drop(
        &PointerEvent::at(300.0, 300.0),
        r#"{"type":"new_element","elementType":"grid"}"#,
    );
    assert_eq!(disposition, Disposition::Consumed);

    let doc = editor.document();
    let grid = doc.root_element_ids()[0];
    assert_eq!(doc.children_of(grid).len(), 9);
    assert!(doc.is_selected(grid));
    assert!(doc
        .children_of(grid)
        .iter()
        .all(|&cell| doc.element(cell).is_some_and(pagecraft_core::Element::is_grid_cell)));
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn test_drop_into_unmeasured_cells_targets_grid_lines() {
    let mut doc = Document::new();
    let grid = doc.add_element(NewElement::new(ElementType::Grid), None);
    let label = doc.add_element(NewElement::new(ElementType::Text), None);
    let layout = StaticLayout::new(CANVAS)
        .with_box(grid, Rect::new(0.0, 300.0, 300.0, 300.0))
        .with_box(label, Rect::new(100.0, 100.0, 200.0, 40.0));
    let mut editor = Editor::new(layout).with_document(doc);

    drag(&mut editor, (150.0, 120.0), &[(150.0, 200.0), (250.0, 450.0)]);

    assert_eq!(editor.document().parent_of(label), Some(grid));
    assert_eq!(text(&editor, label, "gridColumn").as_deref(), Some("3"));
    assert_eq!(text(&editor, label, "gridRow").as_deref(), Some("2"));
    assert_eq!(text(&editor, label, "position").as_deref(), Some("relative"));
}

#[test]
fn test_drop_into_grid_cell() {
    let mut doc = Document::new();
    let grid = doc.add_element(NewElement::new(ElementType::Grid), None);
    doc.generate_grid_cells(grid).expect("grid exists");
    let cells: Vec<ElementId> = doc.children_of(grid).to_vec();
    let mut layout = StaticLayout::new(CANVAS).with_box(grid, Rect::new(0.0, 0.0, 300.0, 300.0));
    for (i, &cell) in cells.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let (col, row) = ((i % 3) as f64, (i / 3) as f64);
        layout.set_box(cell, Rect::new(col * 100.0, row * 100.0, 100.0, 100.0));
    }
    let mut editor = Editor::new(layout).with_document(doc);

    editor.on_drop(
        &PointerEvent::at(250.0, 50.0),
        r#"{"type":"new_element","elementType":"button","name":"Buy"}"#,
    );

    let doc = editor.document();
    let cell = cells[2];
    assert_eq!(doc.children_of(cell).len(), 1);
    let button = doc.children_of(cell)[0];
    assert_eq!(doc.element(button).map(|e| e.name.as_str()), Some("Buy"));
    assert_eq!(text(&editor, button, "overflow").as_deref(), Some("hidden"));
    assert_eq!(text(&editor, button, "position").as_deref(), Some("relative"));
}

#[test]
fn test_grid_regeneration_is_idempotent_and_keeps_contents() {
    let mut doc = Document::new();
    let grid = doc.add_element(
        NewElement::new(ElementType::Grid)
            .with_style("gridTemplateColumns", "repeat(4, 1fr)")
            .with_style("gridTemplateRows", "repeat(2, 1fr)"),
        None,
    );
    let first = doc.generate_grid_cells(grid).expect("grid exists");
    assert_eq!(first.created.len(), 8);

    let cell = doc.children_of(grid)[0];
    let content = doc.add_element(NewElement::new(ElementType::Text), Some(cell));

    let second = doc.generate_grid_cells(grid).expect("grid exists");
    assert!(second.is_unchanged());
    assert_eq!(doc.children_of(grid).len(), 8);
    assert_eq!(doc.parent_of(content), Some(cell));
}

#[test]
fn test_invalid_drop_payload_is_ignored() {
    let mut editor = Editor::new(StaticLayout::new(CANVAS));
    let disposition = editor.on_drop(&PointerEvent::at(10.0, 10.0), r#"{"type":"file"}"#);
    assert_eq!(disposition, Disposition::Ignored);
    assert!(editor.document().is_empty());
    assert_eq!(editor.history().undo_len(), 0);
}

#[test]
fn test_drag_over_highlights_container() {
    let mut doc = Document::new();
    let section = doc.add_element(NewElement::new(ElementType::Container), None);
    let layout = StaticLayout::new(CANVAS).with_box(section, Rect::new(0.0, 0.0, 1200.0, 200.0));
    let mut editor = Editor::new(layout).with_document(doc);

    editor.on_drag_over(&PointerEvent::at(10.0, 10.0));
    assert_eq!(editor.highlighted_drop_target(), Some(section));
    editor.on_drag_over(&PointerEvent::at(10.0, 500.0));
    assert_eq!(editor.highlighted_drop_target(), None);
}

// ============================================================================
// Marquee selection
// ============================================================================

fn marquee_fixture() -> (Editor<StaticLayout>, ElementId, ElementId) {
    let mut doc = Document::new();
    let a = doc.add_element(NewElement::new(ElementType::Icon), None);
    let b = doc.add_element(NewElement::new(ElementType::Icon), None);
    let layout = StaticLayout::new(CANVAS)
        .with_box(a, Rect::new(50.0, 50.0, 40.0, 40.0))
        .with_box(b, Rect::new(200.0, 200.0, 40.0, 40.0));
    (Editor::new(layout).with_document(doc), a, b)
}

#[test]
fn test_tiny_marquee_selects_nothing() {
    let (mut editor, _, b) = marquee_fixture();
    editor.select_element(b, false).expect("select");

    drag(&mut editor, (42.0, 42.0), &[(46.0, 46.0)]);
    assert!(editor.document().selected_element_ids().is_empty());
}

#[test]
fn test_marquee_selects_intersecting_elements() {
    let (mut editor, a, _) = marquee_fixture();
    editor.on_pointer_down(&PointerEvent::at(42.0, 42.0));
    editor.on_pointer_move(&PointerEvent::at(52.0, 52.0));
    assert_eq!(editor.marquee_rect(), Some(Rect::new(42.0, 42.0, 10.0, 10.0)));
    editor.on_pointer_up(&PointerEvent::at(52.0, 52.0));

    let selected: Vec<ElementId> = editor.document().selected_element_ids().iter().copied().collect();
    assert_eq!(selected, vec![a]);
    assert_eq!(editor.history().undo_len(), 0);
}

#[test]
fn test_shift_marquee_extends_selection() {
    let (mut editor, a, b) = marquee_fixture();
    editor.select_element(b, false).expect("select");

    let shift = KeyModifiers::SHIFT;
    editor.on_pointer_down(&PointerEvent::at(10.0, 10.0).with_modifiers(shift));
    editor.on_pointer_move(&PointerEvent::at(100.0, 100.0).with_modifiers(shift));
    editor.on_pointer_up(&PointerEvent::at(100.0, 100.0).with_modifiers(shift));

    let selected: Vec<ElementId> = editor.document().selected_element_ids().iter().copied().collect();
    assert_eq!(selected, vec![b, a]);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_south_east_and_single_snapshot() {
    let (mut editor, id) = single_text();
    editor.select_element(id, false).expect("select");

    let start = PointerEvent::at(300.0, 140.0);
    assert_eq!(editor.resize_start(ResizeDirection::Se, &start), Disposition::Consumed);
    editor.on_pointer_move(&PointerEvent::at(330.0, 160.0));
    assert_eq!(number(&editor, id, "width"), Some(230.0));
    assert_eq!(number(&editor, id, "height"), Some(60.0));

    editor.on_pointer_move(&PointerEvent::at(340.0, 170.0));
    editor.on_pointer_up(&PointerEvent::at(340.0, 170.0));
    assert_eq!(number(&editor, id, "width"), Some(240.0));
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn test_resize_north_west_clamps_and_keeps_opposite_corner() {
    let (mut editor, id) = single_text();
    editor.select_element(id, false).expect("select");

    editor.resize_start(ResizeDirection::Nw, &PointerEvent::at(100.0, 100.0));
    editor.on_pointer_move(&PointerEvent::at(600.0, 600.0));
    editor.on_pointer_up(&PointerEvent::at(600.0, 600.0));

    assert_eq!(number(&editor, id, "width"), Some(20.0));
    assert_eq!(number(&editor, id, "height"), Some(20.0));
    assert_eq!(number(&editor, id, "left"), Some(280.0));
    assert_eq!(number(&editor, id, "top"), Some(120.0));
}

#[test]
fn test_resize_requires_single_unlocked_selection() {
    let (mut editor, id) = single_text();
    let start = PointerEvent::at(300.0, 140.0);
    assert_eq!(editor.resize_start(ResizeDirection::E, &start), Disposition::Ignored);

    editor.select_element(id, false).expect("select");
    editor.apply(|doc| doc.set_locked(id, true)).expect("lock");
    assert_eq!(editor.resize_start(ResizeDirection::E, &start), Disposition::Ignored);
    assert!(editor.is_idle());
}

// ============================================================================
// Keyboard, context menu and viewport
// ============================================================================

#[test]
fn test_delete_key_and_undo() {
    let (mut editor, id) = single_text();
    editor.select_element(id, false).expect("select");

    let disposition = editor.on_key_down(&KeyEvent::new("Delete", KeyModifiers::NONE));
    assert_eq!(disposition, Disposition::Consumed);
    assert!(editor.document().is_empty());
    assert!(editor.document().selected_element_ids().is_empty());

    editor.on_key_down(&KeyEvent::new("z", KeyModifiers::CTRL));
    assert!(editor.document().contains(id));

    let redo = KeyModifiers {
        shift: true,
        ..KeyModifiers::CTRL
    };
    editor.on_key_down(&KeyEvent::new("Z", redo));
    assert!(editor.document().is_empty());
}

#[test]
fn test_duplicate_shortcut_selects_clone() {
    let (mut editor, id) = single_text();
    editor.select_element(id, false).expect("select");
    editor.on_key_down(&KeyEvent::new("d", KeyModifiers::CTRL));

    let doc = editor.document();
    assert_eq!(doc.element_count(), 2);
    let clone = doc.selected_element_ids()[0];
    assert_ne!(clone, id);
    assert_eq!(doc.root_element_ids(), &[id, clone]);
    assert_eq!(number(&editor, clone, "left"), Some(120.0));
    assert_eq!(number(&editor, clone, "top"), Some(120.0));
}

#[test]
fn test_select_all_shortcut_picks_visible_roots() {
    let (mut editor, section, _) = flow_section();
    let hidden = editor.apply(|doc| {
        let id = doc.add_element(NewElement::new(ElementType::Image), None);
        doc.set_hidden(id, true).map(|()| id)
    });
    let hidden = hidden.expect("hide");

    editor.on_key_down(&KeyEvent::new("a", KeyModifiers::CTRL));
    let selected: Vec<ElementId> = editor.document().selected_element_ids().iter().copied().collect();
    assert_eq!(selected, vec![section]);
    assert!(!editor.document().is_selected(hidden));
}

#[test]
fn test_context_menu_lock_blocks_drag() {
    let (mut editor, id) = single_text();
    let right = PointerEvent::at(150.0, 120.0).with_button(PointerButton::Right);
    assert_eq!(editor.on_context_menu(&right), Disposition::Consumed);
    assert_eq!(editor.context_menu().and_then(|m| m.target), Some(id));

    assert!(editor.apply_context_action(ContextMenuAction::ToggleLock));
    assert!(editor.is_idle());
    assert!(editor.document().element(id).is_some_and(|e| e.locked));

    drag(&mut editor, (150.0, 120.0), &[(200.0, 200.0)]);
    assert_eq!(number(&editor, id, "left"), Some(100.0));
}

#[test]
fn test_context_menu_swallows_next_click() {
    let (mut editor, id) = single_text();
    editor.on_context_menu(&PointerEvent::at(600.0, 600.0).with_button(PointerButton::Right));
    assert!(editor.context_menu().is_some());

    let disposition = editor.on_pointer_down(&PointerEvent::at(150.0, 120.0));
    assert_eq!(disposition, Disposition::Consumed);
    assert!(editor.is_idle());
    assert!(!editor.document().is_selected(id));
}

#[test]
fn test_escape_closes_search_overlay() {
    let (mut editor, _) = single_text();
    assert_eq!(
        editor.on_key_down(&KeyEvent::new("Escape", KeyModifiers::NONE)),
        Disposition::Ignored
    );

    editor.open_search();
    assert!(editor.is_search_open());
    assert_eq!(
        editor.on_key_down(&KeyEvent::new("Escape", KeyModifiers::NONE)),
        Disposition::Consumed
    );
    assert!(!editor.is_search_open());
    assert!(editor.is_idle());
}

#[test]
fn test_middle_button_pans() {
    let (mut editor, _) = single_text();
    editor.on_pointer_down(&PointerEvent::at(500.0, 500.0).with_button(PointerButton::Middle));
    editor.on_pointer_move(&PointerEvent::at(450.0, 520.0));
    editor.on_pointer_up(&PointerEvent::at(450.0, 520.0));
    assert!((editor.viewport().pan_x + 50.0).abs() < f64::EPSILON);
    assert!((editor.viewport().pan_y - 20.0).abs() < f64::EPSILON);
    assert_eq!(editor.history().undo_len(), 0);
}

#[test]
fn test_selection_overlay_retries_until_laid_out() {
    let mut editor = Editor::new(StaticLayout::new(CANVAS));
    editor.on_drop(
        &PointerEvent::at(300.0, 300.0),
        r#"{"type":"new_element","elementType":"text"}"#,
    );
    let id = editor.document().root_element_ids()[0];
    assert!(editor.selection_box().is_none());

    editor.on_animation_frame();
    editor
        .spatial_mut()
        .set_box(id, Rect::new(300.0, 300.0, 200.0, 40.0));
    editor.on_animation_frame();
    assert_eq!(editor.selection_box(), Some(Rect::new(300.0, 300.0, 200.0, 40.0)));
}

#[test]
fn test_custom_config_threshold() {
    let config = EditorConfig::from_json(r#"{"dragThreshold": 20}"#).expect("valid config");
    let mut doc = Document::new();
    let id = doc.add_element(NewElement::new(ElementType::Text), None);
    let layout = StaticLayout::new(CANVAS).with_box(id, Rect::new(100.0, 100.0, 200.0, 40.0));
    let mut editor = Editor::with_config(config, layout)
        .expect("valid config")
        .with_document(doc);

    drag(&mut editor, (150.0, 120.0), &[(165.0, 120.0)]);
    assert_eq!(number(&editor, id, "left"), Some(100.0));
    assert_eq!(editor.history().undo_len(), 0);
}
