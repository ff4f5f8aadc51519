use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::services::CopyOptions;

const FRAME: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

#[derive(Default)]
struct Recorded {
    selects: Vec<SelectionInfo>,
    changes: Vec<(usize, usize)>,
}

struct RecordingListener(Rc<RefCell<Recorded>>);

impl EditorListener for RecordingListener {
    fn on_select(&mut self, info: &SelectionInfo) {
        self.0.borrow_mut().selects.push(info.clone());
    }

    fn on_selection_change(&mut self, start: usize, end: usize) {
        self.0.borrow_mut().changes.push((start, end));
    }
}

fn recording(editor: &mut RichEditor) -> Rc<RefCell<Recorded>> {
    let log = Rc::new(RefCell::new(Recorded::default()));
    editor.set_listener(Box::new(RecordingListener(Rc::clone(&log))));
    log
}

fn editor_with_text(text: &str) -> RichEditor {
    let mut editor = RichEditor::new();
    editor.set_layout(FRAME, FRAME);
    editor.add_text_span(TextSpanOptions::new(text));
    editor
}

/// "ab", an image, then "cd".
fn mixed_editor() -> RichEditor {
    let mut editor = editor_with_text("ab");
    editor.add_image_span(ImageSpanOptions {
        attributes: ImageAttributes::new("a.png"),
        offset: None,
    });
    editor.add_text_span(TextSpanOptions::new("cd"));
    editor
}

fn coverage(info: &SelectionInfo) -> Vec<(usize, (usize, usize))> {
    info.result_objects
        .iter()
        .map(|object| (object.span_index, object.offset_in_span))
        .collect()
}

#[test]
fn selector_distinguishes_valid_from_selected() {
    let mut selector = TextSelector::default();
    assert!(!selector.is_valid());
    selector.update_extend(3);
    assert!(selector.is_valid());
    assert!(!selector.is_selected());
    selector.update(5, 2);
    assert!(selector.is_selected());
    assert_eq!((selector.text_start(), selector.text_end()), (2, 5));
    selector.reset();
    assert_eq!(selector.base_offset(), None);
}

#[test]
fn set_selection_needs_focus() {
    let mut editor = editor_with_text("hello");
    assert!(!editor.set_selection(0, 2));
    assert_eq!(editor.selection(), None);
}

#[test]
fn set_selection_minus_one_selects_everything() {
    let mut editor = editor_with_text("hello");
    editor.request_focus();
    editor.set_selection(-1, -1);
    assert_eq!(editor.selection(), Some((0, 5)));
    assert_eq!(editor.caret_position(), 5);
}

#[test]
fn set_selection_clamps_into_the_document() {
    let mut editor = editor_with_text("hello");
    editor.request_focus();
    assert!(editor.set_selection(-5, 99));
    assert_eq!(editor.selection(), Some((0, 5)));
}

#[test]
fn reversed_selection_clears_it() {
    let mut editor = editor_with_text("hello");
    editor.request_focus();
    editor.set_selection(1, 3);
    assert!(!editor.set_selection(3, 1));
    assert_eq!(editor.selection(), None);
}

#[test]
fn unchanged_selection_is_reported_once() {
    let mut editor = editor_with_text("hello");
    let log = recording(&mut editor);
    editor.request_focus();
    assert!(editor.set_selection(1, 3));
    assert!(!editor.set_selection(1, 3));
    let log = log.borrow();
    assert_eq!(log.selects.len(), 1);
    assert_eq!(log.selects[0].selection, (1, 3));
    assert_eq!(editor.caret_position(), 3);
}

#[test]
fn select_all_covers_the_document() {
    let mut editor = editor_with_text("hello");
    editor.handle_on_select_all();
    assert_eq!(editor.selection(), Some((0, 5)));
    assert_eq!(editor.caret_position(), 5);
    assert!(editor.is_caret_visible());
}

#[test]
fn shift_extension_keeps_the_anchor() {
    let mut editor = editor_with_text("abcdef");
    editor.set_caret_position(1);
    assert!(editor.handle_select(CaretMoveIntent::Right));
    assert_eq!(editor.selection(), Some((1, 2)));
    assert!(editor.handle_select(CaretMoveIntent::Right));
    assert_eq!(editor.selection(), Some((1, 3)));
    assert!(editor.handle_select(CaretMoveIntent::Left));
    assert_eq!(editor.selection(), Some((1, 2)));
    assert_eq!(editor.caret_position(), 2);
}

#[test]
fn shift_extension_rejects_word_moves() {
    let mut editor = editor_with_text("abc def");
    editor.set_caret_position(1);
    assert!(!editor.handle_select(CaretMoveIntent::LeftWord));
    assert_eq!(editor.selection(), None);
}

#[test]
fn spans_info_reports_partial_text_coverage() {
    let mut editor = editor_with_text("ab");
    editor.add_text_span(TextSpanOptions::new("cd"));

    let info = editor.get_spans_info(1, 3, GetSpansMethod::GetSpans);
    assert_eq!(info.selection, (1, 3));
    assert_eq!(coverage(&info), vec![(0, (1, 2)), (1, (0, 1))]);

    let reversed = editor.get_spans_info(3, 1, GetSpansMethod::GetSpans);
    assert_eq!(coverage(&reversed), coverage(&info));

    let everything = editor.get_spans_info(-1, -1, GetSpansMethod::GetSpans);
    assert_eq!(everything.selection, (0, 4));
    assert_eq!(coverage(&everything), vec![(0, (0, 2)), (1, (0, 2))]);
}

#[test]
fn spans_info_reports_images_only_when_fully_covered() {
    let editor = mixed_editor();
    let info = editor.get_spans_info(2, 3, GetSpansMethod::GetSpans);
    assert_eq!(info.result_objects.len(), 1);
    let object = &info.result_objects[0];
    assert_eq!(object.kind, SpanResultKind::Image);
    assert_eq!(object.value, "a.png");
    assert!(object.image.is_some());

    let info = editor.get_spans_info(0, 5, GetSpansMethod::GetSpans);
    let kinds: Vec<SpanResultKind> = info.result_objects.iter().map(|object| object.kind).collect();
    assert_eq!(
        kinds,
        vec![SpanResultKind::Text, SpanResultKind::Image, SpanResultKind::Text]
    );
}

#[test]
fn spans_info_is_empty_for_empty_ranges() {
    let editor = editor_with_text("hello");
    assert!(editor.get_spans_info(2, 2, GetSpansMethod::GetSpans).is_empty());
    assert!(editor.get_spans_info(-1, -1, GetSpansMethod::OnSelect).is_empty());
    assert!(RichEditor::new().get_spans_info(0, 3, GetSpansMethod::GetSpans).is_empty());
}

#[test]
fn selected_text_skips_images() {
    let editor = mixed_editor();
    assert_eq!(editor.get_selected_text(0, 5), "abcd");
    assert_eq!(editor.get_selected_text(4, 1), "bc");
}

#[test]
fn selection_type_follows_the_covered_spans() {
    let mut editor = mixed_editor();
    editor.request_focus();
    editor.set_selection(0, 2);
    assert_eq!(editor.selected_type(), Some(SelectionType::Text));
    editor.set_selection(2, 3);
    assert_eq!(editor.selected_type(), Some(SelectionType::Image));
    editor.set_selection(0, 5);
    assert_eq!(editor.selected_type(), Some(SelectionType::Mixed));
}

#[test]
fn reset_reports_an_empty_selection() {
    let mut editor = editor_with_text("hello");
    let log = recording(&mut editor);
    editor.request_focus();
    editor.set_selection(1, 3);
    editor.reset_selection();

    let log = log.borrow();
    assert_eq!(log.selects.len(), 2);
    assert!(log.selects[1].is_empty());
    assert_eq!(editor.selected_type(), None);
}

#[test]
fn selection_change_is_reported_only_when_it_moves() {
    let mut editor = editor_with_text("hello");
    let log = recording(&mut editor);
    editor.handle_selection_change(1, 3);
    editor.handle_selection_change(1, 3);
    editor.handle_selection_change(3, 1);
    assert_eq!(log.borrow().changes, vec![(1, 3)]);
    assert_eq!(editor.text_selector().base_offset(), Some(3));
    editor.handle_selection_change(3, 2);
    assert_eq!(log.borrow().changes, vec![(1, 3), (2, 3)]);
}

#[test]
fn reselecting_a_reversed_range_is_not_a_change() {
    let mut editor = editor_with_text("hello");
    editor.request_focus();
    editor.handle_selection_change(3, 1);
    let log = recording(&mut editor);
    assert!(!editor.set_selection(1, 3));
    assert!(log.borrow().selects.is_empty());
    assert_eq!(editor.selection(), Some((1, 3)));
}

#[test]
fn word_selection_after_a_trailing_image_selects_the_image() {
    let mut editor = editor_with_text("ab");
    editor.add_image_span(ImageSpanOptions {
        attributes: ImageAttributes::new("a.png"),
        offset: None,
    });
    assert_eq!(editor.init_selection(Point::new(40.0, 5.0)), (2, 3));
}

#[test]
fn long_press_selects_the_character_under_the_point() {
    let mut editor = editor_with_text("abcdef");
    let log = recording(&mut editor);
    assert!(editor.handle_long_press(Point::new(18.0, 5.0)));

    assert_eq!(editor.selection(), Some((2, 3)));
    assert_eq!(editor.caret_position(), 3);
    assert!(editor.is_focused());
    assert!(!editor.is_caret_visible());
    assert_eq!(log.borrow().selects.len(), 1);

    let handle = editor.text_selector().first_handle;
    assert_eq!(handle.x0, 16.0);
    assert_eq!(handle.width(), editor.config().handle_line_width);
}

#[test]
fn long_press_is_ignored_when_copying_is_disabled() {
    let config = EditorConfig {
        copy_options: CopyOptions::None,
        ..EditorConfig::default()
    };
    let mut editor = RichEditor::with_config(config);
    editor.set_layout(FRAME, FRAME);
    editor.add_text_span(TextSpanOptions::new("abcdef"));
    assert!(!editor.handle_long_press(Point::new(18.0, 5.0)));
    assert_eq!(editor.selection(), None);
}

#[test]
fn dragging_the_second_handle_extends_the_selection() {
    let mut editor = editor_with_text("abcdef");
    let log = recording(&mut editor);
    editor.handle_long_press(Point::new(18.0, 5.0));

    let handle = Rect::new(40.0, 2.0, 42.0, 12.0);
    editor.on_handle_move(handle, false);
    assert_eq!(editor.selection(), Some((2, 5)));
    assert_eq!(editor.caret_position(), 5);
    assert_eq!(log.borrow().changes.last(), Some(&(2, 5)));

    editor.on_handle_move_done(handle, false);
    let log = log.borrow();
    assert_eq!(log.selects.last().map(|info| info.selection), Some((2, 5)));
    assert_eq!(editor.text_selector().second_handle.x0, 40.0);
}

#[test]
fn press_inside_the_selection_is_detected() {
    let mut editor = editor_with_text("abcdef");
    editor.request_focus();
    editor.set_selection(1, 4);
    assert!(editor.between_selected_position(Point::new(20.0, 5.0)));
    assert!(!editor.between_selected_position(Point::new(40.0, 5.0)));
}
