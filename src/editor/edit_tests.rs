use std::cell::RefCell;
use std::rc::Rc;

use super::*;

#[derive(Default)]
struct Recorded {
    inserts: Vec<InsertValueInfo>,
    completed: Vec<SpanResult>,
    deletes: Vec<DeleteValue>,
    delete_completions: usize,
}

struct RecordingListener {
    log: Rc<RefCell<Recorded>>,
    allow_insert: bool,
    allow_delete: bool,
}

impl EditorListener for RecordingListener {
    fn about_to_ime_input(&mut self, info: &InsertValueInfo) -> bool {
        self.log.borrow_mut().inserts.push(info.clone());
        self.allow_insert
    }

    fn on_ime_input_complete(&mut self, result: &SpanResult) {
        self.log.borrow_mut().completed.push(result.clone());
    }

    fn about_to_delete(&mut self, value: &DeleteValue) -> bool {
        self.log.borrow_mut().deletes.push(value.clone());
        self.allow_delete
    }

    fn on_delete_complete(&mut self) {
        self.log.borrow_mut().delete_completions += 1;
    }
}

fn recording(editor: &mut RichEditor, allow_insert: bool, allow_delete: bool) -> Rc<RefCell<Recorded>> {
    let log = Rc::new(RefCell::new(Recorded::default()));
    editor.set_listener(Box::new(RecordingListener {
        log: Rc::clone(&log),
        allow_insert,
        allow_delete,
    }));
    log
}

fn editor_with_spans(texts: &[&str]) -> RichEditor {
    let mut editor = RichEditor::new();
    for text in texts {
        editor.add_text_span(TextSpanOptions::new(*text));
    }
    editor
}

fn add_image(editor: &mut RichEditor, offset: Option<isize>) {
    editor.add_image_span(ImageSpanOptions {
        attributes: ImageAttributes::new("a.png"),
        offset,
    });
}

fn span_texts(editor: &RichEditor) -> Vec<String> {
    editor.spans().iter().map(Span::text).collect()
}

#[test]
fn typing_into_an_empty_document_creates_a_default_span() {
    let mut editor = RichEditor::new();
    assert!(editor.insert_value("hi"));
    assert_eq!(span_texts(&editor), vec!["hi"]);
    let size = editor.spans()[0].text_style().map(|style| style.font_size);
    assert_eq!(size, Some(16.0));
    assert_eq!(editor.caret_position(), 2);
}

#[test]
fn empty_insert_is_rejected() {
    let mut editor = editor_with_spans(&["ab"]);
    assert!(!editor.insert_value(""));
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn typing_at_a_span_boundary_extends_the_previous_span() {
    let mut editor = editor_with_spans(&["ab", "cd"]);
    editor.set_caret_position(2);
    editor.insert_value("XY");
    assert_eq!(span_texts(&editor), vec!["abXY", "cd"]);
}

#[test]
fn typing_after_a_newline_goes_into_the_next_span() {
    let mut editor = editor_with_spans(&["ab\n", "cd"]);
    editor.set_caret_position(3);
    editor.insert_value("X");
    assert_eq!(span_texts(&editor), vec!["ab\n", "Xcd"]);
}

#[test]
fn typing_after_an_image_goes_into_the_next_span() {
    let mut editor = editor_with_spans(&["ab"]);
    add_image(&mut editor, None);
    editor.add_text_span(TextSpanOptions::new("cd"));
    editor.set_caret_position(3);
    editor.insert_value("X");
    assert_eq!(span_texts(&editor), vec!["ab", " ", "Xcd"]);
}

#[test]
fn typing_after_a_trailing_image_opens_a_span() {
    let mut editor = editor_with_spans(&["ab"]);
    add_image(&mut editor, None);
    editor.set_caret_position(3);
    editor.insert_value("X");
    assert_eq!(span_texts(&editor), vec!["ab", " ", "X"]);
    assert!(editor.spans()[2].is_text());
}

#[test]
fn typing_replaces_the_selection() {
    let mut editor = editor_with_spans(&["hello"]);
    editor.request_focus();
    editor.set_selection(1, 4);
    assert!(editor.insert_value("X"));
    assert_eq!(editor.content_text(), "hXo");
    assert_eq!(editor.caret_position(), 2);
    assert_eq!(editor.selection(), None);
}

#[test]
fn inserted_newlines_split_the_span() {
    let mut editor = editor_with_spans(&["abcd"]);
    editor.set_caret_position(2);
    editor.insert_value("x\ny");
    assert_eq!(span_texts(&editor), vec!["abx\n", "ycd"]);
    assert_eq!(editor.caret_position(), 5);
}

#[test]
fn typing_after_a_trailing_newline_opens_a_span() {
    let mut editor = RichEditor::new();
    editor.insert_value("ab\n");
    editor.insert_value("x");
    assert_eq!(span_texts(&editor), vec!["ab\n", "x"]);
    assert_eq!(editor.caret_position(), 4);
    let ranges: Vec<(usize, usize)> = editor
        .get_paragraph_info(0, editor.text_len())
        .iter()
        .map(|info| info.range)
        .collect();
    assert_eq!(ranges, vec![(0, 3), (3, 4)]);
}

#[test]
fn span_opened_after_a_newline_keeps_its_style() {
    let mut editor = RichEditor::new();
    let red = TextStyle::default().with_color(Color::from_rgb(200, 0, 0));
    editor.add_text_span(TextSpanOptions {
        style: Some(red.clone()),
        ..TextSpanOptions::new("ab\n")
    });
    editor.set_caret_position(3);
    editor.insert_value("x");
    assert_eq!(span_texts(&editor), vec!["ab\n", "x"]);
    assert_eq!(editor.spans()[1].text_style(), Some(&red));
}

#[test]
fn listener_sees_and_can_veto_insertions() {
    let mut editor = editor_with_spans(&["abc"]);
    let log = recording(&mut editor, false, true);
    editor.set_caret_position(1);
    assert!(!editor.insert_value("X"));
    assert_eq!(editor.content_text(), "abc");
    assert_eq!(editor.history().undo_len(), 1);
    assert_eq!(
        log.borrow().inserts,
        vec![InsertValueInfo {
            insert_offset: 1,
            insert_value: "X".to_string(),
        }]
    );
    assert!(log.borrow().completed.is_empty());
}

#[test]
fn completed_insertion_reports_the_receiving_span() {
    let mut editor = editor_with_spans(&["abc"]);
    let log = recording(&mut editor, true, true);
    editor.set_caret_position(1);
    assert!(editor.insert_value("X"));

    let log = log.borrow();
    let result = &log.completed[0];
    assert_eq!(result.span_index, 0);
    assert_eq!(result.offset_in_span, 1);
    assert_eq!(result.erase_length, 1);
    assert_eq!(result.value, "aXbc");
    assert_eq!(result.kind, SpanResultKind::Text);
}

#[test]
fn listener_can_veto_deletions() {
    let mut editor = editor_with_spans(&["abc"]);
    let log = recording(&mut editor, true, false);
    editor.set_caret_position(3);
    assert!(!editor.delete_backward(1));
    assert_eq!(editor.content_text(), "abc");
    assert_eq!(log.borrow().deletes.len(), 1);
    assert_eq!(log.borrow().delete_completions, 0);
}

#[test]
fn backward_delete_over_an_image_and_text() {
    let mut editor = editor_with_spans(&["ab"]);
    add_image(&mut editor, None);
    editor.add_text_span(TextSpanOptions::new("cd"));
    let log = recording(&mut editor, true, true);
    editor.set_caret_position(4);

    assert!(editor.delete_backward(2));
    assert_eq!(span_texts(&editor), vec!["ab", "d"]);
    assert_eq!(editor.caret_position(), 2);

    let log = log.borrow();
    let value = &log.deletes[0];
    assert_eq!(value.offset, 2);
    assert_eq!(value.length, 2);
    assert_eq!(value.direction, DeleteDirection::Backward);
    let kinds: Vec<SpanResultKind> = value.spans.iter().map(|span| span.kind).collect();
    assert_eq!(kinds, vec![SpanResultKind::Image, SpanResultKind::Text]);
    assert_eq!(log.delete_completions, 1);
}

#[test]
fn forward_delete_keeps_the_caret() {
    let mut editor = editor_with_spans(&["ab", "cd"]);
    editor.set_caret_position(1);
    assert!(editor.delete_forward(2));
    assert_eq!(editor.content_text(), "ad");
    assert_eq!(editor.caret_position(), 1);
}

#[test]
fn forward_delete_at_the_end_does_nothing() {
    let mut editor = editor_with_spans(&["ab"]);
    editor.set_caret_position(2);
    assert!(!editor.delete_forward(1));
    assert!(!editor.handle_on_delete(false));
    assert!(editor.handle_on_delete(true));
    assert_eq!(editor.content_text(), "a");
}

#[test]
fn delete_spans_defaults_to_the_whole_document() {
    let mut editor = editor_with_spans(&["hello", " world"]);
    editor.set_caret_position(8);
    assert!(editor.delete_spans(RangeOptions::default()));
    assert_eq!(editor.content_text(), "");
    assert!(editor.spans().is_empty());
    assert_eq!(editor.caret_position(), 0);
}

#[test]
fn delete_spans_swaps_reversed_bounds() {
    let mut editor = editor_with_spans(&["hello world"]);
    let range = RangeOptions {
        start: Some(7),
        end: Some(2),
    };
    assert!(editor.delete_spans(range));
    assert_eq!(editor.content_text(), "heorld");
    assert_eq!(editor.caret_position(), 2);
}

#[test]
fn delete_spans_out_of_range_is_rejected() {
    let mut editor = editor_with_spans(&["hello world"]);
    let range = RangeOptions {
        start: Some(20),
        end: Some(30),
    };
    assert!(!editor.delete_spans(range));
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn image_before_the_caret_shifts_it() {
    let mut editor = editor_with_spans(&["abcd"]);
    editor.set_caret_position(3);
    add_image(&mut editor, Some(1));
    assert_eq!(editor.content_text(), "a bcd");
    assert_eq!(editor.caret_position(), 2);

    add_image(&mut editor, None);
    assert_eq!(editor.caret_position(), editor.text_len());
}

#[test]
fn text_span_at_an_offset_splits_its_owner() {
    let mut editor = editor_with_spans(&["hello world"]);
    let index = editor.add_text_span(TextSpanOptions::new("XX").at(5));
    assert_eq!(index, 1);
    assert_eq!(span_texts(&editor), vec!["hello", "XX", " world"]);
    assert_eq!(editor.caret_position(), 0);
}

#[test]
fn text_span_past_the_end_appends() {
    let mut editor = editor_with_spans(&["ab"]);
    let index = editor.add_text_span(TextSpanOptions::new("cd").at(40));
    assert_eq!(index, 1);
    assert_eq!(editor.content_text(), "abcd");
}

#[test]
fn symbol_span_is_one_character() {
    let mut editor = editor_with_spans(&["ab"]);
    editor.add_symbol_span(SymbolSpanOptions {
        code_point: '★',
        style: None,
        offset: Some(1),
    });
    assert_eq!(span_texts(&editor), vec!["a", "★", "b"]);
    assert_eq!(editor.spans()[1].content().kind_label(), "Symbol");
    assert_eq!(editor.text_len(), 3);
}

#[test]
fn text_around_the_cursor() {
    let mut editor = editor_with_spans(&["hello world"]);
    editor.set_caret_position(5);
    assert_eq!(editor.get_left_text_of_cursor(3), "llo");
    assert_eq!(editor.get_right_text_of_cursor(3), " wo");
    assert_eq!(editor.get_left_text_of_cursor(99), "hello");
    assert_eq!(editor.text_index_at_cursor(), 5);

    editor.request_focus();
    editor.set_selection(0, 5);
    assert_eq!(editor.get_left_text_of_cursor(2), "");
    assert_eq!(editor.get_right_text_of_cursor(2), " w");
}

#[test]
fn huge_counts_around_the_cursor_clamp_to_the_text() {
    let mut editor = editor_with_spans(&["hello"]);
    editor.set_caret_position(2);
    assert_eq!(editor.get_right_text_of_cursor(usize::MAX), "llo");
    assert_eq!(editor.get_left_text_of_cursor(usize::MAX), "he");
}
