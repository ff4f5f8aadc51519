use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::services::{DetectRequest, DetectedEntity, EntityScanner, EntityType, Reply};

const FRAME: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);
const MAIL_AND_PHONE: &str = "mail me at bob@example.com or call 555-123-4567";

/// Detector that never answers by itself.
struct PendingDetector {
    requests: Rc<RefCell<Vec<DetectRequest>>>,
}

impl DataDetector for PendingDetector {
    fn detect(&mut self, request: &DetectRequest) -> Reply<DetectResult> {
        self.requests.borrow_mut().push(request.clone());
        Reply::Pending
    }

    fn adjust_cursor_position(&mut self, _position: usize, _context: &str) -> Option<usize> {
        None
    }

    fn adjust_word_selection(&mut self, _position: usize, _context: &str) -> Option<(usize, usize)> {
        None
    }
}

#[derive(Default)]
struct AiLog {
    results: Vec<usize>,
    clicks: Vec<AiSpan>,
}

struct AiListener(Rc<RefCell<AiLog>>);

impl EditorListener for AiListener {
    fn on_ai_result(&mut self, spans: &[AiSpan]) {
        self.0.borrow_mut().results.push(spans.len());
    }

    fn on_ai_span_click(&mut self, span: &AiSpan) {
        self.0.borrow_mut().clicks.push(span.clone());
    }
}

fn editor_with_text(text: &str) -> RichEditor {
    let mut editor = RichEditor::new();
    editor.set_layout(FRAME, FRAME);
    editor.add_text_span(TextSpanOptions::new(text));
    editor
}

fn scanning_editor(text: &str) -> RichEditor {
    let mut editor = editor_with_text(text);
    editor.set_data_detector(Box::new(EntityScanner::new()));
    editor.set_text_detect_enable(true);
    editor
}

fn pending_editor(text: &str) -> (RichEditor, Rc<RefCell<Vec<DetectRequest>>>) {
    let mut editor = editor_with_text(text);
    let requests = Rc::new(RefCell::new(Vec::new()));
    editor.set_data_detector(Box::new(PendingDetector {
        requests: Rc::clone(&requests),
    }));
    editor.set_text_detect_enable(true);
    (editor, requests)
}

fn with_listener(editor: &mut RichEditor) -> Rc<RefCell<AiLog>> {
    let log = Rc::new(RefCell::new(AiLog::default()));
    editor.set_listener(Box::new(AiListener(Rc::clone(&log))));
    log
}

fn entity(entity_type: EntityType, char_offset: isize, text: &str) -> DetectedEntity {
    DetectedEntity {
        entity_type,
        char_offset,
        text: text.to_string(),
    }
}

fn spans(editor: &RichEditor) -> Vec<(usize, usize, EntityType)> {
    editor
        .ai_spans()
        .map(|span| (span.start, span.end, span.entity_type))
        .collect()
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[test]
fn detect_types_are_parsed_deduplicated_and_sorted() {
    let mut editor = RichEditor::new();
    editor.set_text_detect_types("url, email,phoneNum,url,date");
    assert_eq!(
        editor.text_detect_types(),
        &[EntityType::PhoneNumber, EntityType::Url, EntityType::Email]
    );

    editor.set_text_detect_types("");
    assert!(editor.text_detect_types().is_empty());
}

#[test]
fn detection_runs_after_the_quiet_period() {
    let mut editor = scanning_editor(MAIL_AND_PHONE);
    editor.advance(ms(299));
    assert!(spans(&editor).is_empty());

    editor.advance(ms(1));
    assert_eq!(
        spans(&editor),
        vec![(11, 26, EntityType::Email), (35, 47, EntityType::PhoneNumber)]
    );
    assert!(editor.is_ai_detect_initialized());
    assert_eq!(
        editor.ai_menu_options(EntityType::PhoneNumber),
        Some(&["Call".to_string(), "Copy".to_string()][..])
    );
}

#[test]
fn focus_cancels_pending_detection() {
    let mut editor = scanning_editor(MAIL_AND_PHONE);
    editor.request_focus();
    editor.advance(ms(1000));
    assert!(spans(&editor).is_empty());
    assert!(!editor.is_ai_detect_initialized());
}

#[test]
fn blur_schedules_detection() {
    let mut editor = scanning_editor(MAIL_AND_PHONE);
    editor.request_focus();
    editor.lose_focus();
    editor.advance(ms(300));
    assert_eq!(spans(&editor).len(), 2);
}

#[test]
fn disabling_detection_drops_entities() {
    let mut editor = scanning_editor(MAIL_AND_PHONE);
    editor.advance(ms(300));
    editor.set_text_detect_enable(false);
    assert!(spans(&editor).is_empty());
    assert!(!editor.text_detect_enable());
}

#[test]
fn editing_clears_entities_until_the_next_pass() {
    let mut editor = scanning_editor(MAIL_AND_PHONE);
    editor.advance(ms(300));
    editor.set_caret_position(0);
    editor.insert_value("> ");
    assert!(spans(&editor).is_empty());

    editor.advance(ms(300));
    assert_eq!(
        spans(&editor),
        vec![(13, 28, EntityType::Email), (37, 49, EntityType::PhoneNumber)]
    );
}

#[test]
fn results_for_outdated_text_are_dropped() {
    let (mut editor, requests) = pending_editor("call 5551234567 now");
    editor.advance(ms(300));
    assert_eq!(requests.borrow().len(), 1);

    editor.insert_value("!");
    let result = DetectResult {
        entities: vec![entity(EntityType::PhoneNumber, 5, "5551234567")],
        menu_options: Vec::new(),
    };
    editor.deliver_detect_result(0, result);
    editor.advance(Duration::ZERO);
    assert!(spans(&editor).is_empty());
}

#[test]
fn invalid_and_overlapping_entities_are_filtered() {
    let (mut editor, _requests) = pending_editor("call 5551234567 now");
    let log = with_listener(&mut editor);
    editor.advance(ms(300));

    let result = DetectResult {
        entities: vec![
            entity(EntityType::PhoneNumber, 5, "5551234567"),
            entity(EntityType::PhoneNumber, 8, "1234567"),
            entity(EntityType::Url, 0, "xxxx"),
            entity(EntityType::Email, -1, "call"),
            entity(EntityType::Email, 16, ""),
        ],
        menu_options: Vec::new(),
    };
    editor.deliver_detect_result(0, result);
    editor.advance(Duration::ZERO);

    assert_eq!(spans(&editor), vec![(5, 15, EntityType::PhoneNumber)]);
    assert_eq!(log.borrow().results, vec![2]);
    assert!(editor.is_ai_detect_initialized());
}

#[test]
fn long_documents_are_detected_in_overlapping_windows() {
    let config = EditorConfig {
        ai_text_max_length: 10,
        ai_text_gap: 4,
        ..EditorConfig::default()
    };
    let mut editor = RichEditor::with_config(config);
    editor.add_text_span(TextSpanOptions::new("abcdefghijklmnopqrst"));
    let requests = Rc::new(RefCell::new(Vec::new()));
    editor.set_data_detector(Box::new(PendingDetector {
        requests: Rc::clone(&requests),
    }));
    editor.set_text_detect_enable(true);
    editor.advance(ms(300));

    let starts: Vec<usize> = requests.borrow().iter().map(|request| request.start_pos).collect();
    assert_eq!(starts, vec![0, 6, 12, 18]);
    assert_eq!(requests.borrow()[3].text, "st");
}

#[test]
fn clicking_an_entity_reports_it_instead_of_moving_the_caret() {
    let mut editor = scanning_editor(MAIL_AND_PHONE);
    let log = with_listener(&mut editor);
    editor.advance(ms(300));

    editor.handle_click(Point::new(98.0, 5.0));
    let log = log.borrow();
    assert_eq!(log.clicks.len(), 1);
    assert_eq!(log.clicks[0].content, "bob@example.com");
    assert_eq!(editor.caret_position(), 0);
    assert!(!editor.is_focused());
}

#[test]
fn clicks_snap_to_entity_boundaries() {
    let mut editor = scanning_editor("call 555-123-4567 now");
    assert_eq!(editor.adjust_cursor_position(7), 5);
    assert_eq!(editor.adjust_cursor_position(15), 17);
    assert_eq!(editor.adjust_cursor_position(2), 2);
    assert_eq!(editor.adjust_cursor_position(0), 0);

    editor.set_text_detect_enable(false);
    assert_eq!(editor.adjust_cursor_position(7), 7);
}

#[test]
fn clicks_on_the_text_rect_edge_are_not_snapped() {
    // Eight columns: "call " / "555-123-" / "4567 now".
    let narrow = Rect::new(0.0, 0.0, 64.0, 300.0);
    let mut editor = RichEditor::new();
    editor.set_layout(narrow, narrow);
    editor.add_text_span(TextSpanOptions::new("call 555-123-4567 now"));
    editor.set_data_detector(Box::new(EntityScanner::new()));
    editor.set_text_detect_enable(true);

    assert_eq!(editor.adjust_cursor_position(13), 13);
    assert_eq!(editor.adjust_cursor_position(7), 5);
}

#[test]
fn word_selection_widens_to_the_entity() {
    let mut editor = scanning_editor("call 555-123-4567 now");
    assert_eq!(editor.adjust_word_selection(7, 8), Some((5, 17)));
    assert_eq!(editor.adjust_word_selection(1, 2), None);

    editor.set_text_detect_enable(false);
    assert_eq!(editor.adjust_word_selection(7, 8), None);
}

#[test]
fn entity_context_restarts_after_placeholders() {
    let mut editor = editor_with_text("ab");
    editor.add_image_span(ImageSpanOptions {
        attributes: ImageAttributes::new("a.png"),
        offset: None,
    });
    editor.add_text_span(TextSpanOptions::new("cd"));
    editor.add_symbol_span(SymbolSpanOptions {
        code_point: '★',
        style: None,
        offset: None,
    });
    editor.add_text_span(TextSpanOptions::new("ef"));

    assert_eq!(editor.get_position_spans_text(1), ("ab".to_string(), Some(0)));
    assert_eq!(editor.get_position_spans_text(4), ("cd".to_string(), Some(3)));
    assert_eq!(editor.get_position_spans_text(7), ("ef".to_string(), Some(6)));
}
