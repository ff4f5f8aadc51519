use std::time::Duration;

use super::*;
use crate::services::MemoryClipboard;

const FRAME: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

fn editor_with_text(text: &str) -> RichEditor {
    let mut editor = RichEditor::new();
    editor.set_layout(FRAME, FRAME);
    editor.add_text_span(TextSpanOptions::new(text));
    editor
}

fn menu(editor: &RichEditor) -> Option<SelectMenuInfo> {
    editor.select_overlay().map(|overlay| overlay.menu)
}

#[test]
fn long_press_shows_the_menu_for_the_picked_word() {
    let mut editor = editor_with_text("hello world");
    assert!(editor.select_overlay().is_none());
    assert!(editor.handle_long_press(Point::new(18.0, 5.0)));

    assert!(editor.is_select_overlay_on());
    assert_eq!(
        menu(&editor),
        Some(SelectMenuInfo {
            show_copy: true,
            show_cut: true,
            show_copy_all: true,
            show_paste: false,
            menu_is_show: true,
        })
    );
    let overlay = editor.select_overlay().copied().unwrap_or_default();
    assert_eq!(overlay.first_handle, editor.text_selector().first_handle);
    assert_eq!(overlay.second_handle, editor.text_selector().second_handle);
}

#[test]
fn paste_entry_appears_once_the_clipboard_answers() {
    let mut editor = editor_with_text("hello");
    let clipboard = MemoryClipboard::new();
    clipboard.set_text("x");
    editor.set_clipboard(Box::new(clipboard.clone()));

    editor.handle_long_press(Point::new(18.0, 5.0));
    assert_eq!(menu(&editor).map(|menu| menu.show_paste), Some(false));
    editor.advance(Duration::ZERO);
    assert_eq!(menu(&editor).map(|menu| menu.show_paste), Some(true));
}

#[test]
fn selecting_everything_hides_copy_all() {
    let mut editor = editor_with_text("hello");
    editor.handle_long_press(Point::new(18.0, 5.0));
    editor.handle_on_select_all();
    let menu = menu(&editor).unwrap_or_default();
    assert!(!menu.show_copy_all);
    assert!(menu.show_copy);
}

#[test]
fn handle_release_opens_and_set_selection_refreshes() {
    let mut editor = editor_with_text("hello");
    editor.request_focus();
    editor.set_selection(0, 2);
    assert!(!editor.is_select_overlay_on());

    editor.on_handle_move_done(Rect::ZERO, false);
    assert_eq!(menu(&editor).map(|menu| menu.show_copy_all), Some(true));

    editor.set_selection(0, 5);
    assert_eq!(menu(&editor).map(|menu| menu.show_copy_all), Some(false));
}

#[test]
fn editing_closes_the_overlay() {
    let mut editor = editor_with_text("hello");
    editor.handle_long_press(Point::new(18.0, 5.0));
    assert!(editor.insert_value("X"));
    assert!(!editor.is_select_overlay_on());
    assert_eq!(editor.content_text(), "heXlo");
}

#[test]
fn blur_and_copy_close_the_overlay() {
    let mut editor = editor_with_text("hello");
    editor.handle_long_press(Point::new(18.0, 5.0));
    editor.lose_focus();
    assert!(editor.select_overlay().is_none());

    editor.set_clipboard(Box::new(MemoryClipboard::new()));
    editor.handle_long_press(Point::new(18.0, 5.0));
    assert!(editor.handle_on_copy());
    assert!(!editor.is_select_overlay_on());
}

#[test]
fn empty_document_has_nothing_to_offer() {
    let mut editor = RichEditor::new();
    editor.set_layout(FRAME, FRAME);
    editor.show_select_overlay();
    assert_eq!(menu(&editor), Some(SelectMenuInfo::default()));
}
