use kurbo::Size;

use super::*;

fn editor_with_text(text: &str) -> RichEditor {
    let mut editor = RichEditor::new();
    editor.add_text_span(TextSpanOptions::new(text));
    editor
}

fn span_texts(editor: &RichEditor) -> Vec<String> {
    editor.spans().iter().map(Span::text).collect()
}

fn bold() -> UpdateSpanStyle {
    UpdateSpanStyle {
        font_weight: Some(FontWeight::Bold),
        ..UpdateSpanStyle::default()
    }
}

fn is_bold(span: &Span) -> bool {
    span.text_style()
        .is_some_and(|style| style.font_weight.is_bold())
}

fn alignments(editor: &RichEditor) -> Vec<TextAlign> {
    editor
        .get_paragraph_info(0, editor.text_len())
        .iter()
        .map(|info| info.text_align)
        .collect()
}

#[test]
fn style_update_splits_straddling_spans() {
    let mut editor = editor_with_text("HelloWorld");
    assert!(editor.update_span_style(2, 7, &bold()));
    assert_eq!(span_texts(&editor), vec!["He", "lloWo", "rld"]);
    let styled: Vec<bool> = editor.spans().iter().map(is_bold).collect();
    assert_eq!(styled, vec![false, true, false]);
}

#[test]
fn style_update_swaps_reversed_bounds() {
    let mut editor = editor_with_text("HelloWorld");
    assert!(editor.update_span_style(7, 2, &bold()));
    assert_eq!(span_texts(&editor), vec!["He", "lloWo", "rld"]);
}

#[test]
fn style_update_ignores_empty_ranges() {
    let mut editor = editor_with_text("abc");
    assert!(!editor.update_span_style(1, 1, &bold()));
    assert!(!editor.update_span_style(5, 9, &bold()));
    assert_eq!(span_texts(&editor), vec!["abc"]);
}

#[test]
fn style_update_clamps_the_end() {
    let mut editor = editor_with_text("abc");
    assert!(editor.update_span_style(1, 99, &bold()));
    assert_eq!(span_texts(&editor), vec!["a", "bc"]);
    assert!(is_bold(&editor.spans()[1]));
}

#[test]
fn new_style_starts_from_the_default_size() {
    let mut editor = editor_with_text("abc");
    let update = UpdateSpanStyle {
        text_color: Some(Color::from_rgb(200, 0, 0)),
        ..UpdateSpanStyle::default()
    };
    editor.update_span_style(0, 3, &update);
    let style = editor.spans()[0].text_style().cloned().unwrap_or_default();
    assert_eq!(style.font_size, 16.0);
    assert_eq!(style.text_color.rgb(), (200, 0, 0));
}

#[test]
fn image_updates_only_touch_images() {
    let mut editor = editor_with_text("ab");
    editor.add_image_span(ImageSpanOptions {
        attributes: ImageAttributes::new("a.png"),
        offset: None,
    });
    editor.add_text_span(TextSpanOptions::new("cd"));

    let update = UpdateSpanStyle {
        image_size: Some(Size::new(10.0, 10.0)),
        ..UpdateSpanStyle::default()
    };
    assert!(editor.update_span_style(0, 5, &update));
    match editor.spans()[1].content() {
        SpanContent::Image(attributes) => {
            assert_eq!(attributes.size, Some(Size::new(10.0, 10.0)))
        }
        other => panic!("expected an image, got {other:?}"),
    }
    assert!(editor.spans()[0].text_style().is_none());
    assert!(editor.spans()[2].text_style().is_none());
}

#[test]
fn symbols_take_text_styles() {
    let mut editor = RichEditor::new();
    editor.add_symbol_span(SymbolSpanOptions {
        code_point: '★',
        style: None,
        offset: None,
    });
    assert!(editor.update_span_style(0, 1, &bold()));
    assert!(is_bold(&editor.spans()[0]));
}

#[test]
fn typing_style_at_the_end_opens_a_new_span() {
    let mut editor = editor_with_text("ab");
    editor.set_typing_style(Some(TextStyle::default().with_weight(FontWeight::Bold)));
    editor.set_caret_position(2);
    assert!(editor.insert_value("X"));
    assert!(editor.insert_value("Y"));
    assert_eq!(span_texts(&editor), vec!["ab", "XY"]);
    assert!(is_bold(&editor.spans()[1]));
}

#[test]
fn typing_style_in_the_middle_splits_the_span() {
    let mut editor = editor_with_text("abc");
    editor.set_typing_style(Some(TextStyle::default().with_weight(FontWeight::Bold)));
    editor.set_caret_position(1);
    assert!(editor.insert_value("X"));
    assert_eq!(span_texts(&editor), vec!["a", "X", "bc"]);
    assert_eq!(editor.caret_position(), 2);
}

#[test]
fn same_typing_style_means_equal_or_both_unset() {
    let mut editor = editor_with_text("ab");
    assert!(editor.has_same_typing_style(&editor.spans()[0]));

    editor.set_typing_style(Some(TextStyle::default()));
    assert!(!editor.has_same_typing_style(&editor.spans()[0]));

    editor.update_span_style(0, 2, &bold());
    editor.set_typing_style(Some(TextStyle::default().with_weight(FontWeight::Bold)));
    assert!(editor.has_same_typing_style(&editor.spans()[0]));
}

#[test]
fn paragraph_info_lists_each_paragraph() {
    let editor = editor_with_text("one\ntwo\nthree");
    let ranges: Vec<(usize, usize)> = editor
        .get_paragraph_info(0, 13)
        .iter()
        .map(|info| info.range)
        .collect();
    assert_eq!(ranges, vec![(0, 4), (4, 8), (8, 13)]);
    assert!(editor.get_paragraph_info(3, 3).is_empty());
}

#[test]
fn paragraph_style_applies_to_touched_paragraphs_only() {
    let mut editor = editor_with_text("one\ntwo\nthree");
    let center = UpdateParagraphStyle {
        text_align: Some(TextAlign::Center),
        ..UpdateParagraphStyle::default()
    };
    assert!(editor.update_paragraph_style(5, 6, &center));
    assert_eq!(
        alignments(&editor),
        vec![TextAlign::Start, TextAlign::Center, TextAlign::Start]
    );

    assert!(editor.update_paragraph_style(5, 6, &UpdateParagraphStyle::default()));
    assert_eq!(alignments(&editor), vec![TextAlign::Start; 3]);
}

#[test]
fn paragraph_style_moves_the_laid_out_text() {
    let frame = Rect::new(0.0, 0.0, 400.0, 300.0);
    let mut editor = RichEditor::new();
    editor.set_layout(frame, frame);
    editor.add_text_span(TextSpanOptions::new("ab"));
    let center = UpdateParagraphStyle {
        text_align: Some(TextAlign::Center),
        ..UpdateParagraphStyle::default()
    };
    editor.update_paragraph_style(0, 2, &center);
    assert_eq!(editor.caret_metrics(0).offset.x, 192.0);

    let margin = UpdateParagraphStyle {
        leading_margin: Some(LeadingMargin {
            width: 24.0,
            height: 0.0,
        }),
        ..UpdateParagraphStyle::default()
    };
    editor.update_paragraph_style(0, 2, &margin);
    assert_eq!(editor.caret_metrics(0).offset.x, 24.0);
    assert_eq!(editor.caret_metrics(2).offset.x, 40.0);
}

#[test]
fn paragraph_style_spans_a_multi_paragraph_range() {
    let mut editor = editor_with_text("one\ntwo\nthree");
    let end = UpdateParagraphStyle {
        text_align: Some(TextAlign::End),
        ..UpdateParagraphStyle::default()
    };
    editor.update_paragraph_style(2, 10, &end);
    assert_eq!(alignments(&editor), vec![TextAlign::End; 3]);
}

#[test]
fn backspace_at_the_start_resets_the_first_paragraph() {
    let mut editor = editor_with_text("ab");
    let center = UpdateParagraphStyle {
        text_align: Some(TextAlign::Center),
        ..UpdateParagraphStyle::default()
    };
    editor.update_paragraph_style(0, 2, &center);
    editor.set_caret_position(0);
    assert!(!editor.delete_backward(1));
    assert_eq!(alignments(&editor), vec![TextAlign::Start]);
    assert_eq!(editor.content_text(), "ab");
}
