use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::editor::{
    Color as SpanColor, FontStyle, RichEditor, SpanContent, TextDecoration, TextStyle,
};
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    /// Laid-out line, wrapped lines included.
    pub line: usize,
    pub column: u16,
    /// Hard line (paragraph) and column inside it, for the status bar.
    pub content_line: usize,
    pub content_column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    pub content_lines: usize,
}

const IMAGE_GLYPH: char = '▣';
const PLACEHOLDER_GLYPH: char = '◆';

/// Paints the editor's laid-out text into terminal lines. Glyph positions come
/// from the editor's own caret geometry, so the engine must be shaped in
/// cell units.
pub fn render_editor(editor: &RichEditor, theme: &Theme, left_padding: usize) -> RenderResult {
    let mut renderer = Renderer::new(editor, theme, left_padding);
    renderer.render_spans();
    renderer.finish()
}

struct Renderer<'a> {
    editor: &'a RichEditor,
    theme: &'a Theme,
    left_padding: usize,
    selection: Option<(usize, usize)>,
    entities: Vec<(usize, usize)>,
    lines: Vec<LineBuilder>,
}

impl<'a> Renderer<'a> {
    fn new(editor: &'a RichEditor, theme: &'a Theme, left_padding: usize) -> Self {
        let entities = if editor.is_focused() {
            Vec::new()
        } else {
            editor.ai_spans().map(|span| (span.start, span.end)).collect()
        };
        Self {
            editor,
            theme,
            left_padding,
            selection: editor.selection(),
            entities,
            lines: Vec::new(),
        }
    }

    fn render_spans(&mut self) {
        for span in self.editor.spans() {
            let base = match span.content() {
                SpanContent::Text { style, .. } | SpanContent::Symbol { style, .. } => {
                    style.as_ref().map(merge_style).unwrap_or_default()
                }
                SpanContent::Image(_) | SpanContent::Placeholder(_) => {
                    self.theme.placeholder_style()
                }
            };
            let glyphs: Vec<char> = match span.content() {
                SpanContent::Text { text, .. } => text.chars().collect(),
                SpanContent::Symbol { code_point, .. } => vec![*code_point],
                SpanContent::Image(_) => vec![IMAGE_GLYPH],
                SpanContent::Placeholder(_) => vec![PLACEHOLDER_GLYPH],
            };
            for (offset, ch) in glyphs.into_iter().enumerate() {
                let position = span.start() + offset;
                let style = self.decorate(position, base);
                if ch == '\n' {
                    self.mark_line_end(position, style);
                    continue;
                }
                let metrics = self.editor.caret_metrics(position);
                let line = metrics.offset.y.max(0.0) as usize;
                let column = metrics.offset.x.max(0.0) as usize;
                self.line_mut(line).push(column, ch, style);
            }
        }
    }

    /// A selected newline shows as one highlighted cell at the line end.
    fn mark_line_end(&mut self, position: usize, style: Style) {
        if !self.is_selected(position) {
            return;
        }
        let metrics = self.editor.caret_metrics(position);
        let line = metrics.offset.y.max(0.0) as usize;
        let column = metrics.offset.x.max(0.0) as usize;
        self.line_mut(line).push(column, ' ', style);
    }

    fn decorate(&self, position: usize, base: Style) -> Style {
        let mut style = base;
        if self
            .entities
            .iter()
            .any(|(start, end)| *start <= position && position < *end)
        {
            style = style.patch(self.theme.entity_style());
        }
        if self.is_selected(position) {
            style = style.patch(self.theme.selection_style());
        }
        style
    }

    fn is_selected(&self, position: usize) -> bool {
        self.selection
            .is_some_and(|(start, end)| start <= position && position < end)
    }

    fn line_mut(&mut self, line: usize) -> &mut LineBuilder {
        while self.lines.len() <= line {
            self.lines.push(LineBuilder::new(self.left_padding));
        }
        &mut self.lines[line]
    }

    fn finish(mut self) -> RenderResult {
        let total_lines = self.editor.line_count().max(self.lines.len()).max(1);
        while self.lines.len() < total_lines {
            self.lines.push(LineBuilder::new(self.left_padding));
        }
        let cursor = self.cursor_position();
        let content_lines = self
            .editor
            .content_text()
            .chars()
            .filter(|ch| *ch == '\n')
            .count()
            + 1;
        RenderResult {
            lines: self.lines.into_iter().map(LineBuilder::build_line).collect(),
            cursor,
            total_lines,
            content_lines,
        }
    }

    fn cursor_position(&self) -> Option<CursorVisualPosition> {
        if !self.editor.is_focused() {
            return None;
        }
        let caret = self.editor.caret_position();
        let metrics = self.editor.caret_metrics(caret);
        let text: Vec<char> = self.editor.content_text().chars().collect();
        let before = &text[..caret.min(text.len())];
        let content_line = before.iter().filter(|ch| **ch == '\n').count();
        let content_column = before.iter().rev().take_while(|ch| **ch != '\n').count();
        Some(CursorVisualPosition {
            line: metrics.offset.y.max(0.0) as usize,
            column: (metrics.offset.x.max(0.0) as usize + self.left_padding) as u16,
            content_line,
            content_column: content_column as u16,
        })
    }
}

struct LineSegment {
    text: String,
    style: Style,
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    width: usize,
    padding: usize,
}

impl LineBuilder {
    fn new(padding: usize) -> Self {
        let mut segments = Vec::new();
        if padding > 0 {
            segments.push(LineSegment {
                text: " ".repeat(padding),
                style: Style::default(),
            });
        }
        Self {
            segments,
            width: padding,
            padding,
        }
    }

    /// Appends `ch` at `column` (relative to the padding), filling any gap
    /// with blanks and merging runs of equal style.
    fn push(&mut self, column: usize, ch: char, style: Style) {
        let target = column + self.padding;
        if target > self.width {
            self.append(&" ".repeat(target - self.width), Style::default());
        }
        let mut buffer = [0u8; 4];
        self.append(ch.encode_utf8(&mut buffer), style);
    }

    fn append(&mut self, text: &str, style: Style) {
        self.width += visible_width(text);
        if let Some(last) = self.segments.last_mut()
            && last.style == style
        {
            last.text.push_str(text);
            return;
        }
        self.segments.push(LineSegment {
            text: text.to_string(),
            style,
        });
    }

    fn build_line(self) -> Line<'static> {
        if self.segments.is_empty() {
            return Line::from("");
        }
        Line::from(
            self.segments
                .into_iter()
                .map(|segment| Span::styled(segment.text, segment.style))
                .collect::<Vec<_>>(),
        )
    }
}

fn merge_style(style: &TextStyle) -> Style {
    let mut merged = Style::default();
    if style.font_weight.is_bold() {
        merged = merged.add_modifier(Modifier::BOLD);
    }
    if style.font_style == FontStyle::Italic {
        merged = merged.add_modifier(Modifier::ITALIC);
    }
    merged = match style.decoration {
        TextDecoration::None => merged,
        TextDecoration::Underline | TextDecoration::Overline => {
            merged.add_modifier(Modifier::UNDERLINED)
        }
        TextDecoration::LineThrough => merged.add_modifier(Modifier::CROSSED_OUT),
    };
    if style.text_color != SpanColor::BLACK {
        let (r, g, b) = style.text_color.rgb();
        merged = merged.fg(Color::Rgb(r, g, b));
    }
    merged
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::{FontWeight, TextSpanOptions};
    use crate::paragraph::{MonospaceMetrics, MonospaceParagraph};
    use kurbo::Rect;

    fn terminal_editor(text: &str, width: f64) -> RichEditor {
        let mut editor = RichEditor::with_paragraph(
            EditorConfig::default(),
            Box::new(MonospaceParagraph::new(MonospaceMetrics::Cells)),
        );
        let area = Rect::new(0.0, 0.0, width, 10.0);
        editor.set_layout(area, area);
        editor.add_text_span(TextSpanOptions::new(text));
        editor
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn renders_wrapped_lines_in_cells() {
        let editor = terminal_editor("hello world again", 12.0);
        let result = render_editor(&editor, &Theme::default(), 0);
        assert_eq!(result.total_lines, 2);
        assert_eq!(line_text(&result.lines[0]), "hello world ");
        assert_eq!(line_text(&result.lines[1]), "again");
        assert_eq!(result.content_lines, 1);
    }

    #[test]
    fn hard_newlines_start_new_lines_and_count_as_content_lines() {
        let editor = terminal_editor("ab\ncd", 20.0);
        let result = render_editor(&editor, &Theme::default(), 2);
        assert_eq!(line_text(&result.lines[0]), "  ab");
        assert_eq!(line_text(&result.lines[1]), "  cd");
        assert_eq!(result.content_lines, 2);
    }

    #[test]
    fn selection_and_bold_runs_get_their_own_style() {
        let mut editor = terminal_editor("plain", 20.0);
        editor.add_text_span(
            TextSpanOptions::new("bold").with_style(TextStyle::default().with_weight(FontWeight::Bold)),
        );
        editor.request_focus();
        assert!(editor.set_selection(0, 2));
        let theme = Theme::default();
        let result = render_editor(&editor, &theme, 0);
        let spans = &result.lines[0].spans;
        assert_eq!(spans[0].content.as_ref(), "pl");
        assert_eq!(spans[0].style, Style::default().patch(theme.selection_style()));
        assert_eq!(spans[1].content.as_ref(), "ain");
        assert_eq!(spans[2].content.as_ref(), "bold");
        assert!(spans[2].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn cursor_is_reported_only_while_focused() {
        let mut editor = terminal_editor("ab\ncd", 20.0);
        assert!(render_editor(&editor, &Theme::default(), 0).cursor.is_none());
        editor.request_focus();
        editor.set_caret_position(4);
        let cursor = render_editor(&editor, &Theme::default(), 1)
            .cursor
            .unwrap();
        assert_eq!(cursor.line, 1);
        assert_eq!(cursor.column, 2);
        assert_eq!(cursor.content_line, 1);
        assert_eq!(cursor.content_column, 1);
    }
}
