use std::cell::{Cell, RefCell};

use kurbo::{Point, Rect, Size};
use unicode_width::UnicodeWidthChar;

use crate::editor::{ParagraphStyle, SpanContent, SpanStore, TextAlign};

/// Box used for placeholders that do not carry a size.
pub const DEFAULT_PLACEHOLDER_SIZE: Size = Size {
    width: 16.0,
    height: 16.0,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Affinity {
    /// Attach the caret to the glyph before the offset.
    Upstream,
    /// Attach the caret to the glyph at the offset.
    #[default]
    Downstream,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaretMetrics {
    pub offset: Point,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapingRun {
    Text { text: String, font_size: f64 },
    Placeholder { size: Size },
}

/// Alignment and first-line indent of one hard paragraph.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct LineStyle {
    pub align: TextAlign,
    pub indent: f64,
}

impl From<&ParagraphStyle> for LineStyle {
    fn from(style: &ParagraphStyle) -> Self {
        Self {
            align: style.text_align,
            indent: style.leading_margin.map_or(0.0, |margin| margin.width),
        }
    }
}

impl LineStyle {
    /// Horizontal shift of a line whose content spans `visible` units when
    /// `max_width` is available.
    fn shift(&self, visible: f64, max_width: f64) -> f64 {
        let avail = max_width - self.indent;
        if !avail.is_finite() {
            return self.indent;
        }
        let slack = (avail - visible).max(0.0);
        self.indent
            + match self.align {
                TextAlign::Center => slack / 2.0,
                TextAlign::End => slack,
                TextAlign::Start | TextAlign::Justify => 0.0,
            }
    }
}

/// A shaped paragraph. Offsets are logical characters, geometry is local to
/// the paragraph origin.
///
/// `styles` holds one entry per hard paragraph, in order; missing entries
/// fall back to [`LineStyle::default`].
pub trait Paragraph {
    fn layout(&mut self, runs: &[ShapingRun], styles: &[LineStyle], max_width: f64);

    fn glyph_index_at(&self, point: Point) -> usize;

    fn caret_metrics(&self, offset: usize, affinity: Affinity) -> Option<CaretMetrics>;

    fn rects_for_range(&self, start: usize, end: usize) -> Vec<Rect>;

    fn placeholder_rects(&self) -> Vec<Rect>;

    fn line_count(&self) -> usize;

    fn height(&self) -> f64;

    fn longest_line(&self) -> f64;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MonospaceMetrics {
    /// Advance and line height scale with the font size.
    Scaled {
        advance_ratio: f64,
        line_height_ratio: f64,
    },
    /// One unit per terminal cell, whatever the font size.
    Cells,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        MonospaceMetrics::Scaled {
            advance_ratio: 0.5,
            line_height_ratio: 1.2,
        }
    }
}

impl MonospaceMetrics {
    fn advance(&self, font_size: f64, columns: usize) -> f64 {
        match self {
            MonospaceMetrics::Scaled { advance_ratio, .. } => {
                font_size * advance_ratio * columns as f64
            }
            MonospaceMetrics::Cells => columns as f64,
        }
    }

    fn line_height(&self, font_size: f64) -> f64 {
        match self {
            MonospaceMetrics::Scaled {
                line_height_ratio, ..
            } => font_size * line_height_ratio,
            MonospaceMetrics::Cells => 1.0,
        }
    }

    fn placeholder_box(&self, size: Size) -> Size {
        match self {
            MonospaceMetrics::Scaled { .. } => size,
            MonospaceMetrics::Cells => Size::new(1.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Glyph {
    ch: Option<char>,
    x: f64,
    advance: f64,
    height: f64,
    line: usize,
}

impl Glyph {
    fn is_newline(&self) -> bool {
        self.ch == Some('\n')
    }

    fn is_whitespace(&self) -> bool {
        self.ch.is_some_and(char::is_whitespace)
    }
}

#[derive(Clone, Copy, Debug)]
struct LineBox {
    start: usize,
    end: usize,
    left: f64,
    top: f64,
    height: f64,
    width: f64,
}

/// Fixed-advance paragraph with greedy word wrapping.
#[derive(Clone, Debug, Default)]
pub struct MonospaceParagraph {
    metrics: MonospaceMetrics,
    glyphs: Vec<Glyph>,
    lines: Vec<LineBox>,
    placeholders: Vec<usize>,
}

impl MonospaceParagraph {
    pub fn new(metrics: MonospaceMetrics) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    fn push_glyph(&mut self, ch: Option<char>, advance: f64, height: f64) {
        self.glyphs.push(Glyph {
            ch,
            x: 0.0,
            advance,
            height,
            line: 0,
        });
    }

    fn push_line(&mut self, start: usize, end: usize, style: LineStyle, max_width: f64) {
        let line = self.lines.len();
        let top = self
            .lines
            .last()
            .map(|previous| previous.top + previous.height)
            .unwrap_or(0.0);
        let mut height: f64 = 0.0;
        let mut width: f64 = 0.0;
        let mut visible: f64 = 0.0;
        for glyph in &mut self.glyphs[start..end] {
            glyph.line = line;
            height = height.max(glyph.height);
            width = width.max(glyph.x + glyph.advance);
            if !glyph.is_whitespace() {
                visible = visible.max(glyph.x + glyph.advance);
            }
        }
        let left = style.shift(visible, max_width);
        for glyph in &mut self.glyphs[start..end] {
            glyph.x += left;
        }
        self.lines.push(LineBox {
            start,
            end,
            left,
            top,
            height,
            width: width + style.indent,
        });
    }

    fn caret_line(&self, offset: usize, affinity: Affinity) -> usize {
        let count = self.glyphs.len();
        if affinity == Affinity::Upstream && offset > 0 && !self.glyphs[offset - 1].is_newline() {
            return self.glyphs[offset - 1].line;
        }
        if offset < count {
            return self.glyphs[offset].line;
        }
        self.lines.len() - 1
    }
}

impl Paragraph for MonospaceParagraph {
    fn layout(&mut self, runs: &[ShapingRun], styles: &[LineStyle], max_width: f64) {
        self.glyphs.clear();
        self.lines.clear();
        self.placeholders.clear();

        for run in runs {
            match run {
                ShapingRun::Text { text, font_size } => {
                    let height = self.metrics.line_height(*font_size);
                    for ch in text.chars() {
                        let columns = if ch == '\n' { 0 } else { ch.width().unwrap_or(0) };
                        let advance = self.metrics.advance(*font_size, columns);
                        self.push_glyph(Some(ch), advance, height);
                    }
                }
                ShapingRun::Placeholder { size } => {
                    let size = self.metrics.placeholder_box(*size);
                    self.placeholders.push(self.glyphs.len());
                    self.push_glyph(None, size.width, size.height);
                }
            }
        }

        let count = self.glyphs.len();
        if count == 0 {
            return;
        }
        let max_width = if max_width > 0.0 { max_width } else { f64::INFINITY };
        let style_of = |paragraph: usize| styles.get(paragraph).copied().unwrap_or_default();
        let mut paragraph = 0;
        let mut style = style_of(paragraph);
        let mut line_start = 0;
        let mut x = 0.0;
        let mut break_at: Option<usize> = None;
        for idx in 0..count {
            let glyph = self.glyphs[idx];
            if glyph.is_newline() {
                self.glyphs[idx].x = x;
                self.push_line(line_start, idx + 1, style, max_width);
                paragraph += 1;
                style = style_of(paragraph);
                line_start = idx + 1;
                x = 0.0;
                break_at = None;
                continue;
            }
            let limit = max_width - style.indent;
            if !glyph.is_whitespace() && x + glyph.advance > limit && idx > line_start {
                let wrap_at = break_at.filter(|at| *at > line_start).unwrap_or(idx);
                self.push_line(line_start, wrap_at, style, max_width);
                line_start = wrap_at;
                break_at = None;
                x = 0.0;
                for carried in &mut self.glyphs[wrap_at..idx] {
                    carried.x = x;
                    x += carried.advance;
                }
            }
            self.glyphs[idx].x = x;
            x += glyph.advance;
            if glyph.is_whitespace() {
                break_at = Some(idx + 1);
            }
        }
        if line_start < count {
            self.push_line(line_start, count, style, max_width);
        }
        if let Some(last) = self.glyphs.last().copied()
            && last.is_newline()
        {
            let top = self
                .lines
                .last()
                .map(|line| line.top + line.height)
                .unwrap_or(0.0);
            self.lines.push(LineBox {
                start: count,
                end: count,
                left: style.shift(0.0, max_width),
                top,
                height: last.height,
                width: style.indent,
            });
        }
    }

    fn glyph_index_at(&self, point: Point) -> usize {
        let Some(last_line) = self.lines.last() else {
            return 0;
        };
        let line = self
            .lines
            .iter()
            .find(|line| point.y < line.top + line.height)
            .unwrap_or(last_line);
        for idx in line.start..line.end {
            let glyph = &self.glyphs[idx];
            if glyph.is_newline() || point.x < glyph.x + glyph.advance / 2.0 {
                return idx;
            }
        }
        line.end
    }

    fn caret_metrics(&self, offset: usize, affinity: Affinity) -> Option<CaretMetrics> {
        if self.lines.is_empty() {
            return None;
        }
        let offset = offset.min(self.glyphs.len());
        let line_idx = self.caret_line(offset, affinity);
        let line = self.lines[line_idx];
        let x = match self.glyphs.get(offset) {
            Some(glyph) if glyph.line == line_idx && line.end > offset => glyph.x,
            _ if offset > 0 && self.glyphs[offset - 1].line == line_idx && line.end >= offset => {
                let previous = &self.glyphs[offset - 1];
                previous.x + previous.advance
            }
            _ => line.left,
        };
        Some(CaretMetrics {
            offset: Point::new(x, line.top),
            height: line.height,
        })
    }

    fn rects_for_range(&self, start: usize, end: usize) -> Vec<Rect> {
        let end = end.min(self.glyphs.len());
        if start >= end {
            return Vec::new();
        }
        let mut rects = Vec::new();
        for line in &self.lines {
            let from = start.max(line.start);
            let to = end.min(line.end);
            if from >= to {
                continue;
            }
            let x0 = self.glyphs[from].x;
            let last = &self.glyphs[to - 1];
            let x1 = last.x + last.advance;
            if x1 > x0 {
                rects.push(Rect::new(x0, line.top, x1, line.top + line.height));
            }
        }
        rects
    }

    fn placeholder_rects(&self) -> Vec<Rect> {
        self.placeholders
            .iter()
            .map(|idx| {
                let glyph = &self.glyphs[*idx];
                let line = &self.lines[glyph.line];
                let bottom = line.top + line.height;
                Rect::new(glyph.x, bottom - glyph.height, glyph.x + glyph.advance, bottom)
            })
            .collect()
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn height(&self) -> f64 {
        self.lines
            .last()
            .map(|line| line.top + line.height)
            .unwrap_or(0.0)
    }

    fn longest_line(&self) -> f64 {
        self.lines.iter().map(|line| line.width).fold(0.0, f64::max)
    }
}

/// Offset-to-geometry queries over the current span content.
///
/// The paragraph is reshaped lazily whenever the store revision or the layout
/// width changed since the last query, so answers always reflect the spans
/// passed in.
pub struct ParagraphIndex {
    paragraph: RefCell<Box<dyn Paragraph>>,
    shaped_revision: Cell<Option<u64>>,
    max_width: f64,
    default_font_size: f64,
}

impl ParagraphIndex {
    pub fn new(paragraph: Box<dyn Paragraph>, default_font_size: f64) -> Self {
        Self {
            paragraph: RefCell::new(paragraph),
            shaped_revision: Cell::new(None),
            max_width: 0.0,
            default_font_size,
        }
    }

    pub fn max_width(&self) -> f64 {
        self.max_width
    }

    pub fn set_max_width(&mut self, max_width: f64) {
        if self.max_width != max_width {
            self.max_width = max_width;
            self.shaped_revision.set(None);
        }
    }

    pub fn runs(&self, store: &SpanStore) -> Vec<ShapingRun> {
        store
            .spans()
            .iter()
            .map(|span| match span.content() {
                SpanContent::Text { text, style } => ShapingRun::Text {
                    text: text.clone(),
                    font_size: style
                        .as_ref()
                        .map(|style| style.font_size)
                        .unwrap_or(self.default_font_size),
                },
                SpanContent::Symbol { code_point, style } => ShapingRun::Text {
                    text: code_point.to_string(),
                    font_size: style
                        .as_ref()
                        .map(|style| style.font_size)
                        .unwrap_or(self.default_font_size),
                },
                SpanContent::Image(attributes) => ShapingRun::Placeholder {
                    size: attributes.size.unwrap_or(DEFAULT_PLACEHOLDER_SIZE),
                },
                SpanContent::Placeholder(placeholder) => ShapingRun::Placeholder {
                    size: placeholder.size,
                },
            })
            .collect()
    }

    /// One style per hard paragraph. The span holding a paragraph's newline
    /// decides its style; the last span decides the final paragraph.
    pub fn line_styles(&self, store: &SpanStore) -> Vec<LineStyle> {
        let mut styles = Vec::new();
        for span in store.spans() {
            if let SpanContent::Text { text, .. } = span.content() {
                let style = LineStyle::from(span.paragraph_style());
                styles.extend(text.matches('\n').map(|_| style));
            }
        }
        if let Some(last) = store.spans().last() {
            styles.push(LineStyle::from(last.paragraph_style()));
        }
        styles
    }

    fn ensure_shaped(&self, store: &SpanStore) {
        if self.shaped_revision.get() == Some(store.revision()) {
            return;
        }
        let runs = self.runs(store);
        let styles = self.line_styles(store);
        self.paragraph
            .borrow_mut()
            .layout(&runs, &styles, self.max_width);
        self.shaped_revision.set(Some(store.revision()));
    }

    pub fn caret_metrics(
        &self,
        store: &SpanStore,
        position: usize,
        affinity: Affinity,
    ) -> Option<CaretMetrics> {
        self.ensure_shaped(store);
        self.paragraph.borrow().caret_metrics(position, affinity)
    }

    pub fn index_at(&self, store: &SpanStore, point: Point) -> usize {
        self.ensure_shaped(store);
        self.paragraph.borrow().glyph_index_at(point)
    }

    pub fn range_rects(&self, store: &SpanStore, start: usize, end: usize) -> Vec<Rect> {
        self.ensure_shaped(store);
        self.paragraph.borrow().rects_for_range(start, end)
    }

    pub fn placeholder_rects(&self, store: &SpanStore) -> Vec<Rect> {
        self.ensure_shaped(store);
        self.paragraph.borrow().placeholder_rects()
    }

    pub fn line_count(&self, store: &SpanStore) -> usize {
        self.ensure_shaped(store);
        self.paragraph.borrow().line_count()
    }

    pub fn height(&self, store: &SpanStore) -> f64 {
        self.ensure_shaped(store);
        self.paragraph.borrow().height()
    }

    pub fn longest_line(&self, store: &SpanStore) -> f64 {
        self.ensure_shaped(store);
        self.paragraph.borrow().longest_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(text: &str, width: f64) -> MonospaceParagraph {
        let mut paragraph = MonospaceParagraph::new(MonospaceMetrics::Cells);
        paragraph.layout(
            &[ShapingRun::Text {
                text: text.to_string(),
                font_size: 16.0,
            }],
            &[],
            width,
        );
        paragraph
    }

    fn styled_cells(text: &str, styles: &[LineStyle], width: f64) -> MonospaceParagraph {
        let mut paragraph = MonospaceParagraph::new(MonospaceMetrics::Cells);
        paragraph.layout(
            &[ShapingRun::Text {
                text: text.to_string(),
                font_size: 16.0,
            }],
            styles,
            width,
        );
        paragraph
    }

    #[test]
    fn empty_paragraph_has_no_lines() {
        let paragraph = cells("", 10.0);
        assert_eq!(paragraph.line_count(), 0);
        assert_eq!(paragraph.caret_metrics(0, Affinity::Downstream), None);
        assert_eq!(paragraph.glyph_index_at(Point::new(5.0, 5.0)), 0);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let paragraph = cells("hello world again", 12.0);
        assert_eq!(paragraph.line_count(), 2);
        let metrics = paragraph.caret_metrics(12, Affinity::Downstream).unwrap();
        assert_eq!(metrics.offset, Point::new(0.0, 1.0));
        let upstream = paragraph.caret_metrics(12, Affinity::Upstream).unwrap();
        assert_eq!(upstream.offset, Point::new(12.0, 0.0));
    }

    #[test]
    fn long_words_break_mid_word() {
        let paragraph = cells("abcdefgh", 3.0);
        assert_eq!(paragraph.line_count(), 3);
        assert_eq!(paragraph.longest_line(), 3.0);
    }

    #[test]
    fn hard_newline_starts_a_line_and_trailing_newline_adds_one() {
        let paragraph = cells("ab\ncd\n", 0.0);
        assert_eq!(paragraph.line_count(), 3);
        let metrics = paragraph.caret_metrics(3, Affinity::Upstream).unwrap();
        assert_eq!(metrics.offset, Point::new(0.0, 1.0));
        let end = paragraph.caret_metrics(6, Affinity::Upstream).unwrap();
        assert_eq!(end.offset, Point::new(0.0, 2.0));
        assert_eq!(paragraph.height(), 3.0);
    }

    #[test]
    fn hit_testing_rounds_to_nearest_edge() {
        let paragraph = cells("ab\ncd", 0.0);
        assert_eq!(paragraph.glyph_index_at(Point::new(0.4, 0.5)), 0);
        assert_eq!(paragraph.glyph_index_at(Point::new(0.6, 0.5)), 1);
        assert_eq!(paragraph.glyph_index_at(Point::new(9.0, 0.5)), 2);
        assert_eq!(paragraph.glyph_index_at(Point::new(9.0, 1.5)), 5);
        assert_eq!(paragraph.glyph_index_at(Point::new(1.0, 99.0)), 4);
    }

    #[test]
    fn range_rects_cover_each_line() {
        let paragraph = cells("ab\ncd", 0.0);
        let rects = paragraph.rects_for_range(1, 4);
        assert_eq!(
            rects,
            vec![Rect::new(1.0, 0.0, 2.0, 1.0), Rect::new(0.0, 1.0, 1.0, 2.0)]
        );
        assert!(paragraph.rects_for_range(2, 3).is_empty());
    }

    #[test]
    fn scaled_metrics_follow_font_size_and_placeholders() {
        let mut paragraph = MonospaceParagraph::new(MonospaceMetrics::default());
        paragraph.layout(
            &[
                ShapingRun::Text {
                    text: "ab".to_string(),
                    font_size: 20.0,
                },
                ShapingRun::Placeholder {
                    size: Size::new(30.0, 40.0),
                },
            ],
            &[],
            0.0,
        );
        let metrics = paragraph.caret_metrics(2, Affinity::Downstream).unwrap();
        assert_eq!(metrics.offset, Point::new(20.0, 0.0));
        assert_eq!(metrics.height, 40.0);
        assert_eq!(
            paragraph.placeholder_rects(),
            vec![Rect::new(20.0, 0.0, 50.0, 40.0)]
        );
    }

    #[test]
    fn alignment_shifts_each_line_into_the_free_space() {
        let center = LineStyle {
            align: TextAlign::Center,
            indent: 0.0,
        };
        let end = LineStyle {
            align: TextAlign::End,
            indent: 0.0,
        };
        let paragraph = styled_cells("ab\ncd", &[center, end], 10.0);
        let first = paragraph.caret_metrics(0, Affinity::Downstream).unwrap();
        assert_eq!(first.offset, Point::new(4.0, 0.0));
        let second = paragraph.caret_metrics(3, Affinity::Downstream).unwrap();
        assert_eq!(second.offset, Point::new(8.0, 1.0));
        assert_eq!(paragraph.glyph_index_at(Point::new(0.0, 0.5)), 0);
        assert_eq!(paragraph.glyph_index_at(Point::new(9.9, 1.5)), 5);
        assert_eq!(
            paragraph.rects_for_range(0, 2),
            vec![Rect::new(4.0, 0.0, 6.0, 1.0)]
        );
    }

    #[test]
    fn leading_margin_indents_and_narrows_the_wrap_width() {
        let indented = LineStyle {
            align: TextAlign::Start,
            indent: 2.0,
        };
        let paragraph = styled_cells("abcdef", &[indented], 5.0);
        assert_eq!(paragraph.line_count(), 2);
        let start = paragraph.caret_metrics(0, Affinity::Downstream).unwrap();
        assert_eq!(start.offset, Point::new(2.0, 0.0));
        let wrapped = paragraph.caret_metrics(3, Affinity::Downstream).unwrap();
        assert_eq!(wrapped.offset, Point::new(2.0, 1.0));
    }

    #[test]
    fn trailing_empty_line_takes_the_next_paragraph_style() {
        let center = LineStyle {
            align: TextAlign::Center,
            indent: 0.0,
        };
        let paragraph = styled_cells("ab\n", &[LineStyle::default(), center], 10.0);
        let end = paragraph.caret_metrics(3, Affinity::Downstream).unwrap();
        assert_eq!(end.offset, Point::new(5.0, 1.0));
    }

    #[test]
    fn index_reshapes_after_store_changes() {
        let mut store = SpanStore::new();
        store.insert_span(SpanContent::text("ab"), None);
        let index = ParagraphIndex::new(
            Box::new(MonospaceParagraph::new(MonospaceMetrics::Cells)),
            16.0,
        );
        let end = index.caret_metrics(&store, 2, Affinity::Upstream).unwrap();
        assert_eq!(end.offset.x, 2.0);
        store.insert_span(SpanContent::text("cde"), None);
        let end = index.caret_metrics(&store, 5, Affinity::Upstream).unwrap();
        assert_eq!(end.offset.x, 5.0);
    }
}
