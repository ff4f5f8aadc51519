use kurbo::Size;
use log::debug;

use super::span::{
    Color, FontStyle, FontWeight, ImageAttributes, ImageFit, LeadingMargin, Shadow, Span,
    SpanContent, TextAlign, TextDecoration, TextStyle, VerticalAlign,
};
use super::RichEditor;
use crate::host::DirtyFlag;

/// Partial style update; only the `Some` fields are applied.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct UpdateSpanStyle {
    pub text_color: Option<Color>,
    pub font_size: Option<f64>,
    pub font_style: Option<FontStyle>,
    pub font_weight: Option<FontWeight>,
    pub font_family: Option<Vec<String>>,
    pub decoration: Option<TextDecoration>,
    pub decoration_color: Option<Color>,
    pub shadows: Option<Vec<Shadow>>,
    pub image_size: Option<Size>,
    pub object_fit: Option<ImageFit>,
    pub vertical_align: Option<VerticalAlign>,
    pub border_radius: Option<f64>,
    pub margin: Option<f64>,
}

impl UpdateSpanStyle {
    pub fn has_text_update(&self) -> bool {
        self.text_color.is_some()
            || self.font_size.is_some()
            || self.font_style.is_some()
            || self.font_weight.is_some()
            || self.font_family.is_some()
            || self.decoration.is_some()
            || self.decoration_color.is_some()
            || self.shadows.is_some()
    }

    pub fn has_image_update(&self) -> bool {
        self.image_size.is_some()
            || self.object_fit.is_some()
            || self.vertical_align.is_some()
            || self.border_radius.is_some()
            || self.margin.is_some()
    }

    pub fn apply_to_text(&self, style: &mut TextStyle) {
        if let Some(color) = self.text_color {
            style.text_color = color;
        }
        if let Some(size) = self.font_size {
            style.font_size = size;
        }
        if let Some(font_style) = self.font_style {
            style.font_style = font_style;
        }
        if let Some(weight) = self.font_weight {
            style.font_weight = weight;
        }
        if let Some(family) = &self.font_family {
            style.font_family = family.clone();
        }
        if let Some(decoration) = self.decoration {
            style.decoration = decoration;
        }
        if let Some(color) = self.decoration_color {
            style.decoration_color = color;
        }
        if let Some(shadows) = &self.shadows {
            style.shadows = shadows.clone();
        }
    }

    pub fn apply_to_image(&self, attributes: &mut ImageAttributes) {
        if let Some(size) = self.image_size {
            attributes.size = Some(size);
        }
        if let Some(fit) = self.object_fit {
            attributes.object_fit = fit;
        }
        if let Some(align) = self.vertical_align {
            attributes.vertical_align = align;
        }
        if let Some(radius) = self.border_radius {
            attributes.border_radius = Some(radius);
        }
        if let Some(margin) = self.margin {
            attributes.margin = Some(margin);
        }
    }
}

/// Paragraph update. A missing alignment resets to [`TextAlign::Start`].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct UpdateParagraphStyle {
    pub text_align: Option<TextAlign>,
    pub leading_margin: Option<LeadingMargin>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParagraphInfo {
    pub range: (usize, usize),
    pub text_align: TextAlign,
    pub leading_margin: Option<LeadingMargin>,
}

impl RichEditor {
    pub fn typing_style(&self) -> Option<&TextStyle> {
        self.typing_style.as_ref()
    }

    /// Style given to text typed from now on.
    pub fn set_typing_style(&mut self, style: Option<TextStyle>) {
        self.typing_style = style;
    }

    /// True when the span and the typing style are both unstyled or equal.
    pub fn has_same_typing_style(&self, span: &Span) -> bool {
        match (span.text_style(), self.typing_style.as_ref()) {
            (Some(span_style), Some(typing)) => span_style == typing,
            (None, None) => true,
            _ => false,
        }
    }

    /// Applies `update` to `[start, end)`, splitting the text spans that
    /// straddle either bound so the update never leaks outside the range.
    pub fn update_span_style(&mut self, start: usize, end: usize, update: &UpdateSpanStyle) -> bool {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        let end = end.min(self.store.text_len());
        if start >= end {
            return false;
        }

        let mut changed = false;
        let mut index = 0;
        while let Some(span) = self.store.get(index) {
            let (span_start, span_end) = (span.start(), span.position());
            if span_end <= start {
                index += 1;
                continue;
            }
            if span_start >= end {
                break;
            }
            if span_start >= start && span_end <= end {
                changed |= self.apply_span_update(index, update);
                if span_end == end {
                    break;
                }
                index += 1;
                continue;
            }
            let cut = if span_start < start { start } else { end };
            let count = self.store.span_count();
            self.store.split_span_at(cut);
            if self.store.span_count() == count {
                index += 1;
            }
        }

        if changed {
            self.store.rewalk();
            self.mark_dirty(DirtyFlag::Measure);
            debug!("span style updated over [{start}, {end})");
        }
        changed
    }

    fn apply_span_update(&mut self, index: usize, update: &UpdateSpanStyle) -> bool {
        let default_size = self.config.default_text_size;
        let Some(span) = self.store.get_mut(index) else {
            return false;
        };
        match &mut span.content {
            SpanContent::Text { style, .. } | SpanContent::Symbol { style, .. } => {
                if !update.has_text_update() {
                    return false;
                }
                let style = style.get_or_insert_with(|| TextStyle::default().with_font_size(default_size));
                update.apply_to_text(style);
                true
            }
            SpanContent::Image(attributes) => {
                if !update.has_image_update() {
                    return false;
                }
                update.apply_to_image(attributes);
                true
            }
            SpanContent::Placeholder(_) => false,
        }
    }

    /// Indices of the text spans that make up the paragraphs touching
    /// `[start, end)`.
    pub fn get_paragraph_nodes(&self, start: usize, end: usize) -> Vec<usize> {
        let spans = self.store.spans();
        if start == end || spans.is_empty() {
            return Vec::new();
        }
        let is_node = |index: &usize| !spans[*index].is_placeholder();
        if start >= self.store.text_len() {
            return (0..spans.len()).filter(is_node).collect();
        }

        let mut head = 0;
        let mut flag = 0;
        let mut span_end = 0;
        let mut is_end = false;
        while flag < spans.len() {
            span_end = spans[flag].position();
            is_end = spans[flag].ends_with_newline();
            flag += 1;
            if span_end > start {
                break;
            }
            if is_end {
                head = flag;
            }
        }
        let mut nodes: Vec<usize> = (head..flag).filter(is_node).collect();
        while flag < spans.len() && (span_end < end || !is_end) {
            if is_node(&flag) {
                nodes.push(flag);
            }
            span_end = spans[flag].position();
            is_end = spans[flag].ends_with_newline();
            flag += 1;
        }
        nodes
    }

    pub fn get_paragraph_info(&self, start: usize, end: usize) -> Vec<ParagraphInfo> {
        let nodes = self.get_paragraph_nodes(start, end);
        let Some(first) = nodes.first().and_then(|index| self.store.get(*index)) else {
            return Vec::new();
        };
        let mut paragraph_start = first.start();
        let mut infos = Vec::new();
        for (position, index) in nodes.iter().enumerate() {
            let Some(span) = self.store.get(*index) else {
                continue;
            };
            if position + 1 == nodes.len() || span.ends_with_newline() {
                infos.push(ParagraphInfo {
                    range: (paragraph_start, span.position()),
                    text_align: span.paragraph_style().text_align,
                    leading_margin: span.paragraph_style().leading_margin,
                });
                paragraph_start = span.position();
            }
        }
        infos
    }

    pub fn update_paragraph_style(&mut self, start: usize, end: usize, style: &UpdateParagraphStyle) -> bool {
        let nodes = self.get_paragraph_nodes(start, end);
        if nodes.is_empty() {
            return false;
        }
        for index in &nodes {
            if let Some(span) = self.store.get_mut(*index) {
                span.paragraph_style.text_align = style.text_align.unwrap_or_default();
                if let Some(margin) = style.leading_margin {
                    span.paragraph_style.leading_margin = Some(margin);
                }
            }
        }
        self.store.rewalk();
        self.mark_dirty(DirtyFlag::Measure);
        true
    }

    /// Drops the alignment and leading margin of the first span.
    pub(crate) fn reset_first_node_style(&mut self) {
        let Some(first) = self.store.get_mut(0) else {
            return;
        };
        if first.is_placeholder() {
            return;
        }
        first.paragraph_style = Default::default();
        self.store.rewalk();
        self.mark_dirty(DirtyFlag::Measure);
    }
}
