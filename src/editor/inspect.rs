use std::fmt;

use super::RichEditor;
use super::span::{FontStyle, Span, SpanContent, TextAlign, TextDecoration, TextStyle};

/// Flat description of one span, for debugging output.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanDump {
    pub index: usize,
    pub range: (usize, usize),
    pub kind: &'static str,
    pub value: String,
    pub labels: Vec<String>,
}

impl SpanDump {
    fn of_span(index: usize, span: &Span) -> Self {
        let value = match span.content() {
            SpanContent::Text { text, .. } => text.clone(),
            SpanContent::Symbol { code_point, .. } => format!("U+{:04X}", u32::from(*code_point)),
            SpanContent::Image(attributes) => attributes.src.clone(),
            SpanContent::Placeholder(placeholder) => placeholder.key.clone(),
        };
        let mut labels = span.text_style().map(style_labels).unwrap_or_default();
        if let Some(label) = align_label(span.paragraph_style().text_align) {
            labels.push(label.to_string());
        }
        if span.paragraph_style().leading_margin.is_some() {
            labels.push("margin".to_string());
        }
        Self {
            index,
            range: (span.start(), span.position()),
            kind: span.content().kind_label(),
            value,
            labels,
        }
    }
}

impl fmt::Display for SpanDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3} [{}, {}) {} {:?}",
            self.index,
            self.range.0,
            self.range.1,
            self.kind,
            self.value
        )?;
        if !self.labels.is_empty() {
            write!(f, " {}", self.labels.join(" "))?;
        }
        Ok(())
    }
}

pub(crate) fn style_labels(style: &TextStyle) -> Vec<String> {
    let mut labels = vec![format!("{}px", style.font_size)];
    if style.font_weight.is_bold() {
        labels.push("bold".to_string());
    }
    if style.font_style == FontStyle::Italic {
        labels.push("italic".to_string());
    }
    match style.decoration {
        TextDecoration::None => {}
        TextDecoration::Underline => labels.push("underline".to_string()),
        TextDecoration::Overline => labels.push("overline".to_string()),
        TextDecoration::LineThrough => labels.push("strike".to_string()),
    }
    labels
}

fn align_label(align: TextAlign) -> Option<&'static str> {
    match align {
        TextAlign::Start => None,
        TextAlign::Center => Some("center"),
        TextAlign::End => Some("end"),
        TextAlign::Justify => Some("justify"),
    }
}

impl RichEditor {
    pub fn dump_spans(&self) -> Vec<SpanDump> {
        self.store
            .spans()
            .iter()
            .enumerate()
            .map(|(index, span)| SpanDump::of_span(index, span))
            .collect()
    }

    /// Labels describing where the caret sits: paragraph number, span kind
    /// and the style in effect there.
    pub fn caret_breadcrumbs(&self) -> Vec<String> {
        let mut labels = Vec::new();
        let text = self.store.content_text();
        let paragraph = text
            .chars()
            .take(self.caret_position)
            .filter(|ch| *ch == '\n')
            .count();
        labels.push(format!("P{}", paragraph + 1));

        let lookup = if self.caret_position > 0 {
            self.caret_position - 1
        } else {
            self.caret_position
        };
        let Some(info) = self.store.find_span_at(lookup) else {
            return labels;
        };
        let Some(span) = self.store.get(info.span_index) else {
            return labels;
        };
        labels.push(span.content().kind_label().to_string());
        if let Some(style) = span.text_style() {
            labels.extend(style_labels(style));
        }
        if let Some(label) = align_label(span.paragraph_style().text_align) {
            labels.push(label.to_string());
        }
        labels
    }
}
