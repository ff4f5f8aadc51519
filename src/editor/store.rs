use super::content::{char_slice, split_text};
use super::span::{ParagraphStyle, Span, SpanContent, SpanId};

/// Owning span of a document offset, derived on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanPositionInfo {
    pub span_index: usize,
    pub span_start: usize,
    pub span_end: usize,
    pub span_offset: usize,
}

/// Ordered span sequence with cumulative end positions.
///
/// Every structural mutation ends with [`SpanStore::rewalk`], which recomputes
/// each `position` from scratch and bumps the revision seen by layout.
#[derive(Clone, Debug, Default)]
pub struct SpanStore {
    spans: Vec<Span>,
    next_id: u64,
    revision: u64,
}

impl SpanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Span> {
        self.spans.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Span> {
        self.spans.get_mut(index)
    }

    pub fn index_of(&self, id: SpanId) -> Option<usize> {
        self.spans.iter().position(|span| span.id == id)
    }

    /// Total logical length of the document.
    pub fn text_len(&self) -> usize {
        self.spans.last().map(|span| span.position).unwrap_or(0)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn content_text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }

    pub fn text_between(&self, start: usize, end: usize) -> String {
        char_slice(&self.content_text(), start, end)
    }

    pub fn all_placeholders(&self) -> bool {
        !self.spans.is_empty() && self.spans.iter().all(Span::is_placeholder)
    }

    /// Finds the span with `span_start <= position < span_end`.
    ///
    /// The document end is owned by no span and yields `None`.
    pub fn find_span_at(&self, position: usize) -> Option<SpanPositionInfo> {
        self.spans.iter().enumerate().find_map(|(span_index, span)| {
            let span_start = span.start();
            let span_end = span.position;
            (span_start <= position && position < span_end).then_some(SpanPositionInfo {
                span_index,
                span_start,
                span_end,
                span_offset: position - span_start,
            })
        })
    }

    pub(crate) fn make_span(&mut self, content: SpanContent, paragraph_style: ParagraphStyle) -> Span {
        let id = SpanId(self.next_id);
        self.next_id += 1;
        Span {
            id,
            content,
            position: 0,
            paragraph_style,
        }
    }

    /// Inserts new content at `index`, or appends when `index` is `None` or
    /// past the end. Returns the index the span landed at.
    pub fn insert_span(&mut self, content: SpanContent, index: Option<usize>) -> usize {
        let span = self.make_span(content, ParagraphStyle::default());
        self.insert_prepared(span, index)
    }

    pub(crate) fn insert_prepared(&mut self, span: Span, index: Option<usize>) -> usize {
        let index = match index {
            Some(index) if index < self.spans.len() => index,
            _ => self.spans.len(),
        };
        self.spans.insert(index, span);
        self.rewalk();
        index
    }

    /// Splits the span owning `position` so that a span boundary falls on it.
    ///
    /// Returns the index of the span starting at `position`, the unchanged
    /// index when `position` already sits on a boundary, or `None` when the
    /// store is empty or `position` is the document end.
    pub fn split_span_at(&mut self, position: usize) -> Option<usize> {
        let info = self.find_span_at(position)?;
        if info.span_offset == 0 {
            return Some(info.span_index);
        }
        let original = &mut self.spans[info.span_index];
        let SpanContent::Text { text, style } = &mut original.content else {
            return Some(info.span_index);
        };
        let (prefix, suffix) = split_text(text, info.span_offset);
        *text = prefix;
        let suffix_content = SpanContent::Text {
            text: suffix,
            style: style.clone(),
        };
        let paragraph_style = original.paragraph_style;
        let span = self.make_span(suffix_content, paragraph_style);
        self.spans.insert(info.span_index + 1, span);
        self.rewalk();
        Some(info.span_index + 1)
    }

    /// Removes `[start, end)` from the document. Reversed bounds are swapped
    /// and both are clamped; an empty range is a no-op.
    pub fn remove_range(&mut self, start: usize, end: usize) -> bool {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        let len = self.text_len();
        let end = end.min(len);
        if start >= end {
            return false;
        }
        let (Some(start_info), Some(end_info)) =
            (self.find_span_at(start), self.find_span_at(end - 1))
        else {
            return false;
        };

        if start_info.span_index == end_info.span_index {
            self.remove_within_span(start, end, start_info);
        } else {
            self.remove_across_spans(start, end, start_info, end_info);
        }
        self.rewalk();
        true
    }

    fn remove_within_span(&mut self, start: usize, end: usize, info: SpanPositionInfo) {
        if start == info.span_start && end == info.span_end {
            self.spans.remove(info.span_index);
            return;
        }
        if let SpanContent::Text { text, .. } = &mut self.spans[info.span_index].content {
            let (prefix, rest) = split_text(text, start - info.span_start);
            let (_, suffix) = split_text(&rest, end - start);
            *text = prefix + &suffix;
        }
    }

    fn remove_across_spans(
        &mut self,
        start: usize,
        end: usize,
        start_info: SpanPositionInfo,
        end_info: SpanPositionInfo,
    ) {
        let mut remove_from = start_info.span_index + 1;
        let mut remove_to = end_info.span_index;

        if start == start_info.span_start {
            remove_from = start_info.span_index;
        } else if let SpanContent::Text { text, .. } = &mut self.spans[start_info.span_index].content
        {
            let (prefix, _) = split_text(text, start - start_info.span_start);
            *text = prefix;
        }

        if end == end_info.span_end {
            remove_to = end_info.span_index + 1;
        } else if let SpanContent::Text { text, .. } = &mut self.spans[end_info.span_index].content {
            let (_, suffix) = split_text(text, end - end_info.span_start);
            *text = suffix;
        }

        self.spans.drain(remove_from..remove_to);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Span> {
        if index >= self.spans.len() {
            return None;
        }
        let span = self.spans.remove(index);
        self.rewalk();
        Some(span)
    }

    /// Removes every listed index, highest first, then re-walks once.
    pub(crate) fn remove_indices(&mut self, indices: &mut Vec<usize>) {
        indices.sort_unstable();
        indices.dedup();
        for index in indices.iter().rev() {
            if *index < self.spans.len() {
                self.spans.remove(*index);
            }
        }
        self.rewalk();
    }

    /// Recomputes every cumulative position.
    pub(crate) fn rewalk(&mut self) {
        let mut position = 0;
        for span in &mut self.spans {
            position += span.content.len();
            span.position = position;
        }
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(texts: &[&str]) -> SpanStore {
        let mut store = SpanStore::new();
        for text in texts {
            store.insert_span(SpanContent::text(*text), None);
        }
        store
    }

    fn texts(store: &SpanStore) -> Vec<String> {
        store.spans().iter().map(Span::text).collect()
    }

    fn positions(store: &SpanStore) -> Vec<usize> {
        store.spans().iter().map(Span::position).collect()
    }

    #[test]
    fn find_span_at_uses_half_open_ranges() {
        let store = store_with(&["ab", "cd"]);
        let info = store.find_span_at(2).unwrap();
        assert_eq!(info.span_index, 1);
        assert_eq!(info.span_offset, 0);
        assert_eq!(store.find_span_at(1).unwrap().span_index, 0);
        assert_eq!(store.find_span_at(4), None);
    }

    #[test]
    fn split_inside_span_returns_suffix_index() {
        let mut store = store_with(&["HelloWorld"]);
        assert_eq!(store.split_span_at(5), Some(1));
        assert_eq!(texts(&store), vec!["Hello", "World"]);
        assert_eq!(positions(&store), vec![5, 10]);
    }

    #[test]
    fn split_on_boundary_keeps_index() {
        let mut store = store_with(&["ab", "cd"]);
        assert_eq!(store.split_span_at(2), Some(1));
        assert_eq!(store.split_span_at(0), Some(0));
        assert_eq!(store.span_count(), 2);
    }

    #[test]
    fn split_at_document_end_or_empty_store_is_none() {
        let mut store = store_with(&["ab"]);
        assert_eq!(store.split_span_at(2), None);
        let mut empty = SpanStore::new();
        assert_eq!(empty.split_span_at(0), None);
    }

    #[test]
    fn split_copies_style_to_suffix() {
        let mut store = SpanStore::new();
        let style = super::super::span::TextStyle::default().with_font_size(30.0);
        store.insert_span(SpanContent::styled_text("abcd", style.clone()), None);
        store.split_span_at(2);
        assert_eq!(store.get(1).unwrap().text_style(), Some(&style));
        assert_ne!(store.get(0).unwrap().id(), store.get(1).unwrap().id());
    }

    #[test]
    fn remove_range_across_spans() {
        let mut store = store_with(&["AB", "CD", "EF"]);
        assert!(store.remove_range(1, 5));
        assert_eq!(texts(&store), vec!["A", "F"]);
        assert_eq!(positions(&store), vec![1, 2]);
        assert_eq!(store.text_len(), 2);
    }

    #[test]
    fn remove_range_inside_one_span() {
        let mut store = store_with(&["abcdef"]);
        assert!(store.remove_range(4, 1));
        assert_eq!(texts(&store), vec!["aef"]);
    }

    #[test]
    fn remove_range_drops_fully_covered_spans() {
        let mut store = store_with(&["ab", "cd", "ef"]);
        assert!(store.remove_range(2, 6));
        assert_eq!(texts(&store), vec!["ab"]);
        assert!(store.remove_range(0, 2));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_range_clamps_and_ignores_empty_ranges() {
        let mut store = store_with(&["abc"]);
        assert!(!store.remove_range(2, 2));
        assert!(!store.remove_range(5, 9));
        assert!(store.remove_range(1, 99));
        assert_eq!(texts(&store), vec!["a"]);
    }

    #[test]
    fn insert_span_clamps_index_and_rewalks() {
        let mut store = store_with(&["ab"]);
        assert_eq!(store.insert_span(SpanContent::text("x"), Some(0)), 0);
        assert_eq!(store.insert_span(SpanContent::text("yz"), Some(99)), 2);
        assert_eq!(texts(&store), vec!["x", "ab", "yz"]);
        assert_eq!(positions(&store), vec![1, 3, 5]);
    }

    #[test]
    fn placeholders_count_as_one_character() {
        let mut store = store_with(&["ab"]);
        store.insert_span(
            SpanContent::Image(super::super::span::ImageAttributes::new("a.png")),
            None,
        );
        assert_eq!(store.text_len(), 3);
        assert_eq!(store.content_text(), "ab ");
        assert!(!store.all_placeholders());
    }
}
