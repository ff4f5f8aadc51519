use log::debug;

use super::content::{char_len, insert_str_at, remove_chars};
use super::span::{ImageAttributes, ParagraphStyle, PlaceholderRef, Span, SpanContent, TextStyle};
use super::styles::UpdateParagraphStyle;
use super::{OperationRecord, RichEditor};

/// Payload of the `about_to_ime_input` hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertValueInfo {
    pub insert_offset: usize,
    pub insert_value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanResultKind {
    Text,
    Image,
    Symbol,
}

/// Description of one span touched by an insertion or deletion.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanResult {
    pub span_index: usize,
    pub span_range: (usize, usize),
    pub kind: SpanResultKind,
    pub offset_in_span: usize,
    pub erase_length: usize,
    pub value: String,
    pub text_style: Option<TextStyle>,
    pub image: Option<ImageAttributes>,
}

impl SpanResult {
    pub(crate) fn of_span(
        span_index: usize,
        span: &Span,
        offset_in_span: usize,
        erase_length: usize,
    ) -> Self {
        let (kind, value, image) = match span.content() {
            SpanContent::Text { text, .. } => (SpanResultKind::Text, text.clone(), None),
            SpanContent::Symbol { code_point, .. } => {
                (SpanResultKind::Symbol, code_point.to_string(), None)
            }
            SpanContent::Image(attributes) => (
                SpanResultKind::Image,
                attributes.src.clone(),
                Some(attributes.clone()),
            ),
            SpanContent::Placeholder(placeholder) => (
                SpanResultKind::Image,
                placeholder.key.clone(),
                Some(ImageAttributes {
                    src: placeholder.key.clone(),
                    size: Some(placeholder.size),
                    ..ImageAttributes::default()
                }),
            ),
        };
        Self {
            span_index,
            span_range: (span.start(), span.position()),
            kind,
            offset_in_span,
            erase_length,
            value,
            text_style: span.text_style().cloned(),
            image,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteDirection {
    Backward,
    Forward,
}

/// Payload of the `about_to_delete` hook.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteValue {
    pub offset: usize,
    pub direction: DeleteDirection,
    pub length: usize,
    pub spans: Vec<SpanResult>,
}

impl DeleteValue {
    fn new(offset: usize, direction: DeleteDirection, length: usize) -> Self {
        Self {
            offset,
            direction,
            length,
            spans: Vec::new(),
        }
    }
}

/// Range given by the embedder; missing ends default to the document bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RangeOptions {
    pub start: Option<isize>,
    pub end: Option<isize>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TextSpanOptions {
    pub value: String,
    pub offset: Option<isize>,
    pub style: Option<TextStyle>,
    pub paragraph_style: Option<UpdateParagraphStyle>,
}

impl TextSpanOptions {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, offset: isize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = Some(style);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ImageSpanOptions {
    pub attributes: ImageAttributes,
    pub offset: Option<isize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SymbolSpanOptions {
    pub code_point: char,
    pub style: Option<TextStyle>,
    pub offset: Option<isize>,
}

impl RichEditor {
    /// Offsets outside the document append.
    fn resolve_offset(&self, offset: Option<isize>) -> Option<usize> {
        let offset = usize::try_from(offset?).ok()?;
        (offset < self.store.text_len()).then_some(offset)
    }

    /// Index at which content added at `offset` lands, splitting the owning
    /// text span first.
    fn insertion_index(&mut self, offset: Option<usize>, index: Option<usize>) -> Option<usize> {
        match offset {
            Some(offset) => self.store.split_span_at(offset),
            None => index,
        }
    }

    pub fn add_text_span(&mut self, options: TextSpanOptions) -> usize {
        let before = self
            .resolve_offset(options.offset)
            .unwrap_or(self.store.text_len());
        self.history.push(OperationRecord {
            before_caret_position: before,
            after_caret_position: before + char_len(&options.value),
            add_text: Some(options.value.clone()),
            delete_text: None,
        });
        self.add_text_span_operation(options, false, None)
    }

    pub(crate) fn add_text_span_operation(
        &mut self,
        options: TextSpanOptions,
        is_paste: bool,
        index: Option<usize>,
    ) -> usize {
        let offset = self.resolve_offset(options.offset);
        let target = self.insertion_index(offset, index);
        let content = SpanContent::Text {
            text: options.value,
            style: options.style,
        };
        let span = self.store.make_span(content, ParagraphStyle::default());
        let span_index = self.store.insert_prepared(span, target);

        if let Some(paragraph_style) = options.paragraph_style
            && let Some(span) = self.store.get(span_index)
        {
            let (start, end) = (span.start(), span.position());
            self.update_paragraph_style(start, end, &paragraph_style);
        }
        if !is_paste && self.selector.is_valid() {
            self.reset_selection();
        }
        self.span_node_fission(span_index);
        debug!("text span added at index {span_index}");
        self.after_content_change();
        span_index
    }

    pub fn add_image_span(&mut self, options: ImageSpanOptions) -> usize {
        self.add_placeholder_like(SpanContent::Image(options.attributes), options.offset, false)
    }

    pub fn add_placeholder_span(&mut self, placeholder: PlaceholderRef, offset: Option<isize>) -> usize {
        self.add_placeholder_like(SpanContent::Placeholder(placeholder), offset, false)
    }

    pub(crate) fn add_placeholder_like(
        &mut self,
        content: SpanContent,
        offset: Option<isize>,
        is_paste: bool,
    ) -> usize {
        let resolved = self.resolve_offset(offset);
        let before = resolved.unwrap_or(self.store.text_len());
        self.history.push(OperationRecord {
            before_caret_position: before,
            after_caret_position: before + 1,
            add_text: Some(" ".to_string()),
            delete_text: None,
        });

        let target = self.insertion_index(resolved, None);
        let span = self.store.make_span(content, ParagraphStyle::default());
        let span_index = self.store.insert_prepared(span, target);

        match resolved {
            Some(offset) if offset <= self.caret_position => self.caret_position = offset + 1,
            _ => self.caret_position = self.store.text_len(),
        }
        if !is_paste && self.selector.is_valid() {
            self.reset_selection();
        }
        debug!("placeholder span added at index {span_index}");
        self.after_content_change();
        span_index
    }

    pub fn add_symbol_span(&mut self, options: SymbolSpanOptions) -> usize {
        let resolved = self.resolve_offset(options.offset);
        let before = resolved.unwrap_or(self.store.text_len());
        self.history.push(OperationRecord {
            before_caret_position: before,
            after_caret_position: before + 1,
            add_text: Some(options.code_point.to_string()),
            delete_text: None,
        });

        let target = self.insertion_index(resolved, None);
        let content = SpanContent::Symbol {
            code_point: options.code_point,
            style: options.style,
        };
        let span = self.store.make_span(content, ParagraphStyle::default());
        let span_index = self.store.insert_prepared(span, target);
        self.after_content_change();
        span_index
    }

    /// Cuts the text span at `index` after every line separator that is not
    /// its last character. The new spans copy the style.
    pub(crate) fn span_node_fission(&mut self, index: usize) {
        let Some(span) = self.store.get(index) else {
            return;
        };
        let SpanContent::Text { text, .. } = span.content() else {
            return;
        };
        let start = span.start();
        let len = char_len(text);
        let cuts: Vec<usize> = text
            .chars()
            .enumerate()
            .filter(|(offset, ch)| *ch == '\n' && offset + 1 < len)
            .map(|(offset, _)| start + offset + 1)
            .collect();
        for cut in cuts {
            self.store.split_span_at(cut);
        }
    }

    /// Types `value` at the caret, replacing the selection if there is one.
    pub fn insert_value(&mut self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        let before = self
            .selection()
            .map(|(start, _)| start)
            .unwrap_or(self.caret_position);
        let selected = self
            .selection()
            .map(|(start, end)| self.store.text_between(start, end))
            .filter(|text| !text.is_empty());
        if !self.insert_value_operation(value) {
            return false;
        }
        self.history.push(OperationRecord {
            before_caret_position: before,
            after_caret_position: before + char_len(value),
            add_text: Some(value.to_string()),
            delete_text: selected,
        });
        true
    }

    pub(crate) fn insert_value_operation(&mut self, value: &str) -> bool {
        debug!("insert value {value:?}");
        let selection = self.selection();
        if let Some((start, _)) = selection {
            self.caret_position = start;
        }
        let info = InsertValueInfo {
            insert_offset: self.caret_position,
            insert_value: value.to_string(),
        };
        let accepted = self
            .listener
            .as_mut()
            .is_none_or(|listener| listener.about_to_ime_input(&info));
        if !accepted {
            debug!("insertion vetoed at {}", info.insert_offset);
            return false;
        }
        if let Some((start, end)) = selection {
            self.delete_forward_operation(end - start);
            self.reset_selection();
        }
        if !self.caret.visible {
            self.start_twinkling();
        }

        let insert_offset = self.caret_position;
        let span_index = self.insert_at_caret(value);
        self.caret_position = insert_offset + char_len(value);
        self.after_content_change();

        let owner = self
            .store
            .find_span_at(insert_offset)
            .map(|info| info.span_index)
            .unwrap_or(span_index);
        if let Some(span) = self.store.get(owner) {
            let offset_in_span = insert_offset.saturating_sub(span.start());
            let result = SpanResult::of_span(owner, span, offset_in_span, char_len(value));
            if let Some(listener) = self.listener.as_mut() {
                listener.on_ime_input_complete(&result);
            }
        }
        true
    }

    /// Places `value` into the span structure at the caret and returns the
    /// index of the receiving span. The caret is not moved.
    pub(crate) fn insert_at_caret(&mut self, value: &str) -> usize {
        let caret = self.caret_position;
        let index = match self.store.find_span_at(caret) {
            None => {
                let count = self.store.span_count();
                match self.store.spans().last() {
                    Some(last) if last.is_text() && last.ends_with_newline() => {
                        let style = self.typing_style.clone().or_else(|| last.text_style().cloned());
                        let paragraph = last.paragraph_style().clone();
                        self.create_styled_span(value, style, paragraph, count)
                    }
                    Some(last) if last.is_text() && !self.typing_style_differs(last) => {
                        self.append_to_span(count - 1, value);
                        count - 1
                    }
                    _ => self.create_text_span(value, count),
                }
            }
            Some(info) => {
                let previous = info
                    .span_index
                    .checked_sub(1)
                    .and_then(|index| self.store.get(index))
                    .filter(|span| span.is_text() && !span.ends_with_newline());
                match previous {
                    Some(previous) if info.span_offset == 0 => {
                        if self.typing_style_differs(previous) {
                            self.create_text_span(value, info.span_index)
                        } else {
                            self.append_to_span(info.span_index - 1, value);
                            info.span_index - 1
                        }
                    }
                    _ => self.insert_into_owner(value, info.span_index, info.span_offset),
                }
            }
        };
        if value.contains('\n') {
            self.span_node_fission(index);
        }
        index
    }

    fn insert_into_owner(&mut self, value: &str, index: usize, offset: usize) -> usize {
        let Some(span) = self.store.get(index) else {
            return self.create_text_span(value, index);
        };
        if !span.is_text() {
            return self.create_text_span(value, index);
        }
        if self.typing_style_differs(span) {
            let target = self.store.split_span_at(self.caret_position).unwrap_or(index);
            return self.create_text_span(value, target);
        }
        if let Some(span) = self.store.get_mut(index)
            && let SpanContent::Text { text, .. } = &mut span.content
        {
            insert_str_at(text, offset, value);
        }
        self.store.rewalk();
        index
    }

    fn append_to_span(&mut self, index: usize, value: &str) {
        if let Some(span) = self.store.get_mut(index)
            && let SpanContent::Text { text, .. } = &mut span.content
        {
            text.push_str(value);
        }
        self.store.rewalk();
    }

    fn create_text_span(&mut self, value: &str, index: usize) -> usize {
        let style = self.typing_style.clone();
        self.create_styled_span(value, style, ParagraphStyle::default(), index)
    }

    fn create_styled_span(
        &mut self,
        value: &str,
        style: Option<TextStyle>,
        paragraph: ParagraphStyle,
        index: usize,
    ) -> usize {
        let style = style
            .unwrap_or_else(|| TextStyle::default().with_font_size(self.config.default_text_size));
        let span = self
            .store
            .make_span(SpanContent::styled_text(value, style), paragraph);
        self.store.insert_prepared(span, Some(index))
    }

    fn typing_style_differs(&self, span: &Span) -> bool {
        self.typing_style.is_some() && !self.has_same_typing_style(span)
    }

    /// Backspace or delete key.
    pub fn handle_on_delete(&mut self, backward: bool) -> bool {
        if backward {
            self.delete_backward(1)
        } else {
            self.delete_forward(1)
        }
    }

    pub fn delete_backward(&mut self, length: usize) -> bool {
        let before = self
            .selection()
            .map(|(_, end)| end)
            .unwrap_or(self.caret_position);
        let deleted = self.delete_backward_operation(length);
        if deleted.is_empty() {
            return false;
        }
        self.history.push(OperationRecord {
            before_caret_position: before,
            after_caret_position: self.caret_position,
            add_text: None,
            delete_text: Some(deleted),
        });
        true
    }

    pub(crate) fn delete_backward_operation(&mut self, length: usize) -> String {
        let mut length = length;
        if let Some((start, end)) = self.selection() {
            length = end - start;
            self.caret_position = end;
            self.reset_selection();
        }
        let caret = self.caret_position;
        if caret == 0 {
            self.reset_first_node_style();
            self.fire_delete(DeleteValue::new(0, DeleteDirection::Backward, 0));
            return String::new();
        }
        let start = caret.saturating_sub(length);
        let length = caret - start;
        let deleted = self.store.text_between(start, caret);
        if length == self.store.text_len() {
            self.reset_first_node_style();
        }

        let mut value = DeleteValue::new(start, DeleteDirection::Backward, length);
        value.spans = self.calc_delete_spans(start, length);
        if !self.fire_delete(value) {
            return String::new();
        }
        if !self.caret.visible {
            self.start_twinkling();
        }
        deleted
    }

    pub fn delete_forward(&mut self, length: usize) -> bool {
        let before = self
            .selection()
            .map(|(start, _)| start)
            .unwrap_or(self.caret_position);
        let deleted = self.delete_forward_operation(length);
        if deleted.is_empty() {
            return false;
        }
        self.history.push(OperationRecord {
            before_caret_position: before,
            after_caret_position: self.caret_position,
            add_text: None,
            delete_text: Some(deleted),
        });
        true
    }

    pub(crate) fn delete_forward_operation(&mut self, length: usize) -> String {
        let mut length = length;
        if let Some((start, end)) = self.selection() {
            length = end - start;
            self.caret_position = start;
            self.reset_selection();
        }
        let caret = self.caret_position;
        let len = self.store.text_len();
        if caret >= len || length == 0 {
            return String::new();
        }
        let end = (caret + length).min(len);
        let deleted = self.store.text_between(caret, end);

        let mut value = DeleteValue::new(caret, DeleteDirection::Forward, end - caret);
        value.spans = self.calc_delete_spans(caret, end - caret);
        if !self.fire_delete(value) {
            return String::new();
        }
        if !self.caret.visible {
            self.start_twinkling();
        }
        deleted
    }

    /// Describes every span intersecting `[position, position + length)`.
    fn calc_delete_spans(&self, position: usize, length: usize) -> Vec<SpanResult> {
        let Some(info) = self.store.find_span_at(position) else {
            return Vec::new();
        };
        let mut results = Vec::new();
        let mut current = position;
        let mut remaining = length;
        for (index, span) in self.store.spans().iter().enumerate().skip(info.span_index) {
            if remaining == 0 {
                break;
            }
            let (offset_in_span, erase) = match span.content() {
                SpanContent::Text { .. } => (
                    current - span.start(),
                    (span.position() - current).min(remaining),
                ),
                _ => (0, 1),
            };
            results.push(SpanResult::of_span(index, span, offset_in_span, erase));
            current += erase;
            remaining -= erase;
        }
        results
    }

    /// Runs the veto hook, applies the deletion and reports completion.
    fn fire_delete(&mut self, value: DeleteValue) -> bool {
        let accepted = self
            .listener
            .as_mut()
            .is_none_or(|listener| listener.about_to_delete(&value));
        if !accepted {
            debug!("deletion vetoed at {}", value.offset);
            return false;
        }
        self.delete_by_delete_value(&value);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_delete_complete();
        }
        true
    }

    fn delete_by_delete_value(&mut self, value: &DeleteValue) {
        let mut emptied = Vec::new();
        for result in &value.spans {
            let Some(span) = self.store.get_mut(result.span_index) else {
                continue;
            };
            match &mut span.content {
                SpanContent::Text { text, .. } => {
                    remove_chars(text, result.offset_in_span, result.erase_length);
                    if text.is_empty() {
                        emptied.push(result.span_index);
                    }
                }
                SpanContent::Symbol { .. } | SpanContent::Image(_) | SpanContent::Placeholder(_) => {
                    emptied.push(result.span_index);
                }
            }
        }
        self.store.remove_indices(&mut emptied);
        if value.direction == DeleteDirection::Backward {
            self.caret_position = self.caret_position.saturating_sub(value.length);
        }
        debug!(
            "deleted {} chars at {}, caret now {}",
            value.length, value.offset, self.caret_position
        );
        self.after_content_change();
    }

    /// Removes a range without going through the delete hooks.
    pub fn delete_spans(&mut self, options: RangeOptions) -> bool {
        let len = self.store.text_len() as isize;
        let mut start = options.start.unwrap_or(0);
        let mut end = options.end.unwrap_or(len);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        let start = start.max(0);
        let end = end.min(len);
        if start > len || end < 0 || start >= end {
            return false;
        }
        let (start, end) = (start as usize, end as usize);

        self.history.push(OperationRecord {
            before_caret_position: start,
            after_caret_position: start,
            add_text: None,
            delete_text: Some(self.store.text_between(start, end)),
        });
        if !self.store.remove_range(start, end) {
            return false;
        }
        self.reset_selection();
        self.caret_position = if self.store.text_len() == 0 { 0 } else { start };
        self.after_content_change();
        true
    }

    /// Up to `number` characters before the caret or the selection start.
    pub fn get_left_text_of_cursor(&self, number: usize) -> String {
        let start = self
            .selection()
            .map(|(start, _)| start)
            .unwrap_or(self.caret_position);
        let number = number.min(start);
        self.get_selected_text(start - number, start)
    }

    /// Up to `number` characters after the caret or the selection end.
    pub fn get_right_text_of_cursor(&self, number: usize) -> String {
        let end = self
            .selection()
            .map(|(_, end)| end)
            .unwrap_or(self.caret_position);
        self.get_selected_text(end, end.saturating_add(number).min(self.store.text_len()))
    }

    pub fn text_index_at_cursor(&self) -> usize {
        self.caret_position
    }
}
