use kurbo::{Point, Rect, Size};
use log::{debug, warn};

use super::content::grapheme_len_at;
use super::span::{ImageAttributes, SpanContent, TextStyle};
use super::input::{AutoScrollParam, EdgeDetectionStrategy};
use super::{CaretMoveIntent, RichEditor, SpanResultKind};
use crate::host::DirtyFlag;
use crate::services::CopyOptions;

/// Selection anchor (`base`) and moving end (`destination`).
///
/// Both ends are unset when there is no selection; a collapsed range counts
/// as valid but not as selected.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TextSelector {
    base_offset: Option<usize>,
    destination_offset: Option<usize>,
    pub first_handle: Rect,
    pub second_handle: Rect,
}

impl TextSelector {
    pub fn update(&mut self, base: usize, destination: usize) {
        self.base_offset = Some(base);
        self.destination_offset = Some(destination);
    }

    /// Collapses the selection onto `extend`.
    pub fn update_extend(&mut self, extend: usize) {
        self.update(extend, extend);
    }

    pub fn reset(&mut self) {
        self.base_offset = None;
        self.destination_offset = None;
    }

    pub fn base_offset(&self) -> Option<usize> {
        self.base_offset
    }

    pub fn destination_offset(&self) -> Option<usize> {
        self.destination_offset
    }

    pub fn is_valid(&self) -> bool {
        self.base_offset.is_some() && self.destination_offset.is_some()
    }

    pub fn start_equal_to_dest(&self) -> bool {
        self.base_offset == self.destination_offset
    }

    /// Valid and non-empty.
    pub fn is_selected(&self) -> bool {
        self.is_valid() && !self.start_equal_to_dest()
    }

    pub fn text_start(&self) -> usize {
        match (self.base_offset, self.destination_offset) {
            (Some(base), Some(dest)) => base.min(dest),
            _ => 0,
        }
    }

    pub fn text_end(&self) -> usize {
        match (self.base_offset, self.destination_offset) {
            (Some(base), Some(dest)) => base.max(dest),
            _ => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GetSpansMethod {
    /// Embedder query: missing ends default to the document bounds.
    GetSpans,
    /// Selection report: ends are only clamped to the document length.
    OnSelect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionType {
    Text,
    Image,
    Mixed,
}

/// The part of one span covered by a selection.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultObject {
    pub span_index: usize,
    pub span_range: (usize, usize),
    pub offset_in_span: (usize, usize),
    pub kind: SpanResultKind,
    pub value: String,
    pub text_style: Option<TextStyle>,
    pub image: Option<ImageAttributes>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct SelectionInfo {
    pub selection: (usize, usize),
    pub result_objects: Vec<ResultObject>,
}

impl SelectionInfo {
    pub fn is_empty(&self) -> bool {
        self.result_objects.is_empty()
    }
}

impl RichEditor {
    /// Describes the spans covered by `[start, end)`.
    pub fn get_spans_info(&self, start: isize, end: isize, method: GetSpansMethod) -> SelectionInfo {
        let len = self.store.text_len() as isize;
        let (real_start, real_end) = match method {
            GetSpansMethod::GetSpans => {
                let start = if start == -1 { 0 } else { start };
                let end = if end == -1 { len } else { end };
                let (start, end) = if start > end { (end, start) } else { (start, end) };
                (start.max(0), end.min(len))
            }
            GetSpansMethod::OnSelect => (start.min(len), end.min(len)),
        };

        let mut info = SelectionInfo {
            selection: (real_start.max(0) as usize, real_end.max(0) as usize),
            result_objects: Vec::new(),
        };
        if real_start > len
            || real_end < 0
            || self.store.is_empty()
            || (start > len && end > len)
            || real_start == real_end
        {
            return info;
        }
        let (start, end) = info.selection;
        for (index, span) in self.store.spans().iter().enumerate() {
            let (span_start, span_end) = (span.start(), span.position());
            let object = match span.content() {
                SpanContent::Text { text, style } => {
                    let from = start.max(span_start);
                    let to = end.min(span_end);
                    if from >= to {
                        continue;
                    }
                    ResultObject {
                        span_index: index,
                        span_range: (span_start, span_end),
                        offset_in_span: (from - span_start, to - span_start),
                        kind: SpanResultKind::Text,
                        value: text.clone(),
                        text_style: style.clone(),
                        image: None,
                    }
                }
                other => {
                    if span_start < start || span_end > end {
                        continue;
                    }
                    let (kind, value, image) = match other {
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
                            Some(ImageAttributes::new(placeholder.key.clone()).with_size(placeholder.size)),
                        ),
                        SpanContent::Text { .. } => continue,
                    };
                    ResultObject {
                        span_index: index,
                        span_range: (span_start, span_end),
                        offset_in_span: (0, 1),
                        kind,
                        value,
                        text_style: span.text_style().cloned(),
                        image,
                    }
                }
            };
            info.result_objects.push(object);
        }
        info
    }

    /// Plain text of the text spans overlapping `[start, end)`.
    pub fn get_selected_text(&self, start: usize, end: usize) -> String {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        let mut selected = String::new();
        for span in self.store.spans() {
            if span.start() >= end {
                break;
            }
            let SpanContent::Text { text, .. } = span.content() else {
                continue;
            };
            let from = start.max(span.start());
            let to = end.min(span.position());
            if from < to {
                selected.extend(
                    text.chars()
                        .skip(from - span.start())
                        .take(to - from),
                );
            }
        }
        selected
    }

    pub(crate) fn update_selection_type(&mut self, info: &SelectionInfo) {
        let has_text = info
            .result_objects
            .iter()
            .any(|object| object.kind != SpanResultKind::Image);
        let has_image = info
            .result_objects
            .iter()
            .any(|object| object.kind == SpanResultKind::Image);
        self.selected_type = match (has_text, has_image) {
            (true, true) => Some(SelectionType::Mixed),
            (true, false) => Some(SelectionType::Text),
            (false, true) => Some(SelectionType::Image),
            (false, false) => None,
        };
    }

    /// Reports `[start, end)` to `on_select` when it covers any span.
    pub(crate) fn fire_on_select(&mut self, start: usize, end: usize) {
        let info = self.get_spans_info(start as isize, end as isize, GetSpansMethod::OnSelect);
        if !info.is_empty()
            && let Some(listener) = self.listener.as_mut()
        {
            listener.on_select(&info);
        }
        self.update_selection_type(&info);
    }

    /// Drops the selection; `on_select` is told with an empty report.
    pub fn reset_selection(&mut self) {
        if !self.selector.is_valid() {
            return;
        }
        self.selector.reset();
        let info = self.get_spans_info(-1, -1, GetSpansMethod::OnSelect);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_select(&info);
        }
        self.update_selection_type(&info);
        self.mark_dirty(DirtyFlag::Render);
    }

    /// Moves the selection to `(start, end)`, reporting it only when the
    /// ordered range actually changed.
    pub fn handle_selection_change(&mut self, start: usize, end: usize) {
        let unchanged = self.selector.is_valid()
            && self.selector.text_start() == start.min(end)
            && self.selector.text_end() == start.max(end);
        self.selector.update(start, end);
        if unchanged {
            return;
        }
        let info = self.get_spans_info(start as isize, end as isize, GetSpansMethod::OnSelect);
        self.update_selection_type(&info);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_selection_change(start.min(end), start.max(end));
        }
    }

    /// Embedder selection. `(-1, -1)` selects everything; a reversed range
    /// clears the selection.
    pub fn set_selection(&mut self, start: isize, end: isize) -> bool {
        if !self.focused {
            debug!("set_selection ignored without focus");
            return false;
        }
        if start > end {
            self.reset_selection();
            return false;
        }
        let len = self.store.text_len();
        let (start, end) = if start == -1 && end == -1 {
            (0, len)
        } else {
            (start.clamp(0, len as isize) as usize, end.clamp(0, len as isize) as usize)
        };
        let changed = !self.selector.is_valid()
            || self.selector.text_start() != start
            || self.selector.text_end() != end;
        self.selector.update(start, end);
        if self.selector.is_selected() {
            self.stop_twinkling();
            if changed {
                self.fire_on_select(start, end);
            }
        }
        self.caret_position = self.selector.text_end();
        self.move_caret_to_content_rect();
        self.update_caret_info_to_controller();
        if self.is_select_overlay_on() {
            self.show_select_overlay();
        }
        self.mark_dirty(DirtyFlag::Render);
        changed
    }

    pub fn handle_on_select_all(&mut self) {
        let len = self.store.text_len();
        self.selector.update(0, len);
        self.fire_on_select(0, len);
        self.caret_position = len;
        self.move_caret_to_content_rect();
        self.start_twinkling();
        if self.is_select_overlay_on() {
            self.show_select_overlay();
        }
        self.mark_dirty(DirtyFlag::Render);
    }

    /// Shift-extension: moves the free end of the selection, keeping the
    /// other end fixed.
    pub fn handle_select(&mut self, intent: CaretMoveIntent) -> bool {
        let caret = self.caret_position;
        let fixed = match (self.selector.base_offset(), self.selector.destination_offset()) {
            (Some(base), Some(dest)) if self.selector.is_selected() => {
                if base == caret { dest } else { base }
            }
            _ => caret,
        };
        let target = match intent {
            CaretMoveIntent::Left
            | CaretMoveIntent::Right
            | CaretMoveIntent::Up
            | CaretMoveIntent::Down => self.caret_move_target(intent, caret),
            other => {
                warn!("unsupported select intent {other:?}");
                return false;
            }
        };
        let target = target.min(self.store.text_len());
        if target == caret {
            return false;
        }
        self.selector.update(fixed, target);
        self.fire_on_select(fixed.min(target), fixed.max(target));
        self.caret_position = target;
        self.move_caret_to_content_rect();
        self.start_twinkling();
        self.mark_dirty(DirtyFlag::Render);
        true
    }

    /// Word selection at `point`, given relative to the text rect.
    ///
    /// Starts from the grapheme cluster under the point, widened to an entity
    /// when detection is on. A hit on the empty area after a placeholder
    /// selects the placeholder instead.
    pub fn init_selection(&mut self, point: Point) -> (usize, usize) {
        self.init_selection_at(point);
        (self.selector.text_start(), self.selector.text_end())
    }

    /// Returns whether entity detection widened the selection.
    fn init_selection_at(&mut self, point: Point) -> bool {
        let len = self.store.text_len();
        let current = self.paragraphs.index_at(&self.store, point).min(len);
        let content = self.store.content_text();
        let next = (current + grapheme_len_at(&content, current)).min(len);

        let adjusted = self.adjust_word_selection(current, next);
        let (start, end) = adjusted.unwrap_or((current, next));
        self.selector.update(start, end);

        let rects = self.paragraphs.range_rects(&self.store, current, next);
        if rects.is_empty() && current > 0 {
            let owner = self
                .store
                .find_span_at(current)
                .map_or(self.store.span_count(), |info| info.span_index);
            if owner > 0
                && self
                    .store
                    .get(owner - 1)
                    .is_some_and(|span| span.is_placeholder())
            {
                self.selector.update(current - 1, current);
                return false;
            }
        }
        if adjusted.is_some() {
            return true;
        }

        let selected_single = rects.len() == 1 && (point.x < rects[0].x0 || point.y < rects[0].y0);
        let selected_last = rects.is_empty() && current == len;
        if (selected_single || selected_last) && current > 0 {
            let next = if selected_last { current + 1 } else { next };
            let previous = self
                .paragraphs
                .range_rects(&self.store, current - 1, next - 1);
            if let [rect] = previous.as_slice() {
                let in_range = point.x >= rect.x0
                    && point.x <= rect.x1
                    && point.y >= rect.y0
                    && point.y <= rect.y1;
                let other_line = rects.first().is_some_and(|first| first.y0 != rect.y0);
                if in_range || (!selected_last && other_line) {
                    self.selector.update(current - 1, next - 1);
                }
            }
        }
        false
    }

    /// Long press or double tap at `point` (host coordinates): selects the
    /// word under it and shows handles.
    ///
    /// When the press lands outside the picked range, and no entity widened
    /// it, the selection collapses to a caret at the press.
    pub fn handle_long_press(&mut self, point: Point) -> bool {
        if self.config.copy_options == CopyOptions::None || self.mouse.pressed {
            return false;
        }
        self.mouse.long_press = true;
        let origin = self.text_rect().origin();
        let local = Point::new(point.x - origin.x, point.y - origin.y);
        let adjusted = self.init_selection_at(local);
        let global = point + self.global_offset().to_vec2();
        if !adjusted && !self.between_selected_position(global) {
            let position = self.paragraphs.index_at(&self.store, local).min(self.store.text_len());
            self.selector.update_extend(position);
        }
        let (start, end) = (self.selector.text_start(), self.selector.text_end());
        debug!("long press selected [{start}, {end})");

        let info = self.get_spans_info(start as isize, end as isize, GetSpansMethod::OnSelect);
        self.update_selection_type(&info);
        self.calculate_handle_offset();
        self.mark_dirty(DirtyFlag::Render);
        if !info.is_empty()
            && let Some(listener) = self.listener.as_mut()
        {
            listener.on_select(&info);
        }
        self.caret_position = end.min(self.store.text_len());
        self.request_focus();
        self.request_keyboard(true);
        self.stop_twinkling();
        self.show_select_overlay();
        true
    }

    /// Recomputes both handle rects in root coordinates.
    pub fn calculate_handle_offset(&mut self) {
        let (Some(base), Some(dest)) = (self.selector.base_offset(), self.selector.destination_offset())
        else {
            return;
        };
        let global = self.global_offset().to_vec2();
        let len = self.store.text_len();
        let first = self.caret_offset(base.min(len));
        let second = self.caret_offset(dest.min(len));
        let width = self.config.handle_line_width;

        let mut first_origin = first.offset + global;
        let mut second_origin = second.offset + global;
        let (mut first_height, mut second_height) = (first.height, second.height);
        if len == 0 {
            first_height = first.height / 2.0;
            second_height = second.height / 2.0;
            first_origin.y += first_height / 2.0;
            second_origin.y += second_height;
        }
        self.selector.first_handle = Rect::from_origin_size(first_origin, Size::new(width, first_height));
        self.selector.second_handle = Rect::from_origin_size(second_origin, Size::new(width, second_height));
    }

    /// A handle was dragged to `handle` (root coordinates).
    pub fn on_handle_move(&mut self, handle: Rect, is_first: bool) {
        if !self.selector.is_valid() {
            return;
        }
        self.update_selection_by_handle(handle, is_first);
        if !is_first && let Some(dest) = self.selector.destination_offset() {
            self.caret_position = dest.min(self.store.text_len());
        }
        let global = self.global_offset();
        let point = Point::new(handle.x0 - global.x, handle.y0 - global.y);
        self.auto_scroll_by_edge_detection(
            AutoScrollParam::handle(handle, is_first),
            point,
            EdgeDetectionStrategy::OutBoundary,
        );
    }

    /// Moves the end of the selection owned by the dragged handle to the
    /// glyph under it, clamped into the content rect.
    pub(crate) fn update_selection_by_handle(&mut self, handle: Rect, is_first: bool) {
        let (Some(base), Some(dest)) = (self.selector.base_offset(), self.selector.destination_offset())
        else {
            return;
        };
        let global = self.global_offset().to_vec2();
        let content = self.content_rect + global;
        let x = handle.x0.clamp(content.x0, content.x1);
        let y = handle.y0.clamp(content.y0, content.y1);
        let text_origin = self.text_rect().origin() + global;
        let local = Point::new(x - text_origin.x, y - text_origin.y);

        if is_first {
            let start = self.paragraphs.index_at(&self.store, local);
            self.handle_selection_change(start, dest);
        } else {
            let bottom = Point::new(local.x, local.y + handle.height());
            let end = self.paragraphs.index_at(&self.store, bottom);
            self.handle_selection_change(base, end);
        }
        self.mark_dirty(DirtyFlag::Render);
    }

    pub fn on_handle_move_done(&mut self, _handle: Rect, _is_first: bool) {
        let (start, end) = (self.selector.text_start(), self.selector.text_end());
        self.fire_on_select(start, end);
        self.caret_position = end.min(self.store.text_len());
        self.show_select_overlay();
        self.stop_auto_scroll();
        self.mark_dirty(DirtyFlag::Render);
    }

    /// True when `global` (root coordinates) falls on the highlighted range.
    pub fn between_selected_position(&self, global: Point) -> bool {
        if !self.selector.is_selected() {
            return false;
        }
        let offset = self.global_offset();
        let origin = self.text_rect().origin();
        let local = Point::new(global.x - offset.x - origin.x, global.y - offset.y - origin.y);
        self.paragraphs
            .range_rects(&self.store, self.selector.text_start(), self.selector.text_end())
            .iter()
            .any(|rect| rect.contains(local))
    }
}
