use std::collections::BTreeMap;

use kurbo::Point;
use log::{debug, info, warn};

use super::content::char_len;
use super::selection::GetSpansMethod;
use super::{EditorTask, RichEditor, SpanResultKind};
use crate::host::DirtyFlag;
use crate::scheduler::TaskHandle;
use crate::services::{CopyOptions, DetectRequest, DetectResult, EntityType, Reply};

const BOUNDARY_TOLERANCE: f64 = 0.5;

const ALL_ENTITY_TYPES: [EntityType; 4] = [
    EntityType::PhoneNumber,
    EntityType::Url,
    EntityType::Email,
    EntityType::Address,
];

/// A detected entity, in document offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiSpan {
    pub start: usize,
    pub end: usize,
    pub entity_type: EntityType,
    pub content: String,
}

#[derive(Clone, Debug)]
pub(crate) struct AiState {
    pub(crate) enabled: bool,
    types: Vec<EntityType>,
    pub(crate) spans: BTreeMap<usize, AiSpan>,
    menu_options: BTreeMap<EntityType, Vec<String>>,
    task: Option<TaskHandle>,
    /// Document text the outstanding windows were cut from
    text: String,
    initialized: bool,
    types_changed: bool,
}

impl AiState {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            types: ALL_ENTITY_TYPES.to_vec(),
            spans: BTreeMap::new(),
            menu_options: BTreeMap::new(),
            task: None,
            text: String::new(),
            initialized: false,
            types_changed: false,
        }
    }
}

impl RichEditor {
    pub fn text_detect_enable(&self) -> bool {
        self.ai.enabled
    }

    pub fn set_text_detect_enable(&mut self, enabled: bool) {
        if self.ai.enabled == enabled {
            return;
        }
        self.ai.enabled = enabled;
        if enabled {
            self.start_ai_task();
        } else {
            self.cancel_ai_task();
            self.ai.spans.clear();
        }
        self.mark_dirty(DirtyFlag::Measure);
    }

    /// Comma separated entity labels, e.g. `"phoneNum,url"`.
    pub fn set_text_detect_types(&mut self, types: &str) {
        let mut parsed = Vec::new();
        for label in types.split(',').filter(|label| !label.trim().is_empty()) {
            match EntityType::from_label(label) {
                Some(entity_type) if !parsed.contains(&entity_type) => parsed.push(entity_type),
                Some(_) => {}
                None => warn!("unknown entity type {label:?}"),
            }
        }
        parsed.sort();
        if parsed == self.ai.types {
            return;
        }
        self.ai.types = parsed;
        self.ai.types_changed = true;
        self.mark_dirty(DirtyFlag::Measure);
        self.start_ai_task();
    }

    pub fn text_detect_types(&self) -> &[EntityType] {
        &self.ai.types
    }

    /// Detected entities in document order.
    pub fn ai_spans(&self) -> impl Iterator<Item = &AiSpan> {
        self.ai.spans.values()
    }

    pub fn ai_menu_options(&self, entity_type: EntityType) -> Option<&[String]> {
        self.ai.menu_options.get(&entity_type).map(Vec::as_slice)
    }

    /// Schedules a detection pass over the whole document. Only runs for an
    /// unfocused editor whose content may be copied.
    pub fn start_ai_task(&mut self) {
        if self.focused || self.config.copy_options == CopyOptions::None || !self.ai.enabled {
            return;
        }
        self.ai.spans.clear();
        self.cancel_ai_task();
        info!("entity detection scheduled");
        let handle = self.tasks.post_delayed(EditorTask::AiDetect, self.config.ai_delay);
        self.ai.task = Some(handle);
    }

    pub fn cancel_ai_task(&mut self) {
        if let Some(handle) = self.ai.task.take() {
            self.tasks.cancel(handle);
        }
    }

    /// Cuts the document into overlapping windows and sends each one to the
    /// detector.
    pub(crate) fn run_ai_detection(&mut self) {
        self.ai.task = None;
        self.ai.text = self.store.content_text();
        let chars: Vec<char> = self.ai.text.chars().collect();
        if chars.is_empty() {
            return;
        }
        let max_length = self.config.ai_text_max_length.max(1);
        let step = max_length.saturating_sub(self.config.ai_text_gap).max(1);
        let mut start = 0;
        while start < chars.len() {
            let end = (start + max_length).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            self.init_text_detect(start, window);
            start += step;
        }
    }

    fn init_text_detect(&mut self, start_pos: usize, text: String) {
        if self.config.copy_options == CopyOptions::None || !self.ai.enabled {
            return;
        }
        let request = DetectRequest {
            start_pos,
            text,
            types: self.ai.types.clone(),
        };
        let Some(detector) = self.detector.as_mut() else {
            return;
        };
        debug!("detecting entities from {start_pos}");
        if let Reply::Ready(result) = detector.detect(&request) {
            self.tasks.post(EditorTask::DetectResult { start_pos, result });
        }
    }

    /// Accepts the entities of one window that still match the text they
    /// were detected in. The last window also drops overlapping spans,
    /// keeping the earlier one.
    pub(crate) fn parse_ai_result(&mut self, start_pos: usize, result: DetectResult) {
        if self.ai.text != self.store.content_text() {
            debug!("dropping entity result for outdated text");
            return;
        }
        let text: Vec<char> = self.ai.text.chars().collect();
        let max_length = self.config.ai_text_max_length;
        let mut accepted = Vec::new();
        for entity in result.entities {
            let length = char_len(&entity.text);
            let Ok(offset) = usize::try_from(entity.char_offset) else {
                warn!("entity with negative offset {}", entity.char_offset);
                continue;
            };
            let start = start_pos + offset;
            let end = start + length;
            if start >= text.len() || end >= start_pos + max_length || length == 0 {
                warn!("entity {:?} outside its window", entity.text);
                continue;
            }
            let matches = text
                .get(start..end)
                .is_some_and(|slice| slice.iter().copied().eq(entity.text.chars()));
            if !matches {
                warn!("entity {:?} does not match the text at {start}", entity.text);
                continue;
            }
            let span = AiSpan {
                start,
                end,
                entity_type: entity.entity_type,
                content: entity.text,
            };
            self.ai.spans.insert(start, span.clone());
            accepted.push(span);
        }

        if self.ai.menu_options.is_empty() {
            for (entity_type, options) in result.menu_options {
                if !options.is_empty() {
                    self.ai.menu_options.insert(entity_type, options);
                }
            }
        }

        if start_pos + max_length >= text.len() {
            self.ai.initialized = true;
            self.ai.types_changed = false;
            let mut previous_end = 0;
            self.ai.spans.retain(|_, span| {
                if span.start < previous_end {
                    return false;
                }
                previous_end = span.end;
                true
            });
        }
        if let Some(listener) = self.listener.as_mut() {
            listener.on_ai_result(&accepted);
        }
        self.mark_dirty(DirtyFlag::Measure);
    }

    pub(crate) fn on_content_changed_for_ai(&mut self) {
        if !self.ai.enabled {
            return;
        }
        self.ai.initialized = false;
        self.ai.spans.clear();
        self.start_ai_task();
    }

    pub fn is_ai_detect_initialized(&self) -> bool {
        self.ai.initialized
    }

    fn need_show_ai_detect(&self) -> bool {
        self.ai.enabled
            && !self.ai.spans.is_empty()
            && self.config.copy_options != CopyOptions::None
            && !self.focused
    }

    /// Reports a click on a detected entity. `point` is host-local.
    pub(crate) fn handle_click_ai_span(&mut self, point: Point) -> bool {
        if !self.need_show_ai_detect() {
            return false;
        }
        let origin = self.text_rect().origin();
        let local = Point::new(point.x - origin.x, point.y - origin.y);
        let clicked = self.ai.spans.values().find(|span| {
            self.paragraphs
                .range_rects(&self.store, span.start, span.end)
                .iter()
                .any(|rect| rect.contains(local))
        });
        let Some(span) = clicked.cloned() else {
            return false;
        };
        info!("entity clicked: {:?} [{}, {})", span.entity_type, span.start, span.end);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_ai_span_click(&span);
        }
        true
    }

    /// Text around `position` that entity lookups see, and the document
    /// offset it starts at. The context restarts after any non-text span
    /// ending at or before `position`.
    pub fn get_position_spans_text(&self, position: usize) -> (String, Option<usize>) {
        let len = self.store.text_len();
        let start = position.saturating_sub(self.config.ai_text_range_left).min(len);
        let end = (position + self.config.ai_text_range_right).min(len);
        let info = self.get_spans_info(start as isize, end as isize, GetSpansMethod::OnSelect);

        let mut text = String::new();
        let mut span_start = None;
        for object in info.result_objects {
            match object.kind {
                SpanResultKind::Text => {
                    let (from, to) = object.offset_in_span;
                    if span_start.is_none() {
                        span_start = Some(object.span_range.0 + from);
                    }
                    text.extend(object.value.chars().skip(from).take(to - from));
                }
                SpanResultKind::Image | SpanResultKind::Symbol => {
                    if object.span_range.1 <= position {
                        text.clear();
                        span_start = None;
                    } else {
                        break;
                    }
                }
            }
        }
        (text, span_start)
    }

    /// Single-click snap: moves `position` to the nearest entity boundary.
    /// Clicks at either end of the document, or on the edge of the text
    /// rect, are left alone.
    pub fn adjust_cursor_position(&mut self, position: usize) -> usize {
        if !self.ai.enabled || self.detector.is_none() {
            return position;
        }
        let len = self.store.text_len();
        if self.is_click_boundary(position) {
            return position;
        }
        let (content, span_start) = self.get_position_spans_text(position);
        let Some(span_start) = span_start.filter(|start| *start <= position) else {
            return position;
        };
        if content.is_empty() {
            return position;
        }
        let adjusted = self
            .detector
            .as_mut()
            .and_then(|detector| detector.adjust_cursor_position(position - span_start, &content));
        match adjusted {
            Some(relative) => {
                debug!("cursor snapped to entity boundary {}", relative + span_start);
                (relative + span_start).min(len)
            }
            None => position,
        }
    }

    fn is_click_boundary(&self, position: usize) -> bool {
        let len = self.store.text_len();
        if position == 0 || position >= len {
            return true;
        }
        let caret = self.caret_metrics(position).offset;
        let text = self.text_rect();
        caret.x <= BOUNDARY_TOLERANCE
            || caret.x >= text.width() - BOUNDARY_TOLERANCE
            || caret.y < 0.0
            || caret.y > text.height()
    }

    /// Widens `[start, end)` to the entity covering `start`, if any.
    pub fn adjust_word_selection(&mut self, start: usize, end: usize) -> Option<(usize, usize)> {
        if !self.ai.enabled {
            return None;
        }
        let (content, span_start) = self.get_position_spans_text(start);
        let span_start = span_start.filter(|span_start| *span_start <= start)?;
        if content.is_empty() {
            return None;
        }
        let (entity_start, entity_end) = self
            .detector
            .as_mut()?
            .adjust_word_selection(start - span_start, &content)?;
        let len = self.store.text_len();
        let adjusted = (
            (entity_start + span_start).min(len),
            (entity_end + span_start).min(len),
        );
        debug!("word selection [{start}, {end}) widened to {adjusted:?}");
        Some(adjusted)
    }
}
