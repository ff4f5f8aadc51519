use std::time::Duration;

use kurbo::{CubicBez, ParamCurve, Point, Rect, Vec2};
use log::{debug, info, warn};

use super::content::char_len;
use super::selection::{GetSpansMethod, SelectionInfo};
use super::{EditorTask, OperationRecord, RichEditor, SpanResultKind};
use crate::host::DirtyFlag;
use crate::scheduler::TaskHandle;
use crate::services::{
    ClipboardRecord, ClipboardRequest, ClipboardRequestKind, ClipboardResponse, CopyOptions,
    PasteData, Reply, TextConfig,
};

const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(300);
const EPSILON: f64 = 0.001;

fn near_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Ease curve of the drag scroll speed.
fn sharp(ratio: f64) -> f64 {
    let curve = CubicBez::new((0.0, 0.0), (0.33, 0.0), (0.67, 1.0), (1.0, 1.0));
    let ratio = ratio.clamp(0.0, 1.0);
    let (mut low, mut high) = (0.0, 1.0);
    for _ in 0..32 {
        let mid = (low + high) / 2.0;
        if curve.eval(mid).x < ratio {
            low = mid;
        } else {
            high = mid;
        }
    }
    curve.eval((low + high) / 2.0).y
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AutoScrollEvent {
    Handle,
    Drag,
    #[default]
    Mouse,
}

/// What triggered an auto-scroll and where, plus the step to apply.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct AutoScrollParam {
    pub event: AutoScrollEvent,
    pub offset: f64,
    pub handle_rect: Rect,
    pub is_first_handle: bool,
    /// Pointer position of mouse events, host-local.
    pub event_offset: Point,
}

impl AutoScrollParam {
    pub fn handle(handle_rect: Rect, is_first_handle: bool) -> Self {
        Self {
            event: AutoScrollEvent::Handle,
            handle_rect,
            is_first_handle,
            ..Self::default()
        }
    }

    pub fn mouse(event_offset: Point) -> Self {
        Self {
            event: AutoScrollEvent::Mouse,
            event_offset,
            ..Self::default()
        }
    }

    pub fn drag() -> Self {
        Self {
            event: AutoScrollEvent::Drag,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeDetectionStrategy {
    InBoundary,
    OutBoundary,
    Disable,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AutoScrollState {
    running: bool,
    task: Option<TaskHandle>,
    current: Option<AutoScrollParam>,
    prev_y: Option<f64>,
}

/// Content dragged out of the editor, and the selection to restore once the
/// drag is over.
#[derive(Clone, Debug)]
pub(crate) struct DragSource {
    recover: (usize, usize),
    data: PasteData,
}

fn clipboard_records(info: &SelectionInfo) -> Vec<ClipboardRecord> {
    info.result_objects
        .iter()
        .map(|object| match object.kind {
            SpanResultKind::Text => {
                let (from, to) = object.offset_in_span;
                ClipboardRecord::Text(object.value.chars().skip(from).take(to - from).collect())
            }
            SpanResultKind::Symbol => ClipboardRecord::Text(object.value.clone()),
            SpanResultKind::Image => ClipboardRecord::Image {
                src: object.value.clone(),
            },
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Move,
    Release,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct MouseState {
    pub(crate) pressed: bool,
    left_pressed: bool,
    block_press: bool,
    first_select: bool,
    selecting: bool,
    pub(crate) long_press: bool,
    last_click: Option<Duration>,
}

impl Default for MouseState {
    fn default() -> Self {
        Self {
            pressed: false,
            left_pressed: false,
            block_press: false,
            first_select: true,
            selecting: false,
            long_press: false,
            last_click: None,
        }
    }
}

/// Handed to `on_paste`; setting `prevent_default` cancels the paste.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PasteEvent {
    prevent_default: bool,
}

impl PasteEvent {
    pub fn prevent_default(&mut self) {
        self.prevent_default = true;
    }

    pub fn is_prevent_default(&self) -> bool {
        self.prevent_default
    }
}

/// What to do with the answer of an outstanding clipboard request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClipboardContinuation {
    Paste,
    HasData,
}

impl RichEditor {
    pub fn start_twinkling(&mut self) {
        self.cancel_twinkling();
        self.caret.visible = true;
        self.mark_dirty(DirtyFlag::Render);
        self.schedule_caret_twinkling();
    }

    pub fn stop_twinkling(&mut self) {
        self.cancel_twinkling();
        if self.caret.visible {
            self.caret.visible = false;
            self.mark_dirty(DirtyFlag::Render);
        }
    }

    fn cancel_twinkling(&mut self) {
        if let Some(handle) = self.caret.twinkling.take() {
            self.tasks.cancel(handle);
        }
    }

    fn schedule_caret_twinkling(&mut self) {
        if self.caret.always_displayed {
            return;
        }
        let handle = self
            .tasks
            .post_delayed(EditorTask::CaretTwinkle, self.config.twinkling_interval);
        self.caret.twinkling = Some(handle);
    }

    pub(crate) fn on_caret_twinkling(&mut self) {
        self.caret.twinkling = None;
        self.caret.visible = !self.caret.visible;
        self.mark_dirty(DirtyFlag::Render);
        self.schedule_caret_twinkling();
    }

    pub fn is_cursor_always_displayed(&self) -> bool {
        self.caret.always_displayed
    }

    /// Gives the editor focus. Returns `true` once focused.
    pub fn request_focus(&mut self) -> bool {
        if !self.focused {
            self.handle_focus();
        }
        true
    }

    pub fn lose_focus(&mut self) {
        if self.focused {
            self.handle_blur();
        }
    }

    pub fn handle_focus(&mut self) {
        info!("editor focused");
        self.focused = true;
        if self.ai.enabled && !self.ai.spans.is_empty() {
            self.mark_dirty(DirtyFlag::Measure);
        }
        self.cancel_ai_task();
        self.start_twinkling();
        if !self.mouse.long_press {
            self.request_keyboard(true);
        }
    }

    pub fn handle_blur(&mut self) {
        info!("editor blurred");
        self.focused = false;
        self.mouse.long_press = false;
        if self.ai.enabled {
            self.start_ai_task();
        }
        self.stop_twinkling();
        self.close_keyboard(true);
        self.close_select_overlay();
        if self.selector.is_valid() {
            self.reset_selection();
        }
    }

    fn text_config(&self) -> TextConfig {
        let global = self.global_offset().to_vec2();
        let caret = self.caret_position;
        TextConfig {
            cursor: self.caret_rect() + global,
            caret_position: caret,
            selection: self.selection().unwrap_or((caret, caret)),
            window_rect: self.frame_rect + global,
        }
    }

    /// Attaches the input method. Returns `false` without a service or when
    /// the service refuses.
    pub fn request_keyboard(&mut self, show_keyboard: bool) -> bool {
        let config = self.text_config();
        let Some(input_method) = self.input_method.as_mut() else {
            return false;
        };
        if !input_method.attach(show_keyboard, &config) {
            warn!("input method refused to attach");
            return false;
        }
        info!("keyboard attached");
        self.keyboard_attached = true;
        true
    }

    /// Drops the selection and, when forced, detaches the input method.
    pub fn close_keyboard(&mut self, force_close: bool) -> bool {
        self.reset_selection();
        if !force_close || !self.keyboard_attached {
            return false;
        }
        if let Some(input_method) = self.input_method.as_mut() {
            input_method.close();
        }
        info!("keyboard closed");
        self.keyboard_attached = false;
        true
    }

    /// Pushes the caret rect, the document text and the selection to the
    /// input method. Does nothing while unfocused.
    pub fn update_caret_info_to_controller(&mut self) {
        if !self.focused {
            return;
        }
        let len = self.store.text_len();
        let text: String = self
            .get_spans_info(0, len as isize, GetSpansMethod::OnSelect)
            .result_objects
            .into_iter()
            .filter(|object| object.kind == SpanResultKind::Text)
            .map(|object| object.value)
            .collect();
        let config = self.text_config();
        let (start, end) = config.selection;
        if let Some(input_method) = self.input_method.as_mut() {
            input_method.on_cursor_update(config.cursor);
            input_method.on_selection_change(&text, start, end);
        }
        debug!("caret info sent: {:?} [{start}, {end})", config.cursor);
    }

    /// Click with the time of the previous one deciding between single and
    /// double click.
    pub fn handle_click(&mut self, point: Point) {
        let now = self.tasks.now();
        if let Some(last) = self.mouse.last_click.take()
            && now.saturating_sub(last) < DOUBLE_CLICK_INTERVAL
        {
            self.handle_double_click(point);
            return;
        }
        self.handle_single_click(point);
    }

    pub fn handle_double_click(&mut self, point: Point) {
        debug!("double click at {point:?}");
        self.handle_long_press(point);
    }

    /// Caret placement by tap or click, `point` in host coordinates.
    pub fn handle_single_click(&mut self, point: Point) {
        self.mouse.last_click = Some(self.tasks.now());
        self.mouse.long_press = false;
        if self.handle_click_ai_span(point) {
            return;
        }
        self.close_select_overlay();
        if self.selector.is_valid() && !self.mouse.selecting {
            self.reset_selection();
        }
        let origin = self.text_rect().origin();
        let local = Point::new(point.x - origin.x, point.y - origin.y);
        let position = self.paragraphs.index_at(&self.store, local);
        let position = self.adjust_cursor_position(position);
        if self.request_focus() {
            self.caret_position = position.min(self.store.text_len());
            self.move_caret_to_content_rect();
            self.start_twinkling();
            self.request_keyboard(true);
        }
        self.update_caret_info_to_controller();
    }

    pub fn handle_mouse_left_button(&mut self, action: MouseAction, point: Point) {
        let origin = self.text_rect().origin();
        let local = Point::new(point.x - origin.x, point.y - origin.y);
        match action {
            MouseAction::Move => {
                if self.mouse.block_press || !self.mouse.left_pressed {
                    return;
                }
                let extend = self.paragraphs.index_at(&self.store, local);
                let base = self.selector.base_offset().unwrap_or(extend);
                self.selector.update(base, extend);
                if self.mouse.first_select {
                    self.mouse.first_select = false;
                } else {
                    self.caret_position = base.max(extend);
                    self.auto_scroll_by_edge_detection(
                        AutoScrollParam::mouse(point),
                        point,
                        EdgeDetectionStrategy::OutBoundary,
                    );
                }
                self.mouse.selecting = true;
                self.mark_dirty(DirtyFlag::Render);
            }
            MouseAction::Press => {
                self.mouse.pressed = true;
                let global = point + self.global_offset().to_vec2();
                if self.between_selected_position(global) {
                    self.mouse.block_press = true;
                    return;
                }
                let extend = self.paragraphs.index_at(&self.store, local);
                self.selector.update_extend(extend);
                self.mouse.left_pressed = true;
                self.mouse.block_press = false;
                let position = self.adjust_cursor_position(extend);
                if self.request_focus() {
                    self.caret_position = position.min(self.store.text_len());
                    self.move_caret_to_content_rect();
                    self.start_twinkling();
                    self.request_keyboard(true);
                }
            }
            MouseAction::Release => {
                self.mouse.block_press = false;
                self.mouse.left_pressed = false;
                self.mouse.selecting = false;
                self.mouse.pressed = false;
                self.mouse.first_select = true;
                if self.selector.is_valid() {
                    let (start, end) = (self.selector.text_start(), self.selector.text_end());
                    self.fire_on_select(start, end);
                }
                self.stop_auto_scroll();
            }
        }
    }

    /// A drag carrying content moves over the editor; the caret follows it
    /// and stays lit.
    pub fn handle_drag_moved(&mut self, point: Point) {
        if !self.caret.always_displayed {
            info!("drag entered the editor");
            self.request_focus();
            self.caret.always_displayed = true;
            self.start_twinkling();
        }
        let origin = self.text_rect().origin();
        let local = Point::new(point.x - origin.x, point.y - origin.y);
        self.caret_position = self
            .paragraphs
            .index_at(&self.store, local)
            .min(self.store.text_len());
        self.auto_scroll_by_edge_detection(
            AutoScrollParam::drag(),
            point,
            EdgeDetectionStrategy::InBoundary,
        );
        self.mark_dirty(DirtyFlag::Render);
    }

    pub fn handle_drag_leaved(&mut self) {
        info!("drag left the editor");
        self.lose_focus();
        self.caret.always_displayed = false;
        self.stop_twinkling();
        self.stop_auto_scroll();
    }

    pub fn handle_drag_ended(&mut self) {
        self.stop_auto_scroll();
        if !self.caret.always_displayed {
            info!("drag released outside the editor");
            self.lose_focus();
            self.stop_twinkling();
            return;
        }
        info!("drag released inside the editor");
        self.request_focus();
        self.caret.always_displayed = false;
        self.start_twinkling();
    }

    /// Packages the selection as drag data. The selection is dropped for the
    /// duration of the drag and restored by [`RichEditor::handle_drag_end`].
    pub fn handle_drag_start(&mut self) -> Option<PasteData> {
        if self.config.copy_options == CopyOptions::None || !self.selector.is_selected() {
            return None;
        }
        let (start, end) = (self.selector.text_start(), self.selector.text_end());
        let info = self.get_spans_info(start as isize, end as isize, GetSpansMethod::OnSelect);
        if info.is_empty() {
            return None;
        }
        let data = PasteData {
            records: clipboard_records(&info),
        };
        self.drag_source = Some(DragSource {
            recover: (start, end),
            data: data.clone(),
        });
        self.close_keyboard(true);
        self.close_select_overlay();
        self.reset_selection();
        self.mark_dirty(DirtyFlag::Measure);
        info!("drag started with [{start}, {end})");
        Some(data)
    }

    /// The drag this editor started is over, dropped here or elsewhere.
    pub fn handle_drag_end(&mut self) {
        self.stop_auto_scroll();
        self.history.clear_redo();
        let Some(source) = self.drag_source.take() else {
            return;
        };
        let (start, end) = source.recover;
        info!("drag source finished, restoring [{start}, {end})");
        self.handle_selection_change(start, end);
        self.close_select_overlay();
        self.mark_dirty(DirtyFlag::Render);
    }

    /// Data of the drag started here, while it is in flight.
    pub fn drag_data(&self) -> Option<&PasteData> {
        self.drag_source.as_ref().map(|source| &source.data)
    }

    fn is_reach_top(&self) -> bool {
        near_equal(self.text_rect().y0, self.content_rect.y0)
    }

    fn is_reach_bottom(&self) -> bool {
        near_equal(self.text_rect().y1, self.content_rect.y1)
    }

    fn is_reached_boundary(&self, offset: f64) -> bool {
        (self.is_reach_top() && offset > EPSILON) || (self.is_reach_bottom() && offset < -EPSILON)
    }

    /// Scroll request from the embedder or from caret tracking. Returns
    /// `false` when the text already sits against the boundary in that
    /// direction.
    pub fn on_scroll_callback(&mut self, offset: f64) -> bool {
        if self.is_reached_boundary(offset) {
            return false;
        }
        let moved = self.move_text_rect(offset);
        let shift = Vec2::new(0.0, moved);
        self.selector.first_handle = self.selector.first_handle + shift;
        self.selector.second_handle = self.selector.second_handle + shift;
        true
    }

    /// Shifts the text rect by `offset`, clamped so that overflowing text
    /// always covers the content rect and short text sticks to its top.
    /// Returns the applied shift.
    pub fn move_text_rect(&mut self, offset: f64) -> f64 {
        let text = self.text_rect();
        let content = self.content_rect;
        let offset = if text.height() > content.height() + EPSILON {
            if text.y0 + offset > content.y0 {
                content.y0 - text.y0
            } else if text.y1 + offset < content.y1 {
                content.y1 - text.y1
            } else {
                offset
            }
        } else if !near_equal(text.y0, content.y0) {
            content.y0 - text.y0
        } else {
            return 0.0;
        };
        self.text_offset_y += offset;
        self.update_children_offset();
        self.mark_dirty(DirtyFlag::Render);
        offset
    }

    pub fn text_offset_y(&self) -> f64 {
        self.text_offset_y
    }

    /// Starts, retargets or stops auto-scroll for a pointer or handle at
    /// `point` (host coordinates).
    pub fn auto_scroll_by_edge_detection(
        &mut self,
        mut param: AutoScrollParam,
        point: Point,
        strategy: EdgeDetectionStrategy,
    ) {
        if strategy == EdgeDetectionStrategy::Disable {
            return;
        }
        if self
            .auto_scroll
            .prev_y
            .is_some_and(|prev| near_equal(prev, point.y))
        {
            return;
        }
        self.auto_scroll.prev_y = Some(point.y);

        let content = self.content_rect;
        let dragging = param.event == AutoScrollEvent::Drag;
        let threshold = if dragging {
            self.config.auto_scroll_drag_edge_distance
        } else {
            self.config.auto_scroll_edge_distance
        };
        let max_height = if dragging {
            self.frame_rect.height()
        } else {
            content.height()
        };
        if threshold * 2.0 > max_height {
            info!("auto scroll hot area taller than {max_height}");
            return;
        }
        let top = if dragging { threshold } else { content.y0 + threshold };
        let bottom = if dragging {
            self.frame_rect.height() - threshold
        } else {
            content.y1 - threshold
        };

        if param.event == AutoScrollEvent::Handle {
            let handle_bottom = point.y + param.handle_rect.height();
            if handle_bottom > bottom {
                param.offset = bottom - handle_bottom;
                self.schedule_auto_scroll(param, true);
            } else if point.y < top {
                param.offset = top - point.y;
                self.schedule_auto_scroll(param, true);
            } else {
                self.stop_auto_scroll();
            }
            return;
        }

        if point.y > bottom {
            param.offset = if dragging {
                -self.calc_drag_speed(bottom, self.frame_rect.height(), point.y)
            } else {
                bottom - point.y
            };
            self.schedule_auto_scroll(param, true);
        } else if point.y < top {
            param.offset = if dragging {
                self.calc_drag_speed(top, 0.0, point.y)
            } else {
                top - point.y
            };
            self.schedule_auto_scroll(param, true);
        } else {
            self.stop_auto_scroll();
        }
    }

    /// Scroll step for a pointer `point` deep into the hot area
    /// `[hot_start, hot_end]`.
    pub fn calc_drag_speed(&self, hot_start: f64, hot_end: f64, point: f64) -> f64 {
        if near_equal(hot_start, hot_end) {
            return 0.0;
        }
        let ratio = (point - hot_start) / (hot_end - hot_start);
        let interval_ms = self.config.auto_scroll_interval.as_secs_f64() * 1000.0;
        self.config.max_drag_scroll_speed * sharp(ratio) / 1000.0 * interval_ms
    }

    fn schedule_auto_scroll(&mut self, param: AutoScrollParam, first_run: bool) {
        if param.offset > 0.0 && self.is_reach_top() {
            return;
        }
        if param.offset < 0.0 && self.is_reach_bottom() {
            return;
        }
        if first_run {
            self.auto_scroll.current = Some(param);
            if self.auto_scroll.running {
                return;
            }
        }
        if let Some(handle) = self.auto_scroll.task.take() {
            self.tasks.cancel(handle);
        }
        let handle = self
            .tasks
            .post_delayed(EditorTask::AutoScroll, self.config.auto_scroll_interval);
        self.auto_scroll.task = Some(handle);
        self.auto_scroll.running = true;
    }

    pub(crate) fn on_auto_scroll_task(&mut self) {
        self.auto_scroll.task = None;
        let Some(param) = self.auto_scroll.current else {
            self.auto_scroll.running = false;
            return;
        };
        self.on_auto_scroll(param);
        if self.is_reach_top() || self.is_reach_bottom() {
            self.stop_auto_scroll();
        }
    }

    fn on_auto_scroll(&mut self, param: AutoScrollParam) {
        let moved = self.move_text_rect(param.offset);
        match param.event {
            AutoScrollEvent::Handle => {
                let shift = Vec2::new(0.0, moved);
                if param.is_first_handle {
                    self.selector.second_handle = self.selector.second_handle + shift;
                } else {
                    self.selector.first_handle = self.selector.first_handle + shift;
                }
                self.update_selection_by_handle(param.handle_rect, param.is_first_handle);
            }
            AutoScrollEvent::Drag => {}
            AutoScrollEvent::Mouse => {
                let origin = self.text_rect().origin();
                let local = Point::new(
                    param.event_offset.x - origin.x,
                    param.event_offset.y - origin.y,
                );
                let extend = self.paragraphs.index_at(&self.store, local);
                let base = self.selector.base_offset().unwrap_or(extend);
                self.selector.update(base, extend);
                self.caret_position = base.max(extend).min(self.store.text_len());
            }
        }
        if near_equal(moved, 0.0) {
            self.auto_scroll.running = false;
            return;
        }
        self.schedule_auto_scroll(param, false);
    }

    pub fn stop_auto_scroll(&mut self) {
        self.auto_scroll.running = false;
        self.auto_scroll.prev_y = None;
        if let Some(handle) = self.auto_scroll.task.take() {
            self.tasks.cancel(handle);
        }
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll.running
    }

    /// Copies the selection to the clipboard.
    pub fn handle_on_copy(&mut self) -> bool {
        if self.config.copy_options == CopyOptions::None || self.clipboard.is_none() {
            return false;
        }
        let (start, end) = (self.selector.text_start(), self.selector.text_end());
        let info = self.get_spans_info(start as isize, end as isize, GetSpansMethod::OnSelect);
        if info.is_empty() {
            return false;
        }
        let records = clipboard_records(&info);
        let copy_options = self.config.copy_options;
        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard.set_data(PasteData { records }, copy_options);
        }
        debug!("copied [{start}, {end})");
        self.close_select_overlay();
        if !self.ai.enabled {
            self.start_twinkling();
        }
        true
    }

    pub fn handle_on_cut(&mut self) -> bool {
        if self.config.copy_options == CopyOptions::None || !self.selector.is_selected() {
            return false;
        }
        self.handle_on_copy();
        self.delete_backward(1)
    }

    /// Asks the clipboard for its text; the insertion happens when the
    /// answer is delivered.
    pub fn handle_on_paste(&mut self) -> bool {
        let mut event = PasteEvent::default();
        if let Some(listener) = self.listener.as_mut() {
            listener.on_paste(&mut event);
        }
        if event.is_prevent_default() {
            debug!("paste prevented by listener");
            return false;
        }
        self.send_clipboard_request(ClipboardRequestKind::GetData, ClipboardContinuation::Paste)
    }

    /// Refreshes [`RichEditor::clipboard_has_data`].
    pub fn check_clipboard_has_data(&mut self) -> bool {
        self.send_clipboard_request(ClipboardRequestKind::HasData, ClipboardContinuation::HasData)
    }

    pub fn clipboard_has_data(&self) -> Option<bool> {
        self.clipboard_has_data
    }

    fn send_clipboard_request(
        &mut self,
        kind: ClipboardRequestKind,
        continuation: ClipboardContinuation,
    ) -> bool {
        let id = self.next_request_id;
        let request = ClipboardRequest { id, kind };
        let Some(clipboard) = self.clipboard.as_mut() else {
            return false;
        };
        let reply = match kind {
            ClipboardRequestKind::GetData => clipboard.get_data(request),
            ClipboardRequestKind::HasData => clipboard.has_data(request),
        };
        self.next_request_id += 1;
        self.pending_clipboard.insert(id, continuation);
        if let Reply::Ready(response) = reply {
            self.tasks.post(EditorTask::ClipboardResponse { id, response });
        }
        true
    }

    pub(crate) fn on_clipboard_response(&mut self, id: u64, response: ClipboardResponse) {
        let Some(continuation) = self.pending_clipboard.remove(&id) else {
            warn!("no clipboard request {id} outstanding");
            return;
        };
        match (continuation, response) {
            (ClipboardContinuation::Paste, ClipboardResponse::Data(text)) => {
                if !text.is_empty() {
                    self.reset_after_paste(&text);
                }
            }
            (ClipboardContinuation::HasData, ClipboardResponse::HasData(has_data)) => {
                self.clipboard_has_data = Some(has_data);
                if self.is_select_overlay_on() {
                    self.update_select_menu_info();
                }
            }
            (continuation, response) => {
                warn!("clipboard answered {response:?} to a {continuation:?} request");
            }
        }
    }

    /// Inserts pasted text against the document as it is now: the selection
    /// is replaced and the caret re-clamped first.
    fn reset_after_paste(&mut self, text: &str) {
        self.caret_position = self.caret_position.min(self.store.text_len());
        let mut record = OperationRecord {
            before_caret_position: self.caret_position,
            add_text: Some(text.to_string()),
            ..OperationRecord::default()
        };
        self.start_twinkling();
        if let Some((start, end)) = self.selection() {
            self.caret_position = start;
            record.before_caret_position = start;
            let deleted = self.delete_forward_operation(end - start);
            record.delete_text = (!deleted.is_empty()).then_some(deleted);
            self.reset_selection();
        }
        let insert_offset = self.caret_position;
        self.insert_at_caret(text);
        self.caret_position = insert_offset + char_len(text);
        self.after_content_change();
        record.after_caret_position = insert_offset + char_len(text);
        debug!("pasted {} chars at {insert_offset}", char_len(text));
        self.history.push(record);
    }
}
