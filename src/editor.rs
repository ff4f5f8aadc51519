use std::collections::HashMap;
use std::time::Duration;

use kurbo::{Point, Rect};
use log::{debug, warn};

use crate::config::EditorConfig;
use crate::host::{DirtyFlag, HostHandle, HostNode};
use crate::paragraph::{MonospaceMetrics, MonospaceParagraph, Paragraph, ParagraphIndex};
use crate::scheduler::{TaskHandle, TaskQueue};
use crate::services::{
    Clipboard, ClipboardResponse, DataDetector, DetectResult, InputMethod,
};

mod ai;
mod content;
mod cursor;
mod edit;
mod history;
mod input;
mod inspect;
mod overlay;
mod selection;
mod span;
mod store;
mod styles;

pub use ai::AiSpan;
pub use content::char_to_byte_idx;
pub use cursor::CaretMoveIntent;
pub use edit::{
    DeleteDirection, DeleteValue, ImageSpanOptions, InsertValueInfo, RangeOptions, SpanResult,
    SpanResultKind, SymbolSpanOptions, TextSpanOptions,
};
pub use history::{OperationRecord, UndoRedoStack};
pub use input::{
    AutoScrollEvent, AutoScrollParam, EdgeDetectionStrategy, MouseAction, PasteEvent,
};
pub use inspect::SpanDump;
pub use overlay::{SelectMenuInfo, SelectOverlayInfo};
pub use selection::{
    GetSpansMethod, ResultObject, SelectionInfo, SelectionType, TextSelector,
};
pub use span::{
    Color, FontStyle, FontWeight, ImageAttributes, ImageFit, LeadingMargin, ParagraphStyle,
    PlaceholderRef, Shadow, Span, SpanContent, SpanId, TextAlign, TextDecoration, TextStyle,
    VerticalAlign,
};
pub use store::{SpanPositionInfo, SpanStore};
pub use styles::{ParagraphInfo, UpdateParagraphStyle, UpdateSpanStyle};

use ai::AiState;
use input::{AutoScrollState, ClipboardContinuation, DragSource, MouseState};
use overlay::OverlayState;

/// Observer of committed edits and selection changes.
///
/// Every method has a no-op default; the two `about_to_*` hooks can veto the
/// pending mutation by returning `false`.
pub trait EditorListener {
    fn on_select(&mut self, _info: &SelectionInfo) {}

    fn on_selection_change(&mut self, _start: usize, _end: usize) {}

    fn about_to_ime_input(&mut self, _info: &InsertValueInfo) -> bool {
        true
    }

    fn on_ime_input_complete(&mut self, _result: &SpanResult) {}

    fn about_to_delete(&mut self, _value: &DeleteValue) -> bool {
        true
    }

    fn on_delete_complete(&mut self) {}

    fn on_paste(&mut self, _event: &mut PasteEvent) {}

    fn on_ai_result(&mut self, _spans: &[AiSpan]) {}

    fn on_ai_span_click(&mut self, _span: &AiSpan) {}
}

#[derive(Clone, Debug, PartialEq)]
enum EditorTask {
    CaretTwinkle,
    AutoScroll,
    AiDetect,
    ClipboardResponse {
        id: u64,
        response: ClipboardResponse,
    },
    DetectResult {
        start_pos: usize,
        result: DetectResult,
    },
}

#[derive(Clone, Copy, Debug, Default)]
struct CaretState {
    visible: bool,
    twinkling: Option<TaskHandle>,
    always_displayed: bool,
}

/// Editable rich-text document: spans, caret, selection and history, plus the
/// glue to layout, host node and platform services.
pub struct RichEditor {
    config: EditorConfig,
    store: SpanStore,
    caret_position: usize,
    selector: TextSelector,
    history: UndoRedoStack,
    typing_style: Option<TextStyle>,
    paragraphs: ParagraphIndex,
    host: HostHandle,
    listener: Option<Box<dyn EditorListener>>,
    input_method: Option<Box<dyn InputMethod>>,
    clipboard: Option<Box<dyn Clipboard>>,
    detector: Option<Box<dyn DataDetector>>,
    tasks: TaskQueue<EditorTask>,
    caret: CaretState,
    focused: bool,
    keyboard_attached: bool,
    selected_type: Option<SelectionType>,
    frame_rect: Rect,
    content_rect: Rect,
    text_offset_y: f64,
    auto_scroll: AutoScrollState,
    ai: AiState,
    pending_clipboard: HashMap<u64, ClipboardContinuation>,
    next_request_id: u64,
    clipboard_has_data: Option<bool>,
    mouse: MouseState,
    overlay: OverlayState,
    drag_source: Option<DragSource>,
}

impl Default for RichEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl RichEditor {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let paragraph = MonospaceParagraph::new(MonospaceMetrics::default());
        Self::with_paragraph(config, Box::new(paragraph))
    }

    pub fn with_paragraph(config: EditorConfig, paragraph: Box<dyn Paragraph>) -> Self {
        let history = UndoRedoStack::new(config.record_max_length);
        let paragraphs = ParagraphIndex::new(paragraph, config.default_text_size);
        let ai = AiState::new(config.text_detect_enable);
        Self {
            config,
            store: SpanStore::new(),
            caret_position: 0,
            selector: TextSelector::default(),
            history,
            typing_style: None,
            paragraphs,
            host: HostHandle::detached(),
            listener: None,
            input_method: None,
            clipboard: None,
            detector: None,
            tasks: TaskQueue::new(),
            caret: CaretState::default(),
            focused: false,
            keyboard_attached: false,
            selected_type: None,
            frame_rect: Rect::ZERO,
            content_rect: Rect::ZERO,
            text_offset_y: 0.0,
            auto_scroll: AutoScrollState::default(),
            ai,
            pending_clipboard: HashMap::new(),
            next_request_id: 0,
            clipboard_has_data: None,
            mouse: MouseState::default(),
            overlay: OverlayState::default(),
            drag_source: None,
        }
    }

    pub fn set_host(&mut self, host: HostHandle) {
        self.host = host;
        self.sync_host_children();
        self.update_children_offset();
    }

    pub fn set_listener(&mut self, listener: Box<dyn EditorListener>) {
        self.listener = Some(listener);
    }

    pub fn set_input_method(&mut self, input_method: Box<dyn InputMethod>) {
        self.input_method = Some(input_method);
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = Some(clipboard);
    }

    pub fn set_data_detector(&mut self, detector: Box<dyn DataDetector>) {
        self.detector = Some(detector);
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &SpanStore {
        &self.store
    }

    pub fn spans(&self) -> &[Span] {
        self.store.spans()
    }

    pub fn content_text(&self) -> String {
        self.store.content_text()
    }

    pub fn text_len(&self) -> usize {
        self.store.text_len()
    }

    pub fn caret_position(&self) -> usize {
        self.caret_position
    }

    pub fn text_selector(&self) -> &TextSelector {
        &self.selector
    }

    /// Ordered `(start, end)` of the active, non-empty selection.
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selector
            .is_selected()
            .then(|| (self.selector.text_start(), self.selector.text_end()))
    }

    pub fn selected_type(&self) -> Option<SelectionType> {
        self.selected_type
    }

    pub fn history(&self) -> &UndoRedoStack {
        &self.history
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_keyboard_attached(&self) -> bool {
        self.keyboard_attached
    }

    pub fn is_caret_visible(&self) -> bool {
        self.caret.visible
    }

    pub fn is_caret_twinkling(&self) -> bool {
        self.caret.twinkling.is_some()
    }

    pub fn now(&self) -> Duration {
        self.tasks.now()
    }

    pub fn pending_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Records the host geometry: the node frame and the content rect inside
    /// it, both in host-local coordinates.
    pub fn set_layout(&mut self, frame_rect: Rect, content_rect: Rect) {
        self.frame_rect = frame_rect;
        self.content_rect = content_rect;
        self.paragraphs.set_max_width(content_rect.width());
        self.move_text_rect(0.0);
        self.update_children_offset();
    }

    pub fn frame_rect(&self) -> Rect {
        self.frame_rect
    }

    pub fn content_rect(&self) -> Rect {
        self.content_rect
    }

    /// The laid-out text, positioned inside the content rect and shifted by
    /// the current scroll offset.
    pub fn text_rect(&self) -> Rect {
        let height = self.paragraphs.height(&self.store);
        let top = self.content_rect.y0 + self.text_offset_y;
        Rect::new(
            self.content_rect.x0,
            top,
            self.content_rect.x1,
            top + height,
        )
    }

    /// Number of laid-out lines, wrapped lines included.
    pub fn line_count(&self) -> usize {
        self.paragraphs.line_count(&self.store)
    }

    /// Runs every task that becomes due within `elapsed`.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.tasks.now() + elapsed;
        while let Some(task) = self.tasks.pop_due(until) {
            self.run_task(task);
        }
        self.tasks.advance_clock_to(until);
    }

    fn run_task(&mut self, task: EditorTask) {
        match task {
            EditorTask::CaretTwinkle => self.on_caret_twinkling(),
            EditorTask::AutoScroll => self.on_auto_scroll_task(),
            EditorTask::AiDetect => self.run_ai_detection(),
            EditorTask::ClipboardResponse { id, response } => {
                self.on_clipboard_response(id, response)
            }
            EditorTask::DetectResult { start_pos, result } => {
                self.parse_ai_result(start_pos, result)
            }
        }
    }

    /// Queues a clipboard answer for a request issued earlier with `Pending`.
    pub fn deliver_clipboard_response(&mut self, id: u64, response: ClipboardResponse) {
        if !self.pending_clipboard.contains_key(&id) {
            warn!("dropping clipboard response for unknown request {id}");
            return;
        }
        self.tasks
            .post(EditorTask::ClipboardResponse { id, response });
    }

    /// Queues a detection result for the window starting at `start_pos`.
    pub fn deliver_detect_result(&mut self, start_pos: usize, result: DetectResult) {
        self.tasks
            .post(EditorTask::DetectResult { start_pos, result });
    }

    fn host_node(&self) -> Option<std::rc::Rc<dyn HostNode>> {
        self.host.resolve()
    }

    fn mark_dirty(&self, flag: DirtyFlag) {
        if let Some(host) = self.host_node() {
            host.mark_dirty(flag);
        }
    }

    /// Bookkeeping after any change of span content.
    fn after_content_change(&mut self) {
        self.caret_position = self.caret_position.min(self.store.text_len());
        self.sync_host_children();
        self.update_children_offset();
        self.mark_dirty(DirtyFlag::Measure);
        self.close_select_overlay();
        self.on_content_changed_for_ai();
    }

    /// Mirrors placeholder spans as host children, in document order.
    fn sync_host_children(&self) {
        let Some(host) = self.host_node() else {
            return;
        };
        let desired: Vec<SpanId> = self
            .store
            .spans()
            .iter()
            .filter(|span| span.is_placeholder())
            .map(Span::id)
            .collect();
        let mut current = host.children();
        if current == desired {
            return;
        }
        for child in current.iter().filter(|child| !desired.contains(child)) {
            host.remove_child(*child);
        }
        current.retain(|child| desired.contains(child));
        for (index, id) in desired.iter().enumerate() {
            if current.get(index) == Some(id) {
                continue;
            }
            if let Some(existing) = current.iter().position(|child| child == id) {
                host.remove_child(*id);
                current.remove(existing);
            }
            host.insert_child(*id, index);
            current.insert(index, *id);
        }
        debug!("host children synced: {} placeholders", desired.len());
    }

    /// Moves placeholder children onto the boxes reserved for them by layout.
    fn update_children_offset(&self) {
        let Some(host) = self.host_node() else {
            return;
        };
        let ids: Vec<SpanId> = self
            .store
            .spans()
            .iter()
            .filter(|span| span.is_placeholder())
            .map(Span::id)
            .collect();
        if ids.is_empty() {
            return;
        }
        let origin = self.text_rect().origin().to_vec2();
        let rects = self.paragraphs.placeholder_rects(&self.store);
        for (id, rect) in ids.iter().zip(rects) {
            host.place_child(*id, rect + origin);
        }
    }

    fn global_offset(&self) -> Point {
        match self.host_node() {
            Some(host) => {
                let paint = host.paint_rect_offset();
                let root = host.root_offset();
                Point::new(paint.x - root.x, paint.y - root.y)
            }
            None => Point::ZERO,
        }
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;



#[cfg(test)]
#[path = "editor/style_tests.rs"]
mod style_tests;

#[cfg(test)]
#[path = "editor/edit_tests.rs"]
mod edit_tests;


#[cfg(test)]
#[path = "editor/selection_tests.rs"]
mod selection_tests;


#[cfg(test)]
#[path = "editor/ai_tests.rs"]
mod ai_tests;

#[cfg(test)]
#[path = "editor/overlay_tests.rs"]
mod overlay_tests;
