use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::time::Duration;

use kurbo::Point;
use ratatui::layout::Rect;

use crate::config::EditorConfig;
use crate::editor::RichEditor;
use crate::host::{HeadlessHost, HostHandle};
use crate::paragraph::{MonospaceMetrics, MonospaceParagraph};
use crate::render::{CursorVisualPosition, RenderResult, render_editor};
use crate::theme::Theme;

/// Engine constants rescaled to terminal cells.
pub fn terminal_config() -> EditorConfig {
    EditorConfig {
        auto_scroll_interval: Duration::from_millis(50),
        auto_scroll_edge_distance: 1.0,
        auto_scroll_drag_edge_distance: 2.0,
        max_drag_scroll_speed: 40.0,
        caret_width: 1.0,
        default_caret_height: 1.0,
        handle_line_width: 1.0,
        ..EditorConfig::default()
    }
}

/// EditorDisplay wraps a RichEditor and manages all terminal concerns: the
/// host node, the viewport geometry handed to the engine, and rendering.
pub struct EditorDisplay {
    editor: RichEditor,
    host: Rc<HeadlessHost>,
    theme: Theme,
    last_cursor_visual: Option<CursorVisualPosition>,
    last_view_height: usize,
    last_total_lines: usize,
    last_text_area: Rect,
    wrap_width: usize,
    left_padding: usize,
}

impl EditorDisplay {
    /// Builds an editor shaped in cell units and attached to a headless host.
    pub fn new(config: EditorConfig) -> Self {
        let paragraph = MonospaceParagraph::new(MonospaceMetrics::Cells);
        let editor = RichEditor::with_paragraph(config, Box::new(paragraph));
        Self::with_editor(editor)
    }

    pub fn with_editor(mut editor: RichEditor) -> Self {
        let host = HeadlessHost::new(kurbo::Rect::ZERO);
        editor.set_host(HostHandle::new(&host));
        Self {
            editor,
            host,
            theme: Theme::default(),
            last_cursor_visual: None,
            last_view_height: 1,
            last_total_lines: 0,
            last_text_area: Rect::default(),
            wrap_width: 0,
            left_padding: 0,
        }
    }

    pub fn host(&self) -> &HeadlessHost {
        &self.host
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn last_cursor_visual(&self) -> Option<CursorVisualPosition> {
        self.last_cursor_visual
    }

    pub fn last_view_height(&self) -> usize {
        self.last_view_height
    }

    pub fn last_total_lines(&self) -> usize {
        self.last_total_lines
    }

    pub fn last_text_area(&self) -> Rect {
        self.last_text_area
    }

    /// Hands the terminal text area to the engine as frame and content rect.
    /// Only a changed geometry triggers a relayout.
    pub fn sync_viewport(&mut self, text_area: Rect, wrap_width: usize, left_padding: usize) {
        self.last_view_height = (text_area.height as usize).max(1);
        if self.last_text_area == text_area
            && self.wrap_width == wrap_width
            && self.left_padding == left_padding
        {
            return;
        }
        self.last_text_area = text_area;
        self.wrap_width = wrap_width;
        self.left_padding = left_padding;
        let height = f64::from(text_area.height);
        let frame = kurbo::Rect::new(0.0, 0.0, f64::from(text_area.width), height);
        let left = left_padding as f64;
        let content = kurbo::Rect::new(left, 0.0, left + wrap_width as f64, height);
        self.editor.set_layout(frame, content);
    }

    /// Render the document and update internal state
    pub fn render(&mut self) -> RenderResult {
        let result = render_editor(&self.editor, &self.theme, self.left_padding);
        self.last_cursor_visual = result.cursor;
        self.last_total_lines = result.total_lines;
        result
    }

    /// First laid-out line shown at the top of the viewport.
    pub fn scroll_top(&self) -> usize {
        (-self.editor.text_offset_y()).round().max(0.0) as usize
    }

    /// Scrolls the text by whole lines; positive values move further down the
    /// document.
    pub fn scroll_by_lines(&mut self, delta: isize) -> bool {
        if delta == 0 {
            return false;
        }
        self.editor.on_scroll_callback(-(delta as f64))
    }

    pub fn page_jump_distance(&self) -> isize {
        self.last_view_height.saturating_sub(1).max(1) as isize
    }

    /// Convert mouse coordinates to a host-local point, aimed at the middle
    /// of the cell row.
    pub fn point_from_mouse(&self, column: u16, row: u16) -> Option<Point> {
        let area = self.last_text_area;
        if area.width == 0 || area.height == 0 {
            return None;
        }
        let max_x = area.x.saturating_add(area.width);
        let max_y = area.y.saturating_add(area.height);
        if column < area.x || column >= max_x || row < area.y || row >= max_y {
            return None;
        }
        Some(self.point_unclamped(column, row))
    }

    /// Like [`EditorDisplay::point_from_mouse`], but keeps points outside the
    /// text area so drags past an edge can trigger auto-scroll.
    pub fn point_unclamped(&self, column: u16, row: u16) -> Point {
        let area = self.last_text_area;
        Point::new(
            f64::from(column) - f64::from(area.x),
            f64::from(row) - f64::from(area.y) + 0.5,
        )
    }

    /// Text of text and symbol spans, as written back to disk.
    pub fn plain_text(&self) -> String {
        self.editor.get_selected_text(0, self.editor.text_len())
    }
}

impl Deref for EditorDisplay {
    type Target = RichEditor;

    fn deref(&self) -> &Self::Target {
        &self.editor
    }
}

impl DerefMut for EditorDisplay {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.editor
    }
}
