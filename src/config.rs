use std::time::Duration;

use crate::services::CopyOptions;

/// Font size used for text spans created without a typing style.
pub const DEFAULT_TEXT_SIZE: f64 = 16.0;

/// Tunables of one editor instance.
#[derive(Clone, Debug)]
pub struct EditorConfig {
    /// Maximum depth of both the undo and the redo history
    pub record_max_length: usize,

    /// Period of the caret blink toggle
    pub twinkling_interval: Duration,

    /// Delay between two auto-scroll steps
    pub auto_scroll_interval: Duration,

    /// Height of the hot band at the content edges for mouse and handle
    /// auto-scroll
    pub auto_scroll_edge_distance: f64,

    /// Height of the hot band at the frame edges while dragging
    pub auto_scroll_drag_edge_distance: f64,

    /// Drag auto-scroll speed at full penetration, in units per second
    pub max_drag_scroll_speed: f64,

    pub caret_width: f64,

    /// Caret height used when there is no laid-out text to measure
    pub default_caret_height: f64,

    /// Width of the selection handle line
    pub handle_line_width: f64,

    pub default_text_size: f64,

    /// Context characters gathered left of a click for entity lookups
    pub ai_text_range_left: usize,

    /// Context characters gathered right of a click for entity lookups
    pub ai_text_range_right: usize,

    /// Length of one detection window
    pub ai_text_max_length: usize,

    /// Overlap between consecutive detection windows
    pub ai_text_gap: usize,

    /// Quiet period before detection starts after the editor loses focus
    pub ai_delay: Duration,

    pub text_detect_enable: bool,

    pub copy_options: CopyOptions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            record_max_length: 20,
            twinkling_interval: Duration::from_millis(500),
            auto_scroll_interval: Duration::from_millis(15),
            auto_scroll_edge_distance: 15.0,
            auto_scroll_drag_edge_distance: 58.0,
            max_drag_scroll_speed: 2400.0,
            caret_width: 1.5,
            default_caret_height: 18.5,
            handle_line_width: 2.0,
            default_text_size: DEFAULT_TEXT_SIZE,
            ai_text_range_left: 50,
            ai_text_range_right: 50,
            ai_text_max_length: 300,
            ai_text_gap: 100,
            ai_delay: Duration::from_millis(300),
            text_detect_enable: false,
            copy_options: CopyOptions::Local,
        }
    }
}

impl EditorConfig {
    pub fn with_text_detect(mut self, enabled: bool) -> Self {
        self.text_detect_enable = enabled;
        self
    }

    pub fn with_copy_options(mut self, copy_options: CopyOptions) -> Self {
        self.copy_options = copy_options;
        self
    }
}
