use kurbo::{Point, Rect};
use log::debug;

use super::content::{
    document_cells, grapheme_len_at, grapheme_len_before, left_word_position,
    paragraph_begin_position, paragraph_end_position, right_word_position,
};
use super::RichEditor;
use crate::host::DirtyFlag;
use crate::paragraph::{Affinity, CaretMetrics};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaretMoveIntent {
    Left,
    Right,
    Up,
    Down,
    LeftWord,
    RightWord,
    ParagraphBegin,
    ParagraphEnd,
    Home,
    End,
}

impl CaretMoveIntent {
    pub fn from_name(name: &str) -> Option<Self> {
        let intent = match name {
            "left" => CaretMoveIntent::Left,
            "right" => CaretMoveIntent::Right,
            "up" => CaretMoveIntent::Up,
            "down" => CaretMoveIntent::Down,
            "left-word" => CaretMoveIntent::LeftWord,
            "right-word" => CaretMoveIntent::RightWord,
            "paragraph-begin" => CaretMoveIntent::ParagraphBegin,
            "paragraph-end" => CaretMoveIntent::ParagraphEnd,
            "home" => CaretMoveIntent::Home,
            "end" => CaretMoveIntent::End,
            _ => return None,
        };
        Some(intent)
    }
}

impl RichEditor {
    /// Moves the caret to `position` if it lies inside the document.
    ///
    /// Out-of-range requests leave the caret where it was and return `false`.
    pub fn set_caret_position(&mut self, position: isize) -> bool {
        let len = self.store.text_len();
        let clamped = position.clamp(0, len as isize) as usize;
        if clamped as isize == position {
            self.caret_position = clamped;
            return true;
        }
        self.caret_position = self.caret_position.min(len);
        false
    }

    /// Caret placement requested by the embedder: also restarts the blink
    /// and drops the selection.
    pub fn set_caret_offset(&mut self, position: isize) -> bool {
        let success = self.set_caret_position(position);
        if self.focused {
            self.start_twinkling();
        }
        self.reset_selection();
        self.mark_dirty(DirtyFlag::Render);
        success
    }

    /// Keyboard caret movement. Any selection is dropped first.
    pub fn cursor_move(&mut self, intent: CaretMoveIntent) -> bool {
        self.reset_selection();
        let target = self.caret_move_target(intent, self.caret_position);
        if target == self.caret_position {
            return false;
        }
        debug!("cursor {intent:?}: {} -> {target}", self.caret_position);
        self.caret_position = target;
        self.move_caret_to_content_rect();
        self.start_twinkling();
        self.mark_dirty(DirtyFlag::Render);
        self.update_caret_info_to_controller();
        true
    }

    pub(crate) fn caret_move_target(&self, intent: CaretMoveIntent, from: usize) -> usize {
        let len = self.store.text_len();
        let from = from.min(len);
        match intent {
            CaretMoveIntent::Left => {
                let content = self.store.content_text();
                from.saturating_sub(grapheme_len_before(&content, from).max(1))
            }
            CaretMoveIntent::Right => {
                let content = self.store.content_text();
                (from + grapheme_len_at(&content, from).max(1)).min(len)
            }
            CaretMoveIntent::Up => self.vertical_target(from, true),
            CaretMoveIntent::Down => self.vertical_target(from, false),
            CaretMoveIntent::LeftWord => {
                left_word_position(&document_cells(self.store.spans()), from)
            }
            CaretMoveIntent::RightWord => {
                right_word_position(&document_cells(self.store.spans()), from)
            }
            CaretMoveIntent::ParagraphBegin => {
                paragraph_begin_position(&document_cells(self.store.spans()), from)
            }
            CaretMoveIntent::ParagraphEnd => {
                paragraph_end_position(&document_cells(self.store.spans()), from)
            }
            CaretMoveIntent::Home => 0,
            CaretMoveIntent::End => len,
        }
    }

    /// Hit-tests half the smallest font size above the caret line, or below
    /// it when moving down.
    fn vertical_target(&self, from: usize, up: bool) -> usize {
        let len = self.store.text_len();
        if len <= 1 {
            return from;
        }
        let metrics = self.caret_metrics(from);
        let min_det = self.min_font_size() / 2.0;
        let y = if up {
            metrics.offset.y - min_det
        } else {
            metrics.offset.y + metrics.height + min_det / 2.0
        };
        let point = Point::new(metrics.offset.x, y);
        self.paragraphs.index_at(&self.store, point).min(len)
    }

    fn min_font_size(&self) -> f64 {
        self.store
            .spans()
            .iter()
            .filter_map(|span| span.text_style().map(|style| style.font_size))
            .fold(None, |min: Option<f64>, size| Some(min.map_or(size, |min| min.min(size))))
            .unwrap_or(self.config.default_text_size)
    }

    /// Caret geometry relative to the text rect.
    ///
    /// Falls back to synthesized geometry when there is nothing shaped to
    /// measure: the text origin for an empty document, or the box of the
    /// placeholder at `position` when the document holds only placeholders.
    pub fn caret_metrics(&self, position: usize) -> CaretMetrics {
        self.caret_metrics_with_affinity(position, Affinity::Downstream)
    }

    pub fn caret_metrics_with_affinity(&self, position: usize, affinity: Affinity) -> CaretMetrics {
        let position = position.min(self.store.text_len());
        if self.store.is_empty() || self.store.text_len() == 0 {
            return CaretMetrics {
                offset: Point::ZERO,
                height: self.config.default_caret_height,
            };
        }
        if self.store.all_placeholders()
            && let Some(metrics) = self.placeholder_caret_metrics(position)
        {
            return metrics;
        }
        match self.paragraphs.caret_metrics(&self.store, position, affinity) {
            Some(metrics) if metrics.height > 0.0 => metrics,
            _ => CaretMetrics {
                offset: Point::ZERO,
                height: self.config.default_caret_height,
            },
        }
    }

    fn placeholder_caret_metrics(&self, position: usize) -> Option<CaretMetrics> {
        let count = self.store.span_count();
        let tail = position >= count;
        let index = if tail { count.checked_sub(1)? } else { position };
        let span = self.store.get(index)?;
        let origin = self.text_rect().origin().to_vec2();
        let rect = self
            .host_node()
            .and_then(|host| host.child_frame(span.id()))
            .map(|frame| frame - origin)
            .or_else(|| self.paragraphs.placeholder_rects(&self.store).get(index).copied())?;
        let x = if tail { rect.x1 } else { rect.x0 };
        Some(CaretMetrics {
            offset: Point::new(x, rect.y0),
            height: rect.height(),
        })
    }

    /// Caret geometry in host-local coordinates, clamped horizontally into
    /// the frame.
    pub fn caret_offset(&self, position: usize) -> CaretMetrics {
        let metrics = self.caret_metrics(position);
        let text_origin = self.text_rect().origin();
        let max_x = (self.frame_rect.width() - self.config.caret_width).max(0.0);
        let x = (metrics.offset.x + text_origin.x).clamp(0.0, max_x);
        CaretMetrics {
            offset: Point::new(x, metrics.offset.y + text_origin.y),
            height: metrics.height,
        }
    }

    pub fn caret_rect(&self) -> Rect {
        let metrics = self.caret_offset(self.caret_position);
        Rect::from_origin_size(
            metrics.offset,
            (self.config.caret_width, metrics.height),
        )
    }

    /// Scrolls so the caret line is fully inside the content rect.
    pub fn move_caret_to_content_rect(&mut self) {
        let content = self.content_rect;
        if self.text_rect().height() <= content.height() {
            return;
        }
        let caret = self.caret_offset(self.caret_position);
        if caret.offset.y < content.y0 {
            self.on_scroll_callback(content.y0 - caret.offset.y);
        } else if caret.offset.y + caret.height > content.y1 {
            self.on_scroll_callback(content.y1 - caret.offset.y - caret.height);
        }
    }
}
