use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use kurbo::{Point, Rect};

use crate::editor::SpanId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirtyFlag {
    /// Content or metrics changed; the host must re-measure.
    Measure,
    /// Only painting state changed (caret, selection, scroll).
    Render,
}

/// The scene-graph node that hosts an editor.
///
/// The editor mirrors placeholder and image spans as children of this node and
/// never paints on its own.
pub trait HostNode {
    fn children(&self) -> Vec<SpanId>;

    fn insert_child(&self, child: SpanId, index: usize);

    fn remove_child(&self, child: SpanId);

    fn mark_dirty(&self, flag: DirtyFlag);

    /// Offset of the painted content in global coordinates.
    fn paint_rect_offset(&self) -> Point;

    /// Frame of the node relative to its parent.
    fn frame_rect(&self) -> Rect;

    /// Global offset of the root viewport that overlays are positioned in.
    fn root_offset(&self) -> Point {
        Point::ZERO
    }

    /// Positions a placeholder child, in host-local coordinates.
    fn place_child(&self, _child: SpanId, _frame: Rect) {}

    fn child_frame(&self, _child: SpanId) -> Option<Rect> {
        None
    }
}

/// Weak reference to the host node; may be invalidated by teardown.
#[derive(Clone, Default)]
pub struct HostHandle {
    node: Option<Weak<dyn HostNode>>,
}

impl HostHandle {
    pub fn new<N: HostNode + 'static>(node: &Rc<N>) -> Self {
        let weak: Weak<N> = Rc::downgrade(node);
        let weak: Weak<dyn HostNode> = weak;
        Self { node: Some(weak) }
    }

    pub fn detached() -> Self {
        Self::default()
    }

    pub fn resolve(&self) -> Option<Rc<dyn HostNode>> {
        self.node.as_ref()?.upgrade()
    }
}

#[derive(Default)]
struct HeadlessState {
    children: Vec<SpanId>,
    child_frames: HashMap<SpanId, Rect>,
    dirty: Vec<DirtyFlag>,
}

/// In-memory host used by the script driver, the terminal front end and tests.
pub struct HeadlessHost {
    frame: Rect,
    paint_offset: Point,
    state: RefCell<HeadlessState>,
}

impl HeadlessHost {
    pub fn new(frame: Rect) -> Rc<Self> {
        Rc::new(Self {
            frame,
            paint_offset: frame.origin(),
            state: RefCell::new(HeadlessState::default()),
        })
    }

    pub fn dirty_count(&self, flag: DirtyFlag) -> usize {
        self.state
            .borrow()
            .dirty
            .iter()
            .filter(|recorded| **recorded == flag)
            .count()
    }

    pub fn clear_dirty(&self) {
        self.state.borrow_mut().dirty.clear();
    }
}

impl HostNode for HeadlessHost {
    fn children(&self) -> Vec<SpanId> {
        self.state.borrow().children.clone()
    }

    fn insert_child(&self, child: SpanId, index: usize) {
        let mut state = self.state.borrow_mut();
        let index = index.min(state.children.len());
        state.children.insert(index, child);
    }

    fn remove_child(&self, child: SpanId) {
        let mut state = self.state.borrow_mut();
        state.children.retain(|existing| *existing != child);
        state.child_frames.remove(&child);
    }

    fn mark_dirty(&self, flag: DirtyFlag) {
        self.state.borrow_mut().dirty.push(flag);
    }

    fn paint_rect_offset(&self) -> Point {
        self.paint_offset
    }

    fn frame_rect(&self) -> Rect {
        self.frame
    }

    fn place_child(&self, child: SpanId, frame: Rect) {
        self.state.borrow_mut().child_frames.insert(child, frame);
    }

    fn child_frame(&self, child: SpanId) -> Option<Rect> {
        self.state.borrow().child_frames.get(&child).copied()
    }
}
