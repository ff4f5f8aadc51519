use std::collections::VecDeque;

use log::debug;

use super::RichEditor;

/// One undoable edit.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OperationRecord {
    pub before_caret_position: usize,
    pub after_caret_position: usize,
    pub add_text: Option<String>,
    pub delete_text: Option<String>,
}

/// Bounded undo and redo history. When full, the oldest entry is evicted.
#[derive(Clone, Debug)]
pub struct UndoRedoStack {
    undo: VecDeque<OperationRecord>,
    redo: VecDeque<OperationRecord>,
    max_length: usize,
}

impl UndoRedoStack {
    pub fn new(max_length: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_length: max_length.max(1),
        }
    }

    /// Records a fresh edit; any redo history is dropped.
    pub fn push(&mut self, record: OperationRecord) {
        self.redo.clear();
        self.push_undo(record);
    }

    fn push_undo(&mut self, record: OperationRecord) {
        if self.undo.len() >= self.max_length {
            self.undo.pop_front();
        }
        self.undo.push_back(record);
    }

    fn push_redo(&mut self, record: OperationRecord) {
        if self.redo.len() >= self.max_length {
            self.redo.pop_front();
        }
        self.redo.push_back(record);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn last(&self) -> Option<&OperationRecord> {
        self.undo.back()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }
}

impl RichEditor {
    /// Reverts the most recent edit. Returns `false` when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.history.undo.pop_back() else {
            return false;
        };
        debug!("undo {record:?}");
        self.history.push_redo(record.clone());
        self.reset_selection();

        let added_len = record.add_text.as_deref().map_or(0, |text| text.chars().count());
        self.set_caret_position(record.after_caret_position as isize);
        if added_len > 0 {
            self.delete_backward_operation(added_len);
        }
        if let Some(deleted) = record.delete_text.as_deref() {
            if record.add_text.is_none() {
                self.set_caret_position(record.after_caret_position as isize);
            }
            self.insert_value_operation(deleted);
        }
        self.set_caret_position(record.before_caret_position as isize);
        true
    }

    /// Re-applies the most recently undone edit.
    pub fn redo(&mut self) -> bool {
        let Some(record) = self.history.redo.pop_back() else {
            return false;
        };
        debug!("redo {record:?}");
        self.reset_selection();

        match (record.add_text.as_deref(), record.delete_text.as_deref()) {
            (Some(added), Some(deleted)) => {
                self.set_caret_position(record.before_caret_position as isize);
                self.delete_forward_operation(deleted.chars().count());
                self.insert_value_operation(added);
            }
            (None, Some(deleted)) => {
                self.set_caret_position(record.before_caret_position as isize);
                let len = deleted.chars().count();
                if record.before_caret_position != record.after_caret_position {
                    self.delete_backward_operation(len);
                } else {
                    self.delete_forward_operation(len);
                }
            }
            (Some(added), None) => {
                self.set_caret_position(record.before_caret_position as isize);
                self.insert_value_operation(added);
            }
            (None, None) => {}
        }
        self.history.push_undo(record);
        true
    }
}
