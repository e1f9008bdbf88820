//! Linear undo history for a [`TextBuffer`](crate::TextBuffer).
//!
//! Every recorded edit is an insertion or a deletion carrying its text, so undoing is just
//! applying the inverse operation. A new edit after some undos drops the redo tail.

use crate::buffer::TextEdit;

/// Undo stack with a cursor into it.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    edits: Vec<TextEdit>,
    pos: usize,
}

impl UndoStack {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly applied edit, discarding anything that could have been redone.
    pub fn record(&mut self, edit: TextEdit) {
        self.edits.truncate(self.pos);
        self.edits.push(edit);
        self.pos = self.edits.len();
    }

    /// Step back and return the edit to revert, if any.
    pub fn step_back(&mut self) -> Option<TextEdit> {
        if self.pos == 0 {
            return None;
        }
        self.pos -= 1;
        self.edits.get(self.pos).cloned()
    }

    /// Step forward and return the edit to re-apply, if any.
    pub fn step_forward(&mut self) -> Option<TextEdit> {
        let edit = self.edits.get(self.pos).cloned()?;
        self.pos += 1;
        Some(edit)
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.pos > 0
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.pos < self.edits.len()
    }

    /// Number of edits that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.pos
    }

    /// Number of edits that can be redone.
    pub fn redo_depth(&self) -> usize {
        self.edits.len() - self.pos
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.edits.clear();
        self.pos = 0;
    }
}
