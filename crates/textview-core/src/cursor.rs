//! Cursor and selection model.
//!
//! [`CursorModel`] holds the cursor position, the desired column used for vertical motion,
//! the selection region and the select-mode flag. Motion that depends on soft wrapping goes
//! through the [`LineGeometry`] of the view's layout cache.
//!
//! The desired column is the rune index within the visual span the cursor last occupied
//! through horizontal motion or explicit placement, so moving up and down through short or
//! wrapped lines keeps the cursor near the column it started from.
//!
//! In select mode every motion extends the selection from the position before the motion.
//! The selection is kept ordered (`start <= end`) at all times.

use unicode_segmentation::UnicodeSegmentation;

use crate::buffer::{TextBuffer, TextEdit};
use crate::layout::LayoutEngine;
use crate::position::{TextPosition, TextRegion};
use crate::text::is_word_break;

/// Per-line wrap geometry needed for vertical cursor motion.
pub trait LineGeometry {
    /// Number of visual spans of line `ln` (at least 1).
    fn span_count(&self, ln: usize) -> usize;
    /// Span index and rune index within that span for column `col`.
    fn rune_span_pos(&self, ln: usize, col: usize) -> (usize, usize);
    /// Column for rune `ri` of span `si`, clamped to the span.
    fn span_pos_to_col(&self, ln: usize, si: usize, ri: usize) -> usize;
}

impl LineGeometry for LayoutEngine {
    fn span_count(&self, ln: usize) -> usize {
        LayoutEngine::span_count(self, ln)
    }

    fn rune_span_pos(&self, ln: usize, col: usize) -> (usize, usize) {
        LayoutEngine::rune_span_pos(self, ln, col)
    }

    fn span_pos_to_col(&self, ln: usize, si: usize, ri: usize) -> usize {
        LayoutEngine::span_pos_to_col(self, ln, si, ri)
    }
}

/// Geometry of an unwrapped view: every line is a single span.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwrapped;

impl LineGeometry for Unwrapped {
    fn span_count(&self, _ln: usize) -> usize {
        1
    }

    fn rune_span_pos(&self, _ln: usize, col: usize) -> (usize, usize) {
        (0, col)
    }

    fn span_pos_to_col(&self, _ln: usize, _si: usize, ri: usize) -> usize {
        ri
    }
}

/// Cursor position, desired column, selection and select mode of one view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorModel {
    pos: TextPosition,
    desired_col: usize,
    selection: TextRegion,
    select_mode: bool,
}

impl CursorModel {
    /// A cursor at the start of the document, nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position.
    pub fn pos(&self) -> TextPosition {
        self.pos
    }

    /// Desired column for vertical motion.
    pub fn desired_col(&self) -> usize {
        self.desired_col
    }

    /// Current selection (possibly empty).
    pub fn selection(&self) -> TextRegion {
        self.selection
    }

    /// Returns `true` in select mode.
    pub fn select_mode(&self) -> bool {
        self.select_mode
    }

    /// Returns `true` if a non-empty region is selected.
    pub fn has_selection(&self) -> bool {
        self.selection.is_active()
    }

    /// Clamp the cursor and selection to `buffer`.
    pub fn clamp(&mut self, buffer: &TextBuffer) {
        self.pos = buffer.clamp(self.pos);
        self.selection = TextRegion::new(
            buffer.clamp(self.selection.start),
            buffer.clamp(self.selection.end),
        );
    }

    /// Move the cursor to `pos` (clamped) without touching the desired column or selection.
    pub fn set_pos(&mut self, buffer: &TextBuffer, pos: TextPosition) {
        self.pos = buffer.clamp(pos);
    }

    /// Explicitly place the cursor at `pos` (clamped), resetting the desired column.
    pub fn place(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry, pos: TextPosition) {
        self.pos = buffer.clamp(pos);
        self.update_desired(geo);
    }

    fn update_desired(&mut self, geo: &impl LineGeometry) {
        self.desired_col = geo.rune_span_pos(self.pos.line, self.pos.column).1;
    }

    /// Extend the selection after a motion from `origin`, when in select mode.
    ///
    /// If `origin` was before the selection start the start follows the cursor; otherwise a
    /// cursor at or after the start moves the end, and a cursor before it moves the start.
    pub fn cursor_select(&mut self, origin: TextPosition) {
        if !self.select_mode {
            return;
        }
        let mut start = self.selection.start;
        let mut end = self.selection.end;
        if origin < start {
            start = self.pos;
        } else if self.pos >= start {
            end = self.pos;
        } else {
            start = self.pos;
        }
        self.selection = TextRegion::new(start, end);
    }

    /// Move forward `steps` characters, crossing line ends.
    pub fn move_forward(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry, steps: usize) {
        self.clamp(buffer);
        let origin = self.pos;
        let last = buffer.line_count() - 1;
        for _ in 0..steps {
            if self.pos.column < buffer.line_len(self.pos.line) {
                self.pos.column += 1;
            } else if self.pos.line < last {
                self.pos = TextPosition::new(self.pos.line + 1, 0);
            } else {
                break;
            }
        }
        self.update_desired(geo);
        self.cursor_select(origin);
    }

    /// Move backward `steps` characters, crossing line starts.
    pub fn move_backward(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry, steps: usize) {
        self.clamp(buffer);
        let origin = self.pos;
        for _ in 0..steps {
            if self.pos.column > 0 {
                self.pos.column -= 1;
            } else if self.pos.line > 0 {
                let line = self.pos.line - 1;
                self.pos = TextPosition::new(line, buffer.line_len(line));
            } else {
                break;
            }
        }
        self.update_desired(geo);
        self.cursor_select(origin);
    }

    /// Move down `steps` visual spans.
    pub fn move_down(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry, steps: usize) {
        self.clamp(buffer);
        let origin = self.pos;
        let last = buffer.line_count() - 1;
        let mut pos = self.pos;
        for _ in 0..steps {
            let (si, _) = geo.rune_span_pos(pos.line, pos.column);
            if si + 1 < geo.span_count(pos.line) {
                pos.column = geo.span_pos_to_col(pos.line, si + 1, self.desired_col);
                continue;
            }
            if pos.line >= last {
                break;
            }
            pos.line += 1;
            pos.column = geo
                .span_pos_to_col(pos.line, 0, self.desired_col)
                .min(buffer.line_len(pos.line));
        }
        self.pos = pos;
        self.cursor_select(origin);
    }

    /// Move up `steps` visual spans.
    pub fn move_up(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry, steps: usize) {
        self.clamp(buffer);
        let origin = self.pos;
        let mut pos = self.pos;
        for _ in 0..steps {
            let (si, _) = geo.rune_span_pos(pos.line, pos.column);
            if si > 0 {
                pos.column = geo.span_pos_to_col(pos.line, si - 1, self.desired_col);
                continue;
            }
            if pos.line == 0 {
                break;
            }
            pos.line -= 1;
            let last_span = geo.span_count(pos.line) - 1;
            pos.column = geo
                .span_pos_to_col(pos.line, last_span, self.desired_col)
                .min(buffer.line_len(pos.line));
        }
        self.pos = pos;
        self.cursor_select(origin);
    }

    /// Jump to line `ln` keeping the desired column (page motion).
    pub fn move_to_line_keep_col(&mut self, buffer: &TextBuffer, ln: usize) {
        self.clamp(buffer);
        let origin = self.pos;
        let ln = ln.min(buffer.line_count() - 1);
        self.pos = TextPosition::new(ln, buffer.line_len(ln).min(self.desired_col));
        self.cursor_select(origin);
    }

    /// Move to the start of the current line.
    pub fn move_to_line_start(&mut self, buffer: &TextBuffer) {
        self.clamp(buffer);
        let origin = self.pos;
        self.pos.column = 0;
        self.desired_col = 0;
        self.cursor_select(origin);
    }

    /// Move to the end of the current line.
    pub fn move_to_line_end(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry) {
        self.clamp(buffer);
        let origin = self.pos;
        self.pos.column = buffer.line_len(self.pos.line);
        self.update_desired(geo);
        self.cursor_select(origin);
    }

    /// Move to the start of the document.
    pub fn move_to_doc_start(&mut self, buffer: &TextBuffer) {
        self.clamp(buffer);
        let origin = self.pos;
        self.pos = TextPosition::ZERO;
        self.desired_col = 0;
        self.cursor_select(origin);
    }

    /// Move to the end of the document.
    pub fn move_to_doc_end(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry) {
        self.clamp(buffer);
        let origin = self.pos;
        self.pos = buffer.end_pos();
        self.update_desired(geo);
        self.cursor_select(origin);
    }

    /// Move to the end of the next word, crossing line ends.
    pub fn move_word_right(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry, steps: usize) {
        self.clamp(buffer);
        let origin = self.pos;
        let last = buffer.line_count() - 1;
        for _ in 0..steps {
            let len = buffer.line_len(self.pos.line);
            if self.pos.column >= len {
                if self.pos.line >= last {
                    break;
                }
                self.pos = TextPosition::new(self.pos.line + 1, 0);
                continue;
            }
            self.pos.column = next_word_end(&buffer.line(self.pos.line), self.pos.column);
        }
        self.update_desired(geo);
        self.cursor_select(origin);
    }

    /// Move to the start of the previous word, crossing line starts.
    pub fn move_word_left(&mut self, buffer: &TextBuffer, geo: &impl LineGeometry, steps: usize) {
        self.clamp(buffer);
        let origin = self.pos;
        for _ in 0..steps {
            if self.pos.column == 0 {
                if self.pos.line == 0 {
                    break;
                }
                let line = self.pos.line - 1;
                self.pos = TextPosition::new(line, buffer.line_len(line));
                continue;
            }
            self.pos.column = prev_word_start(&buffer.line(self.pos.line), self.pos.column);
        }
        self.update_desired(geo);
        self.cursor_select(origin);
    }

    /// Jump to the start of line `ln` (clamped).
    pub fn move_to_line(&mut self, buffer: &TextBuffer, ln: usize) {
        self.pos = buffer.clamp(TextPosition::new(ln, 0));
        self.desired_col = 0;
    }

    /// Toggle select mode; entering it anchors an empty selection at the cursor.
    pub fn select_mode_toggle(&mut self) {
        if self.select_mode {
            self.select_mode = false;
        } else {
            self.select_mode = true;
            self.selection = TextRegion::caret(self.pos);
        }
    }

    /// Enter select mode anchored at the cursor if `shift` is held and not already selecting.
    pub fn shift_select(&mut self, shift: bool) {
        if shift && !self.select_mode {
            self.select_mode = true;
            self.selection = TextRegion::caret(self.pos);
        }
    }

    /// Select the whole document.
    pub fn select_all(&mut self, buffer: &TextBuffer) {
        self.selection = TextRegion::new(TextPosition::ZERO, buffer.end_pos());
    }

    /// Select the word under the cursor, or the run of separators if the cursor is on one.
    pub fn select_word(&mut self, buffer: &TextBuffer) {
        self.clamp(buffer);
        let chars: Vec<char> = buffer.line(self.pos.line).chars().collect();
        if chars.is_empty() {
            return;
        }
        let at = self.pos.column.min(chars.len() - 1);
        let on_break = is_word_break(chars[at]);
        let mut start = at;
        while start > 0 && is_word_break(chars[start - 1]) == on_break {
            start -= 1;
        }
        let mut end = at + 1;
        while end < chars.len() && is_word_break(chars[end]) == on_break {
            end += 1;
        }
        let ln = self.pos.line;
        self.selection = TextRegion::new(TextPosition::new(ln, start), TextPosition::new(ln, end));
    }

    /// Leave select mode and clear the selection.
    pub fn select_reset(&mut self) {
        self.select_mode = false;
        self.selection = TextRegion::ZERO;
    }

    /// Replace the selection (the endpoints may be given in any order; they are clamped).
    pub fn set_selection(&mut self, buffer: &TextBuffer, region: TextRegion) {
        self.selection = TextRegion::new(buffer.clamp(region.start), buffer.clamp(region.end));
    }

    /// Place the cursor from a mouse press or drag.
    ///
    /// With `extend` (a select modifier held) or `dragging`, the selection grows from the old
    /// cursor; a plain press clears it.
    pub fn mouse_select(
        &mut self,
        buffer: &TextBuffer,
        geo: &impl LineGeometry,
        pos: TextPosition,
        extend: bool,
        dragging: bool,
    ) {
        let old = self.pos;
        let pos = buffer.clamp(pos);
        if pos == old {
            return;
        }
        self.place(buffer, geo, pos);
        if self.select_mode || extend {
            if !self.select_mode && extend {
                self.selection = TextRegion::caret(old);
                self.select_mode = true;
            }
            if !dragging && !extend {
                self.select_reset();
            } else if self.selection.start < self.pos {
                self.selection = TextRegion::new(self.selection.start, self.pos);
            } else {
                self.selection = TextRegion::new(self.pos, self.selection.end);
            }
        } else if self.has_selection() {
            self.select_reset();
        }
    }

    /// Keep the cursor and selection on the same text after an edit made elsewhere.
    pub fn adjust_for_edit(&mut self, edit: &TextEdit) {
        self.pos = self.pos.adjust_for_edit(edit);
        self.selection = TextRegion::new(
            self.selection.start.adjust_for_edit(edit),
            self.selection.end.adjust_for_edit(edit),
        );
    }
}

fn is_word_segment(seg: &str) -> bool {
    seg.chars().any(|c| c.is_alphanumeric() || c == '_')
}

/// Character columns of the word-bound segments of `line`.
fn word_segments(line: &str) -> Vec<(usize, usize, bool)> {
    let mut col = 0;
    line.split_word_bounds()
        .map(|seg| {
            let len = seg.chars().count();
            let item = (col, col + len, is_word_segment(seg));
            col += len;
            item
        })
        .collect()
}

fn next_word_end(line: &str, col: usize) -> usize {
    word_segments(line)
        .into_iter()
        .find(|(_, end, word)| *word && *end > col)
        .map(|(_, end, _)| end)
        .unwrap_or_else(|| line.chars().count())
}

fn prev_word_start(line: &str, col: usize) -> usize {
    word_segments(line)
        .into_iter()
        .rev()
        .find(|(start, _, word)| *word && *start < col)
        .map(|(start, _, _)| start)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> TextPosition {
        TextPosition::new(line, column)
    }

    #[test]
    fn test_forward_and_backward_cross_lines() {
        let buf = TextBuffer::from_text("ab\ncd");
        let mut c = CursorModel::new();
        c.place(&buf, &Unwrapped, pos(0, 2));
        c.move_forward(&buf, &Unwrapped, 1);
        assert_eq!(c.pos(), pos(1, 0));
        c.move_backward(&buf, &Unwrapped, 1);
        assert_eq!(c.pos(), pos(0, 2));
        c.move_forward(&buf, &Unwrapped, 10);
        assert_eq!(c.pos(), pos(1, 2));
    }

    #[test]
    fn test_moves_at_document_start_are_noops() {
        let buf = TextBuffer::from_text("abc\ndef");
        let mut c = CursorModel::new();
        c.move_backward(&buf, &Unwrapped, 1);
        assert_eq!(c.pos(), TextPosition::ZERO);
        c.move_up(&buf, &Unwrapped, 1);
        assert_eq!(c.pos(), TextPosition::ZERO);
    }

    #[test]
    fn test_desired_column_survives_short_lines() {
        let buf = TextBuffer::from_text("abcdef\nx\nabcdef");
        let mut c = CursorModel::new();
        c.place(&buf, &Unwrapped, pos(0, 4));
        c.move_down(&buf, &Unwrapped, 1);
        assert_eq!(c.pos(), pos(1, 1));
        c.move_down(&buf, &Unwrapped, 1);
        assert_eq!(c.pos(), pos(2, 4));
        c.move_up(&buf, &Unwrapped, 2);
        assert_eq!(c.pos(), pos(0, 4));
    }

    #[test]
    fn test_cursor_select_shrinks_from_start() {
        let buf = TextBuffer::from_text("0123456789");
        let mut c = CursorModel::new();
        c.place(&buf, &Unwrapped, pos(0, 5));
        c.shift_select(true);
        c.move_backward(&buf, &Unwrapped, 2);
        assert_eq!(c.selection(), TextRegion::new(pos(0, 3), pos(0, 5)));
        c.move_forward(&buf, &Unwrapped, 1);
        assert_eq!(c.selection(), TextRegion::new(pos(0, 3), pos(0, 4)));
    }

    #[test]
    fn test_select_word_and_separator_runs() {
        let buf = TextBuffer::from_text("let foo_bar = 1;");
        let mut c = CursorModel::new();
        c.set_pos(&buf, pos(0, 6));
        c.select_word(&buf);
        assert_eq!(c.selection(), TextRegion::new(pos(0, 4), pos(0, 11)));
        c.set_pos(&buf, pos(0, 12));
        c.select_word(&buf);
        assert_eq!(c.selection(), TextRegion::new(pos(0, 11), pos(0, 14)));
    }

    #[test]
    fn test_word_motion() {
        let buf = TextBuffer::from_text("foo, bar baz\nqux");
        let mut c = CursorModel::new();
        c.move_word_right(&buf, &Unwrapped, 1);
        assert_eq!(c.pos(), pos(0, 3));
        c.move_word_right(&buf, &Unwrapped, 1);
        assert_eq!(c.pos(), pos(0, 8));
        c.move_word_right(&buf, &Unwrapped, 2);
        assert_eq!(c.pos(), pos(1, 0));
        c.move_word_left(&buf, &Unwrapped, 2);
        assert_eq!(c.pos(), pos(0, 9));
    }

    #[test]
    fn test_mouse_select_extends_from_old_cursor() {
        let buf = TextBuffer::from_text("abcdef");
        let mut c = CursorModel::new();
        c.place(&buf, &Unwrapped, pos(0, 4));
        c.mouse_select(&buf, &Unwrapped, pos(0, 1), true, false);
        assert_eq!(c.selection(), TextRegion::new(pos(0, 1), pos(0, 4)));
        c.select_reset();
        c.mouse_select(&buf, &Unwrapped, pos(0, 5), false, false);
        assert!(!c.has_selection());
        assert_eq!(c.pos(), pos(0, 5));
    }

    #[test]
    fn test_adjust_for_edit_elsewhere() {
        let mut buf = TextBuffer::from_text("abc\ndef");
        let mut c = CursorModel::new();
        c.set_pos(&buf, pos(1, 2));
        let edit = buf.insert_text(pos(0, 0), "xx\n").unwrap();
        c.adjust_for_edit(&edit);
        assert_eq!(c.pos(), pos(2, 2));
    }
}
