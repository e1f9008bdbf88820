//! Editing operations and completion.
//!
//! Every edit goes through the shared buffer; the events it produces are drained into this
//! view's cache right away (without moving the cursor) and the operation then places the
//! cursor itself. Read-only views ignore all of these.

use textview_lang::IndentConfig;

use crate::buffer::{SharedBuffer, TextEdit};
use crate::completion::Completion;
use crate::indent::IndentStyle;
use crate::position::TextPosition;

use super::TextView;

fn closing_bracket(ch: char) -> Option<char> {
    match ch {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

impl TextView {
    /// Insert `text` at the cursor, replacing the selection if there is one.
    pub fn insert_at_cursor(&mut self, text: &str) {
        if self.refuse_edit("insert") {
            return;
        }
        self.op(|view, shared| {
            view.do_insert_at_cursor(shared, text);
        });
    }

    /// Type one character: brackets may be auto-closed, a closing brace re-indents its line
    /// and completion is offered afterwards.
    pub fn type_char(&mut self, ch: char) {
        if self.refuse_edit("type") {
            return;
        }
        self.op(|view, shared| view.do_type_char(shared, ch));
    }

    /// Delete the selection, or `steps` characters before the cursor.
    pub fn backspace(&mut self, steps: usize) {
        if self.refuse_edit("backspace") {
            return;
        }
        self.op(|view, shared| view.do_backspace(shared, steps));
    }

    /// Delete the selection, or `steps` characters after the cursor.
    pub fn delete_forward(&mut self, steps: usize) {
        if self.refuse_edit("delete") {
            return;
        }
        self.op(|view, shared| view.do_delete_forward(shared, steps));
    }

    /// Delete to the end of the line and put the text on the clipboard. On an empty line the
    /// line itself is removed. Returns the killed text.
    pub fn kill_line(&mut self) -> Option<String> {
        if self.refuse_edit("kill") {
            return None;
        }
        self.op(|view, shared| view.do_kill_line(shared)).flatten()
    }

    /// Delete the selection and put it on the clipboard.
    pub fn cut(&mut self) -> Option<String> {
        if self.refuse_edit("cut") {
            return None;
        }
        self.op(|view, shared| view.do_cut(shared)).flatten()
    }

    /// Put the selection on the clipboard, optionally clearing the selection.
    pub fn copy(&mut self, reset: bool) -> Option<String> {
        self.op(|view, shared| {
            let region = view.cursor.selection();
            let text = shared.borrow().region_text(region.start, region.end)?;
            view.clipboard.write(&text);
            if reset {
                view.cursor.select_reset();
            }
            Some(text)
        })
        .flatten()
    }

    /// Insert the clipboard text at the cursor.
    pub fn paste(&mut self) {
        if self.refuse_edit("paste") {
            return;
        }
        self.op(|view, shared| {
            let Some(text) = view.clipboard.read() else {
                return;
            };
            view.do_insert_at_cursor(shared, &text);
        });
    }

    /// Undo the last edit of the buffer. Returns true if something was undone.
    pub fn undo(&mut self) -> bool {
        if self.refuse_edit("undo") {
            return false;
        }
        self.op(|view, shared| {
            let record = shared.borrow_mut().undo();
            view.absorb_own_edits(shared);
            let Some(record) = record else {
                return false;
            };
            let pos = if record.is_deletion() {
                record.region.end
            } else {
                record.region.start
            };
            view.cursor.select_reset();
            view.place_cursor(shared, pos);
            view.scroll_cursor_to_center_if_hidden();
            true
        })
        .unwrap_or(false)
    }

    /// Redo the last undone edit. Returns true if something was redone.
    pub fn redo(&mut self) -> bool {
        if self.refuse_edit("redo") {
            return false;
        }
        self.op(|view, shared| {
            let record = shared.borrow_mut().redo();
            view.absorb_own_edits(shared);
            let Some(record) = record else {
                return false;
            };
            let pos = if record.is_deletion() {
                record.region.start
            } else {
                record.region.end
            };
            view.cursor.select_reset();
            view.place_cursor(shared, pos);
            view.scroll_cursor_to_center_if_hidden();
            true
        })
        .unwrap_or(false)
    }

    /// Break the line at the cursor and auto-indent the new line.
    pub fn newline(&mut self) {
        if self.refuse_edit("newline") {
            return;
        }
        self.op(|view, shared| view.do_newline(shared));
    }

    /// The Tab key: auto-indent the line when at column 0, else insert one indent.
    pub fn tab(&mut self) {
        if self.refuse_edit("tab") {
            return;
        }
        let indented = self.op(|view, shared| view.do_tab(shared));
        self.last_was_tab_ai = indented.unwrap_or(false);
    }

    /// Remove one indentation level from the cursor line.
    pub fn unindent(&mut self) {
        if self.refuse_edit("unindent") {
            return;
        }
        self.op(|view, shared| view.do_unindent(shared));
    }

    /// Offer completions for the text before the cursor. `force` offers even with live
    /// completion off or an empty prefix.
    pub fn offer_complete(&mut self, force: bool) {
        self.op(|view, shared| view.do_offer_complete(shared, force));
    }

    /// Close the completion popup.
    pub fn cancel_complete(&mut self) {
        self.completion.close();
    }

    /// Replace the text before the cursor with `choice`.
    pub fn complete_text(&mut self, choice: &Completion) {
        if self.refuse_edit("complete") {
            return;
        }
        self.op(|view, shared| view.do_complete_text(shared, choice));
    }

    /// Insert what all candidates have in common and offer again.
    pub fn complete_extend(&mut self) {
        if self.refuse_edit("complete") {
            return;
        }
        self.op(|view, shared| {
            let ext = view.completion.common_extension();
            if !ext.is_empty() {
                view.do_insert_at_cursor(shared, &ext);
            }
            view.do_offer_complete(shared, false);
        });
    }

    // ---- internals ---------------------------------------------------------------------

    fn refuse_edit(&self, what: &'static str) -> bool {
        if self.options.read_only {
            tracing::debug!(target: "textview_core::view", view = self.id.get(), op = what, "read-only view; edit ignored");
        }
        self.options.read_only
    }

    fn indent_style(&self) -> IndentStyle {
        IndentStyle::new(self.options.space_indent, self.options.tab_width)
    }

    pub(super) fn place_cursor(&mut self, shared: &SharedBuffer, pos: TextPosition) {
        let buf = shared.borrow();
        self.cursor.place(&buf, &self.layout, pos);
    }

    fn insert_raw(&mut self, shared: &SharedBuffer, pos: TextPosition, text: &str) -> Option<TextEdit> {
        let edit = shared.borrow_mut().insert_text(pos, text);
        self.absorb_own_edits(shared);
        edit
    }

    fn delete_raw(&mut self, shared: &SharedBuffer, a: TextPosition, b: TextPosition) -> Option<TextEdit> {
        let edit = shared.borrow_mut().delete_text(a, b);
        self.absorb_own_edits(shared);
        edit
    }

    /// Auto-indent line `ln`. Returns whether it changed and the column after the indent.
    fn auto_indent_line(&mut self, shared: &SharedBuffer, ln: usize) -> (bool, usize) {
        let tokens = shared
            .borrow()
            .language()
            .map(|l| l.indent.clone())
            .unwrap_or_else(IndentConfig::default);
        let style = self.indent_style();
        let (edit, _, cpos) =
            shared
                .borrow_mut()
                .auto_indent(ln, style, &tokens.indent, &tokens.unindent);
        self.absorb_own_edits(shared);
        (edit.is_some(), cpos)
    }

    pub(super) fn do_delete_selection(&mut self, shared: &SharedBuffer) -> Option<TextEdit> {
        let region = self.cursor.selection();
        self.cursor.select_reset();
        if !region.is_active() {
            return None;
        }
        self.delete_raw(shared, region.start, region.end)
    }

    pub(super) fn do_insert_at_cursor(&mut self, shared: &SharedBuffer, text: &str) -> Option<TextEdit> {
        if self.cursor.has_selection() {
            if let Some(del) = self.do_delete_selection(shared) {
                let pos = self.cursor.pos().adjust_for_edit(&del);
                self.cursor.set_pos(&shared.borrow(), pos);
            }
        }
        let at = self.cursor.pos();
        let edit = self.insert_raw(shared, at, text)?;
        let mut pos = edit.region.end;
        if text == "\n" {
            pos.column = 0;
        }
        self.place_cursor(shared, pos);
        Some(edit)
    }

    pub(super) fn do_type_char(&mut self, shared: &SharedBuffer, ch: char) {
        let pos = self.cursor.pos();
        let (line_len, next) = {
            let line = shared.borrow().line(pos.line);
            (line.chars().count(), line.chars().nth(pos.column))
        };
        if self.last_auto_insert == Some(ch) && next == Some(ch) {
            self.last_auto_insert = None;
            self.place_cursor(shared, TextPosition::new(pos.line, pos.column + 1));
            return;
        }
        if self.options.auto_close_brackets && !self.cursor.has_selection() {
            if let Some(ket) = closing_bracket(ch) {
                if self.insert_bracket(shared, ch, ket) {
                    self.completion.close();
                    return;
                }
            }
        }
        if ch == '}' && self.options.auto_indent && pos.column == line_len {
            self.completion.close();
            self.do_insert_at_cursor(shared, "}");
            let ln = self.cursor.pos().line;
            self.auto_indent_line(shared, ln);
            let end = shared.borrow().line_len(ln);
            self.place_cursor(shared, TextPosition::new(ln, end));
            return;
        }
        let mut utf8 = [0; 4];
        self.do_insert_at_cursor(shared, ch.encode_utf8(&mut utf8));
        if ch == ' ' {
            self.completion.close();
        } else {
            self.do_offer_complete(shared, false);
        }
    }

    /// Insert `bra` together with its closing `ket` when the cursor is at the end of the line
    /// or before whitespace. An opening brace at the end of a line opens an indented block.
    fn insert_bracket(&mut self, shared: &SharedBuffer, bra: char, ket: char) -> bool {
        let pos = self.cursor.pos();
        let chars: Vec<char> = shared.borrow().line(pos.line).chars().collect();
        let len = chars.len();
        let at_end = pos.column >= len;
        let (matched, block) = if bra == '{' && at_end {
            (true, len == 0 || chars[len - 1].is_whitespace())
        } else {
            (at_end || chars[pos.column].is_whitespace(), false)
        };
        if !matched {
            return false;
        }
        if block && self.options.auto_indent {
            self.do_insert_at_cursor(shared, &format!("{bra}\n"));
            let inner = self.cursor.pos().line;
            let (_, cpos) = self.auto_indent_line(shared, inner);
            self.place_cursor(shared, TextPosition::new(inner, cpos));
            self.do_insert_at_cursor(shared, &format!("\n{ket}"));
            let closing = self.cursor.pos().line;
            self.auto_indent_line(shared, closing);
            self.place_cursor(shared, TextPosition::new(inner, cpos));
        } else {
            self.do_insert_at_cursor(shared, &format!("{bra}{ket}"));
            self.place_cursor(shared, TextPosition::new(pos.line, pos.column + 1));
            self.last_auto_insert = Some(ket);
        }
        true
    }

    pub(super) fn do_backspace(&mut self, shared: &SharedBuffer, steps: usize) {
        if self.cursor.has_selection() {
            let start = self.cursor.selection().start;
            self.do_delete_selection(shared);
            self.place_cursor(shared, start);
            return;
        }
        let origin = self.cursor.pos();
        {
            let buf = shared.borrow();
            self.cursor.move_backward(&buf, &self.layout, steps);
        }
        let to = self.cursor.pos();
        if let Some(edit) = self.delete_raw(shared, to, origin) {
            self.cursor.adjust_for_edit(&edit);
        }
        self.place_cursor(shared, to);
        self.scroll_cursor_to_center_if_hidden();
    }

    pub(super) fn do_delete_forward(&mut self, shared: &SharedBuffer, steps: usize) {
        if self.cursor.has_selection() {
            let start = self.cursor.selection().start;
            self.do_delete_selection(shared);
            self.place_cursor(shared, start);
            return;
        }
        let origin = self.cursor.pos();
        {
            let buf = shared.borrow();
            self.cursor.move_forward(&buf, &self.layout, steps);
        }
        let to = self.cursor.pos();
        if let Some(edit) = self.delete_raw(shared, origin, to) {
            self.cursor.adjust_for_edit(&edit);
        }
        self.place_cursor(shared, origin);
    }

    pub(super) fn do_kill_line(&mut self, shared: &SharedBuffer) -> Option<String> {
        self.cursor.select_reset();
        let origin = self.cursor.pos();
        let end = {
            let buf = shared.borrow();
            let len = buf.line_len(origin.line);
            if origin.column < len {
                TextPosition::new(origin.line, len)
            } else if len == 0 && origin.line + 1 < buf.line_count() {
                TextPosition::new(origin.line + 1, 0)
            } else {
                return None;
            }
        };
        let edit = self.delete_raw(shared, origin, end)?;
        self.clipboard.write(&edit.text);
        self.place_cursor(shared, origin);
        Some(edit.text)
    }

    pub(super) fn do_cut(&mut self, shared: &SharedBuffer) -> Option<String> {
        let region = self.cursor.selection();
        let edit = self.do_delete_selection(shared)?;
        self.clipboard.write(&edit.text);
        self.place_cursor(shared, region.start);
        Some(edit.text)
    }

    pub(super) fn do_newline(&mut self, shared: &SharedBuffer) {
        self.do_insert_at_cursor(shared, "\n");
        if self.options.auto_indent {
            let ln = self.cursor.pos().line;
            let (changed, cpos) = self.auto_indent_line(shared, ln);
            if changed {
                self.place_cursor(shared, TextPosition::new(ln, cpos));
            }
        }
    }

    pub(super) fn do_tab(&mut self, shared: &SharedBuffer) -> bool {
        let pos = self.cursor.pos();
        if !self.last_was_tab_ai && pos.column == 0 && self.options.auto_indent {
            let (_, cpos) = self.auto_indent_line(shared, pos.line);
            self.place_cursor(shared, TextPosition::new(pos.line, cpos));
            return true;
        }
        let tab = self.indent_style().tab_string();
        self.do_insert_at_cursor(shared, &tab);
        false
    }

    pub(super) fn do_unindent(&mut self, shared: &SharedBuffer) {
        let pos = self.cursor.pos();
        if pos.column == 0 {
            return;
        }
        let style = self.indent_style();
        let (level, _) = shared.borrow().line_indent(pos.line, style.tab_width);
        if level == 0 {
            return;
        }
        shared.borrow_mut().indent_line(pos.line, level - 1, style);
        self.absorb_own_edits(shared);
        self.place_cursor(
            shared,
            TextPosition::new(pos.line, style.char_pos(level - 1)),
        );
    }

    fn line_prefix(shared: &SharedBuffer, pos: TextPosition) -> String {
        shared.borrow().line(pos.line).chars().take(pos.column).collect()
    }

    pub(super) fn do_offer_complete(&mut self, shared: &SharedBuffer, force: bool) {
        let Some(completer) = self.completer.as_ref() else {
            return;
        };
        if self.isearch.is_active() || (!self.options.completion && !force) {
            return;
        }
        self.completion.close();
        let pos = self.cursor.pos();
        let line_prefix = Self::line_prefix(shared, pos);
        let prefix = line_prefix.trim_start_matches([' ', '\t']);
        if prefix.is_empty() && !force {
            return;
        }
        let items = completer.completions(prefix, pos);
        let count = items.len();
        if self.completion.show(prefix, pos, items) {
            tracing::debug!(target: "textview_core::view", view = self.id.get(), prefix, count, "completion offered");
        }
    }

    pub(super) fn do_complete_text(&mut self, shared: &SharedBuffer, choice: &Completion) {
        self.completion.close();
        let Some(completer) = self.completer.as_ref() else {
            return;
        };
        let pos = self.cursor.pos();
        let line_prefix = Self::line_prefix(shared, pos);
        let replacement = completer.apply(&line_prefix, pos.column, choice);
        let keep = line_prefix
            .chars()
            .zip(replacement.chars())
            .take_while(|(a, b)| a == b)
            .count();
        let ln = pos.line;
        self.cursor.select_reset();
        self.delete_raw(shared, TextPosition::new(ln, keep), pos);
        let tail: String = replacement.chars().skip(keep).collect();
        self.insert_raw(shared, TextPosition::new(ln, keep), &tail);
        self.place_cursor(
            shared,
            TextPosition::new(ln, replacement.chars().count()),
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::buffer::TextBuffer;
    use crate::clipboard::MemoryClipboard;
    use crate::completion::{Completion, WordListCompleter};
    use crate::config::{EditorOptions, Theme};
    use crate::position::{TextPosition, TextRegion};
    use crate::view::TextView;

    fn pos(line: usize, column: usize) -> TextPosition {
        TextPosition::new(line, column)
    }

    fn view_on(text: &str) -> (crate::buffer::SharedBuffer, TextView) {
        let buf = TextBuffer::shared(text);
        let view = TextView::with_defaults(&buf);
        (buf, view)
    }

    #[test]
    fn test_insert_replaces_selection() {
        let (buf, mut view) = view_on("hello world");
        view.set_selection(TextRegion::new(pos(0, 0), pos(0, 5)));
        view.insert_at_cursor("bye");
        assert_eq!(buf.borrow().text(), "bye world");
        assert_eq!(view.cursor_pos(), pos(0, 3));
        assert!(!view.has_selection());
    }

    #[test]
    fn test_backspace_and_delete() {
        let (buf, mut view) = view_on("abc\ndef");
        view.set_cursor(pos(1, 0));
        view.backspace(1);
        assert_eq!(buf.borrow().text(), "abcdef");
        assert_eq!(view.cursor_pos(), pos(0, 3));
        view.delete_forward(2);
        assert_eq!(buf.borrow().text(), "abcf");
        assert_eq!(view.cursor_pos(), pos(0, 3));
        assert_eq!(view.layout().line_count(), 1);
    }

    #[test]
    fn test_kill_line_removes_empty_line() {
        let (buf, mut view) = view_on("one two\n\nthree");
        view.set_cursor(pos(0, 3));
        assert_eq!(view.kill_line().as_deref(), Some(" two"));
        assert_eq!(buf.borrow().text(), "one\n\nthree");
        view.set_cursor(pos(1, 0));
        assert_eq!(view.kill_line().as_deref(), Some("\n"));
        assert_eq!(buf.borrow().text(), "one\nthree");
        assert_eq!(view.cursor_pos(), pos(1, 0));
    }

    #[test]
    fn test_kill_line_returns_text_and_fills_clipboard() {
        let (buf, mut view) = view_on("xabc\nd");
        let clip = MemoryClipboard::new();
        view.set_clipboard(Box::new(clip.clone()));
        view.set_cursor(pos(0, 1));
        assert_eq!(view.kill_line().as_deref(), Some("abc"));
        assert_eq!(buf.borrow().text(), "x\nd");
        assert_eq!(clip.contents().as_deref(), Some("abc"));
        view.paste();
        assert_eq!(buf.borrow().text(), "xabc\nd");
    }

    #[test]
    fn test_placing_cursor_forgets_auto_closed_bracket() {
        let (buf, mut view) = view_on("");
        view.type_char('(');
        assert_eq!(buf.borrow().text(), "()");
        view.set_cursor(pos(0, 0));
        view.insert_at_cursor("x");
        assert_eq!(buf.borrow().text(), "x()");
        view.set_cursor(pos(0, 2));
        view.type_char(')');
        assert_eq!(buf.borrow().text(), "x())");
    }

    #[test]
    fn test_kill_at_end_of_non_empty_line_keeps_lines() {
        let (buf, mut view) = view_on("one\ntwo");
        view.set_cursor(pos(0, 3));
        assert_eq!(view.kill_line(), None);
        assert_eq!(buf.borrow().text(), "one\ntwo");
        assert_eq!(view.cursor_pos(), pos(0, 3));
    }

    #[test]
    fn test_cut_copy_paste_share_clipboard() {
        let (buf, mut view) = view_on("alpha beta");
        let clip = MemoryClipboard::new();
        view.set_clipboard(Box::new(clip.clone()));
        view.set_selection(TextRegion::new(pos(0, 0), pos(0, 6)));
        assert_eq!(view.copy(false).as_deref(), Some("alpha "));
        assert!(view.has_selection());
        assert_eq!(view.cut().as_deref(), Some("alpha "));
        assert_eq!(buf.borrow().text(), "beta");
        assert_eq!(view.cursor_pos(), pos(0, 0));
        view.cursor_line_end();
        view.paste();
        assert_eq!(buf.borrow().text(), "betaalpha ");
        assert_eq!(clip.contents().as_deref(), Some("alpha "));
    }

    #[test]
    fn test_undo_redo_restore_cursor() {
        let (buf, mut view) = view_on("abc");
        view.set_cursor(pos(0, 3));
        view.insert_at_cursor("def");
        assert!(view.undo());
        assert_eq!(buf.borrow().text(), "abc");
        assert_eq!(view.cursor_pos(), pos(0, 3));
        assert!(view.redo());
        assert_eq!(view.cursor_pos(), pos(0, 6));

        view.backspace(2);
        assert!(view.undo());
        assert_eq!(buf.borrow().text(), "abcdef");
        assert_eq!(view.cursor_pos(), pos(0, 6));
        assert!(view.redo());
        assert_eq!(view.cursor_pos(), pos(0, 4));
        assert!(!view.redo());
    }

    #[test]
    fn test_newline_auto_indents_after_brace() {
        let (buf, mut view) = view_on("fn main() {");
        view.cursor_line_end();
        view.newline();
        assert_eq!(buf.borrow().text(), "fn main() {\n\t");
        assert_eq!(view.cursor_pos(), pos(1, 1));
    }

    #[test]
    fn test_tab_auto_indents_then_inserts() {
        let buf = TextBuffer::shared("if x {\nbody");
        let opts = EditorOptions {
            space_indent: true,
            tab_width: 2,
            ..EditorOptions::default()
        };
        let mut view = TextView::new(&buf, opts, Theme::default());
        view.set_cursor(pos(1, 0));
        view.tab();
        assert_eq!(buf.borrow().line(1), "  body");
        assert_eq!(view.cursor_pos(), pos(1, 2));
        view.tab();
        assert_eq!(buf.borrow().line(1), "    body");
        view.unindent();
        assert_eq!(buf.borrow().line(1), "  body");
        assert_eq!(view.cursor_pos(), pos(1, 2));
    }

    #[test]
    fn test_brackets_close_and_skip_over() {
        let (buf, mut view) = view_on("");
        for ch in "f(x)".chars() {
            view.type_char(ch);
        }
        assert_eq!(buf.borrow().text(), "f(x)");
        assert_eq!(view.cursor_pos(), pos(0, 4));
    }

    #[test]
    fn test_brace_opens_indented_block() {
        let (buf, mut view) = view_on("if x ");
        view.cursor_line_end();
        view.type_char('{');
        assert_eq!(buf.borrow().text(), "if x {\n\t\n}");
        assert_eq!(view.cursor_pos(), pos(1, 1));
    }

    #[test]
    fn test_read_only_refuses_edits() {
        let buf = TextBuffer::shared("fixed");
        let opts = EditorOptions {
            read_only: true,
            ..EditorOptions::default()
        };
        let mut view = TextView::new(&buf, opts, Theme::default());
        view.insert_at_cursor("x");
        view.backspace(1);
        view.select_all();
        assert_eq!(view.cut(), None);
        assert_eq!(view.copy(true).as_deref(), Some("fixed"));
        assert_eq!(buf.borrow().text(), "fixed");
    }

    #[test]
    fn test_completion_offer_and_accept() {
        let (buf, mut view) = view_on("  pri");
        view.set_completer(Some(Box::new(WordListCompleter::new([
            "print", "println", "private",
        ]))));
        view.cursor_line_end();
        view.offer_complete(false);
        assert!(view.completion().is_open());
        assert_eq!(view.completion().seed(), "pri");
        assert_eq!(view.completion().items().len(), 3);

        view.complete_text(&Completion::new("println"));
        assert_eq!(buf.borrow().text(), "  println");
        assert_eq!(view.cursor_pos(), pos(0, 9));
        assert!(!view.completion().is_open());
    }

    #[test]
    fn test_completion_extend_inserts_common_part() {
        let (buf, mut view) = view_on("pr");
        view.set_completer(Some(Box::new(WordListCompleter::new(["print", "println"]))));
        view.cursor_line_end();
        view.offer_complete(false);
        view.complete_extend();
        assert_eq!(buf.borrow().text(), "print");
        assert!(view.completion().is_open());
        assert_eq!(view.completion().items().len(), 1);
    }
}
