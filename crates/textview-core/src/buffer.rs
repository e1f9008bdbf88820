//! The shared text buffer and its edit-notification contract.
//!
//! A [`TextBuffer`] owns the authoritative text as a sequence of logical lines (stored in a
//! [`Rope`]). Views never own the buffer: they hold a [`Weak`](std::rc::Weak) back-reference
//! and register with [`TextBuffer::add_view`], which hands them the receiving end of a typed
//! event channel. Every mutation is broadcast synchronously to all registered views as a
//! [`BufferEvent`]; a view unregisters with [`TextBuffer::remove_view`] (the view does this
//! when it is dropped), and channels whose receiver is gone are pruned on the next send.
//!
//! Positions passed to editing methods are clamped, never rejected.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use ropey::Rope;
use textview_lang::{LanguageConfig, LanguageRegistry};

use crate::line_ending::LineEnding;
use crate::position::{TextPosition, TextRegion};
use crate::search;
use crate::undo::UndoStack;

/// A buffer shared between any number of views.
pub type SharedBuffer = Rc<RefCell<TextBuffer>>;

/// Identifier of a view registered on a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ViewId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Description of one applied edit.
///
/// For an insertion, `region` spans the inserted text in the new buffer contents. For a
/// deletion, `region` spans the removed text in the old contents (its `start` is valid in
/// both). `text` is the inserted or removed text, `'\n'`-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Region covered by the edit.
    pub region: TextRegion,
    /// `true` for insertions, `false` for deletions.
    pub is_insert: bool,
    /// The inserted or deleted text.
    pub text: String,
}

impl TextEdit {
    /// First logical line touched.
    pub fn start_line(&self) -> usize {
        self.region.start.line
    }

    /// Last logical line touched (in the coordinate space described on [`TextEdit`]).
    pub fn end_line(&self) -> usize {
        self.region.end.line
    }

    /// Returns `true` for deletions.
    pub fn is_deletion(&self) -> bool {
        !self.is_insert
    }

    /// Returns `true` if the edit added or removed line breaks.
    pub fn is_multi_line(&self) -> bool {
        self.region.start.line != self.region.end.line
    }

    /// Number of line breaks added (insert) or removed (delete).
    pub fn line_delta(&self) -> usize {
        self.region.end.line - self.region.start.line
    }
}

/// Notification sent to every registered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEvent {
    /// Text was inserted or deleted.
    Edited(TextEdit),
    /// The whole content was replaced.
    Reset,
    /// The buffer's language changed; highlighting must be re-initialized.
    LanguageChanged,
}

/// The authoritative text of a document.
pub struct TextBuffer {
    rope: Rope,
    line_ending: LineEnding,
    changed: bool,
    version: u64,
    undo: UndoStack,
    language: Option<LanguageConfig>,
    views: Vec<(ViewId, Sender<BufferEvent>)>,
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("lines", &self.line_count())
            .field("changed", &self.changed)
            .field("version", &self.version)
            .field("views", &self.views.len())
            .finish()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Create an empty buffer (one empty line).
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            line_ending: LineEnding::Lf,
            changed: false,
            version: 0,
            undo: UndoStack::new(),
            language: None,
            views: Vec::new(),
        }
    }

    /// Create a buffer holding `text`. CRLF line breaks are normalized to LF.
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new();
        buf.line_ending = LineEnding::detect_in_text(text);
        buf.rope = Rope::from_str(&LineEnding::normalize(text));
        buf
    }

    /// Create a shared buffer holding `text`.
    pub fn shared(text: &str) -> SharedBuffer {
        Rc::new(RefCell::new(Self::from_text(text)))
    }

    /// Replace the whole content. Clears undo history and the changed flag.
    pub fn set_text(&mut self, text: &str) {
        self.line_ending = LineEnding::detect_in_text(text);
        self.rope = Rope::from_str(&LineEnding::normalize(text));
        self.undo.clear();
        self.changed = false;
        self.version += 1;
        tracing::debug!(target: "textview_core::buffer", lines = self.line_count(), "buffer reset");
        self.notify(BufferEvent::Reset);
    }

    /// Full text, LF line breaks.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Full text converted to the line ending detected on load.
    pub fn text_for_save(&self) -> String {
        self.line_ending.apply_to_text(&self.text())
    }

    /// Line ending detected on load.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Number of logical lines (always at least 1).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of line `n` without its line break; empty if out of range.
    pub fn line(&self, n: usize) -> String {
        if n >= self.line_count() {
            return String::new();
        }
        let mut text = self.rope.line(n).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        text
    }

    /// Length of line `n` in characters; 0 if out of range.
    pub fn line_len(&self, n: usize) -> usize {
        if n >= self.line_count() {
            return 0;
        }
        let slice = self.rope.line(n);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Iterate over all lines (without line breaks).
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.line_count()).map(|n| self.line(n))
    }

    /// Position just after the last character.
    pub fn end_pos(&self) -> TextPosition {
        let last = self.line_count() - 1;
        TextPosition::new(last, self.line_len(last))
    }

    /// Clamp `pos` to the nearest valid position.
    pub fn clamp(&self, pos: TextPosition) -> TextPosition {
        let line = pos.line.min(self.line_count() - 1);
        TextPosition::new(line, pos.column.min(self.line_len(line)))
    }

    /// Returns `true` if the text was modified since load or the last [`mark_saved`](Self::mark_saved).
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Clear the changed flag (after the host saved the text).
    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    /// Monotonic counter bumped on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn char_index(&self, pos: TextPosition) -> usize {
        self.rope.line_to_char(pos.line) + pos.column
    }

    /// Text between two positions (in any order), `'\n'`-separated; `None` if empty.
    pub fn region_text(&self, a: TextPosition, b: TextPosition) -> Option<String> {
        let region = TextRegion::new(self.clamp(a), self.clamp(b));
        if region.is_empty() {
            return None;
        }
        let start = self.char_index(region.start);
        let end = self.char_index(region.end);
        Some(self.rope.slice(start..end).to_string())
    }

    /// Insert `text` at `pos` (clamped). Returns the applied edit; `None` for empty text.
    pub fn insert_text(&mut self, pos: TextPosition, text: &str) -> Option<TextEdit> {
        let edit = self.apply_insert(pos, text)?;
        self.undo.record(edit.clone());
        self.notify(BufferEvent::Edited(edit.clone()));
        Some(edit)
    }

    /// Delete the text between two positions (clamped, any order).
    ///
    /// Returns the applied edit including the removed text; `None` if the region is empty.
    pub fn delete_text(&mut self, a: TextPosition, b: TextPosition) -> Option<TextEdit> {
        let edit = self.apply_delete(a, b)?;
        self.undo.record(edit.clone());
        self.notify(BufferEvent::Edited(edit.clone()));
        Some(edit)
    }

    /// Append `text` at the end of the buffer.
    pub fn append_text(&mut self, text: &str) -> Option<TextEdit> {
        self.insert_text(self.end_pos(), text)
    }

    fn apply_insert(&mut self, pos: TextPosition, text: &str) -> Option<TextEdit> {
        if text.is_empty() {
            return None;
        }
        let text = LineEnding::normalize(text);
        let start = self.clamp(pos);
        let idx = self.char_index(start);
        self.rope.insert(idx, &text);

        let newlines = text.matches('\n').count();
        let end = match text.rfind('\n') {
            None => TextPosition::new(start.line, start.column + text.chars().count()),
            Some(last_nl) => {
                TextPosition::new(start.line + newlines, text[last_nl + 1..].chars().count())
            }
        };
        self.changed = true;
        self.version += 1;
        Some(TextEdit {
            region: TextRegion { start, end },
            is_insert: true,
            text,
        })
    }

    fn apply_delete(&mut self, a: TextPosition, b: TextPosition) -> Option<TextEdit> {
        let region = TextRegion::new(self.clamp(a), self.clamp(b));
        if region.is_empty() {
            return None;
        }
        let start = self.char_index(region.start);
        let end = self.char_index(region.end);
        let text = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);
        self.changed = true;
        self.version += 1;
        Some(TextEdit {
            region,
            is_insert: false,
            text,
        })
    }

    /// Revert the most recent edit. Returns the record that was undone.
    ///
    /// With nothing to undo this is a no-op that clears the changed flag.
    pub fn undo(&mut self) -> Option<TextEdit> {
        let Some(record) = self.undo.step_back() else {
            self.changed = false;
            return None;
        };
        let applied = if record.is_insert {
            self.apply_delete(record.region.start, record.region.end)
        } else {
            self.apply_insert(record.region.start, &record.text)
        };
        if let Some(applied) = applied {
            self.notify(BufferEvent::Edited(applied));
        }
        Some(record)
    }

    /// Re-apply the most recently undone edit. Returns the record that was redone.
    pub fn redo(&mut self) -> Option<TextEdit> {
        let record = self.undo.step_forward()?;
        let applied = if record.is_insert {
            self.apply_insert(record.region.start, &record.text)
        } else {
            self.apply_delete(record.region.start, record.region.end)
        };
        if let Some(applied) = applied {
            self.notify(BufferEvent::Edited(applied));
        }
        Some(record)
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Literal search over all lines; see [`search::find_matches`].
    pub fn search(&self, find: &str, case_sensitive: bool) -> Vec<TextPosition> {
        search::find_matches(self, find, case_sensitive)
    }

    /// The language associated with this buffer, if any.
    pub fn language(&self) -> Option<&LanguageConfig> {
        self.language.as_ref()
    }

    /// Set (or clear) the buffer's language and tell all views to re-initialize highlighting.
    pub fn set_language(&mut self, language: Option<LanguageConfig>) {
        if self.language == language {
            return;
        }
        self.language = language;
        self.notify(BufferEvent::LanguageChanged);
    }

    /// Pick the language from a file name using `registry`. Returns `true` if one matched.
    pub fn set_language_for_path(&mut self, path: &str, registry: &LanguageRegistry) -> bool {
        let lang = registry.for_path(path).cloned();
        let found = lang.is_some();
        self.set_language(lang);
        found
    }

    /// Register a view. The returned receiver yields every subsequent [`BufferEvent`].
    pub fn add_view(&mut self, id: ViewId) -> Receiver<BufferEvent> {
        let (tx, rx) = unbounded();
        if let Some(slot) = self.views.iter_mut().find(|(v, _)| *v == id) {
            tracing::warn!(target: "textview_core::buffer", view = id.get(), "view registered twice; replacing its channel");
            slot.1 = tx;
        } else {
            self.views.push((id, tx));
        }
        tracing::debug!(target: "textview_core::buffer", view = id.get(), views = self.views.len(), "view registered");
        rx
    }

    /// Unregister a view. Unknown ids are ignored.
    pub fn remove_view(&mut self, id: ViewId) {
        self.views.retain(|(v, _)| *v != id);
        tracing::debug!(target: "textview_core::buffer", view = id.get(), views = self.views.len(), "view unregistered");
    }

    /// Returns `true` if `id` is registered.
    pub fn is_registered(&self, id: ViewId) -> bool {
        self.views.iter().any(|(v, _)| *v == id)
    }

    /// Number of registered views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    fn notify(&mut self, event: BufferEvent) {
        self.views.retain(|(id, tx)| {
            let alive = tx.send(event.clone()).is_ok();
            if !alive {
                tracing::debug!(target: "textview_core::buffer", view = id.get(), "pruning disconnected view");
            }
            alive
        });
    }
}
