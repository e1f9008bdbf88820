//! Interactive search as seen from a view: cursor placement, match selection and the
//! highlighted match set.

use crate::buffer::SharedBuffer;
use crate::isearch::SearchOutcome;

use super::TextView;

impl TextView {
    /// The search command: enter search mode, or step to the next match.
    pub fn isearch_trigger(&mut self) {
        self.op(|view, shared| view.do_isearch_trigger(shared));
    }

    /// Add `ch` to the search string.
    pub fn isearch_key(&mut self, ch: char) {
        self.op(|view, shared| view.do_isearch_key(shared, ch));
    }

    /// Drop the last character of the search string.
    pub fn isearch_backspace(&mut self) {
        self.op(|view, shared| view.do_isearch_backspace(shared));
    }

    /// Cancel search mode, or clear the selection when not searching.
    ///
    /// Cancelling a search puts the cursor back where the search started.
    pub fn escape(&mut self) {
        self.op(|view, shared| view.do_escape(shared));
    }

    pub(super) fn do_isearch_trigger(&mut self, shared: &SharedBuffer) {
        self.completion.close();
        let outcome = {
            let buf = shared.borrow();
            self.isearch.trigger(&buf, self.cursor.pos())
        };
        self.apply_search_outcome(shared, outcome);
    }

    pub(super) fn do_isearch_key(&mut self, shared: &SharedBuffer, ch: char) {
        self.completion.close();
        let outcome = {
            let buf = shared.borrow();
            self.isearch.key(&buf, self.cursor.pos(), ch)
        };
        self.apply_search_outcome(shared, outcome);
    }

    pub(super) fn do_isearch_backspace(&mut self, shared: &SharedBuffer) {
        let outcome = {
            let buf = shared.borrow();
            self.isearch.backspace(&buf, self.cursor.pos())
        };
        self.apply_search_outcome(shared, outcome);
    }

    pub(super) fn do_escape(&mut self, shared: &SharedBuffer) {
        self.completion.close();
        if let Some(start) = self.isearch.cancel() {
            self.cursor.select_reset();
            self.place_cursor(shared, start);
            self.scroll_cursor_to_center_if_hidden();
            self.update_find_highlights();
        } else if self.cursor.has_selection() || self.cursor.select_mode() {
            self.cursor.select_reset();
        }
    }

    /// Leave search mode where the cursor is now.
    pub(super) fn isearch_cancel(&mut self) {
        if self.isearch.cancel().is_some() {
            self.update_find_highlights();
        }
    }

    fn apply_search_outcome(&mut self, shared: &SharedBuffer, outcome: SearchOutcome) {
        tracing::trace!(target: "textview_core::view", view = self.id.get(), ?outcome, string = self.isearch.string(), "search step");
        if let SearchOutcome::Moved { pos, select } = outcome {
            self.place_cursor(shared, pos);
            match select {
                Some(region) => self.cursor.set_selection(&shared.borrow(), region),
                None => self.cursor.select_reset(),
            }
            self.scroll_cursor_to_center_if_hidden();
        }
        self.update_find_highlights();
    }

    /// Highlight the current search matches, or nothing outside search mode.
    fn update_find_highlights(&mut self) {
        if self.isearch.is_active() && !self.isearch.matches().is_empty() {
            self.find
                .set(self.isearch.matches(), self.isearch.match_len());
        } else if !self.find.is_empty() {
            self.find.clear();
        } else {
            return;
        }
        self.repaint.full();
    }

    /// Re-run the active search after the text changed.
    pub(super) fn refresh_find_highlights(&mut self, shared: &SharedBuffer) {
        {
            let buf = shared.borrow();
            self.isearch.refresh(&buf);
        }
        self.update_find_highlights();
    }
}
