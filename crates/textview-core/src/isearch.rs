//! Interactive (search-as-you-type) search.
//!
//! [`InteractiveSearch`] is a small state machine driven by the view:
//!
//! ```text
//! Inactive --trigger--> Active("") --key--> Active(matching) --trigger--> next match (wraps)
//!                                       \--backspace--> Active(shrinking)
//! Active --cancel--> Inactive   (the view restores the entry position on Escape)
//! ```
//!
//! Typing an uppercase letter switches the session to case-sensitive matching for the rest
//! of the session. Cancelling remembers the string and case flag; a repeat trigger on an
//! empty string restores them and searches again.

use crate::buffer::TextBuffer;
use crate::position::{TextPosition, TextRegion};
use crate::search::{find_matches, first_after, first_from_line};

/// What the view should do after a search step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Search mode was entered; nothing moves.
    Entered,
    /// Move the cursor to `pos`, and select `select` if given.
    Moved {
        /// New cursor position (the start of the current match).
        pos: TextPosition,
        /// Region to select, if the selection should follow the match.
        select: Option<TextRegion>,
    },
    /// The string has no matches; the cursor stays where it is.
    NoMatches,
    /// Nothing changed.
    Unchanged,
}

/// State of one interactive search session plus the remembered previous session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractiveSearch {
    active: bool,
    string: String,
    case_sensitive: bool,
    matches: Vec<TextPosition>,
    current: Option<usize>,
    start_pos: TextPosition,
    prev_string: String,
    prev_case: bool,
}

impl InteractiveSearch {
    /// An inactive search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while search mode is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The current search string.
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Returns `true` if matching is case-sensitive.
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// All matches of the current string, in document order.
    pub fn matches(&self) -> &[TextPosition] {
        &self.matches
    }

    /// Index of the current match.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Cursor position when the session started.
    pub fn start_pos(&self) -> TextPosition {
        self.start_pos
    }

    /// Length of the search string in characters.
    pub fn match_len(&self) -> usize {
        self.string.chars().count()
    }

    fn rematch(&mut self, buffer: &TextBuffer) {
        self.matches = find_matches(buffer, &self.string, self.case_sensitive);
    }

    fn select_match(&mut self, idx: usize) -> SearchOutcome {
        self.current = Some(idx);
        let pos = self.matches[idx];
        SearchOutcome::Moved {
            pos,
            select: Some(TextRegion::with_len(pos, self.match_len())),
        }
    }

    /// The search command: enter search mode, or step to the next match (wrapping).
    ///
    /// On an empty string the previous session's string and case flag are restored once.
    pub fn trigger(&mut self, buffer: &TextBuffer, cursor: TextPosition) -> SearchOutcome {
        if !self.active {
            self.active = true;
            self.start_pos = cursor;
            self.case_sensitive = false;
            self.matches.clear();
            self.current = None;
            tracing::debug!(target: "textview_core::isearch", %cursor, "interactive search started");
            return SearchOutcome::Entered;
        }

        if self.string.is_empty() {
            if self.prev_string.is_empty() {
                return SearchOutcome::Unchanged;
            }
            self.string = std::mem::take(&mut self.prev_string);
            self.case_sensitive = self.prev_case;
            self.current = None;
            self.rematch(buffer);
            return self.trigger(buffer, cursor);
        }

        if self.matches.is_empty() {
            return SearchOutcome::NoMatches;
        }
        let next = match self.current {
            Some(i) if i + 1 < self.matches.len() => i + 1,
            _ => 0,
        };
        self.select_match(next)
    }

    /// A printable character typed while searching.
    pub fn key(&mut self, buffer: &TextBuffer, cursor: TextPosition, ch: char) -> SearchOutcome {
        if self.string == self.prev_string {
            self.string.clear();
        }
        if ch.is_uppercase() {
            self.case_sensitive = true;
        }
        self.string.push(ch);
        self.rematch(buffer);
        if self.matches.is_empty() {
            self.current = None;
            return SearchOutcome::NoMatches;
        }
        let idx = first_after(&self.matches, cursor).unwrap_or(0);
        self.select_match(idx)
    }

    /// Backspace while searching: drop the last character and search again.
    pub fn backspace(&mut self, buffer: &TextBuffer, cursor: TextPosition) -> SearchOutcome {
        if self.string == self.prev_string {
            self.string.clear();
            self.matches.clear();
            self.current = None;
        }
        if self.string.chars().count() <= 1 {
            self.string.clear();
            self.case_sensitive = false;
            self.matches.clear();
            self.current = None;
            return SearchOutcome::Unchanged;
        }
        self.string.pop();
        self.rematch(buffer);
        if self.matches.is_empty() {
            self.current = None;
            return SearchOutcome::NoMatches;
        }
        let idx = first_from_line(&self.matches, cursor.line).unwrap_or(0);
        self.current = Some(idx);
        SearchOutcome::Moved {
            pos: self.matches[idx],
            select: None,
        }
    }

    /// Search again after the text changed, keeping the current index in range.
    pub fn refresh(&mut self, buffer: &TextBuffer) {
        if !self.active || self.string.is_empty() {
            return;
        }
        self.rematch(buffer);
        self.current = match self.current {
            Some(i) if !self.matches.is_empty() => Some(i.min(self.matches.len() - 1)),
            _ => None,
        };
    }

    /// Leave search mode, remembering the string and case flag for the next session.
    ///
    /// Returns the position search mode was entered at, or `None` if it was not active.
    pub fn cancel(&mut self) -> Option<TextPosition> {
        if !self.active {
            return None;
        }
        self.prev_string = std::mem::take(&mut self.string);
        self.prev_case = self.case_sensitive;
        self.case_sensitive = false;
        self.active = false;
        self.current = None;
        self.matches.clear();
        tracing::debug!(target: "textview_core::isearch", "interactive search ended");
        Some(self.start_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> TextPosition {
        TextPosition::new(line, column)
    }

    #[test]
    fn test_typing_jumps_to_first_match_after_cursor() {
        let buf = TextBuffer::from_text("foo\nbar\nboo");
        let mut s = InteractiveSearch::new();
        assert_eq!(s.trigger(&buf, pos(1, 0)), SearchOutcome::Entered);
        assert_eq!(
            s.key(&buf, pos(1, 0), 'o'),
            SearchOutcome::Moved {
                pos: pos(2, 1),
                select: Some(TextRegion::with_len(pos(2, 1), 1)),
            }
        );
        assert_eq!(s.current(), Some(2));
    }

    #[test]
    fn test_wraps_to_first_match() {
        let buf = TextBuffer::from_text("ab\nab");
        let mut s = InteractiveSearch::new();
        s.trigger(&buf, pos(1, 1));
        let out = s.key(&buf, pos(1, 1), 'a');
        assert!(matches!(out, SearchOutcome::Moved { pos: p, .. } if p == pos(0, 0)));
    }

    #[test]
    fn test_uppercase_turns_on_case_sensitivity_for_the_session() {
        let buf = TextBuffer::from_text("Ab ab");
        let mut s = InteractiveSearch::new();
        s.trigger(&buf, pos(0, 0));
        s.key(&buf, pos(0, 0), 'A');
        assert!(s.case_sensitive());
        assert_eq!(s.matches(), &[pos(0, 0)]);
        s.backspace(&buf, pos(0, 0));
        assert!(!s.case_sensitive());
    }

    #[test]
    fn test_no_matches_leaves_cursor() {
        let buf = TextBuffer::from_text("abc");
        let mut s = InteractiveSearch::new();
        s.trigger(&buf, pos(0, 0));
        assert_eq!(s.key(&buf, pos(0, 0), 'z'), SearchOutcome::NoMatches);
        assert_eq!(s.current(), None);
    }

    #[test]
    fn test_repeat_trigger_cycles_all_matches_once() {
        let buf = TextBuffer::from_text("x x\nx");
        let mut s = InteractiveSearch::new();
        s.trigger(&buf, pos(0, 0));
        s.key(&buf, pos(0, 0), 'x');
        let mut seen = vec![s.current().unwrap()];
        for _ in 0..3 {
            s.trigger(&buf, pos(0, 0));
            seen.push(s.current().unwrap());
        }
        assert_eq!(seen, vec![1, 2, 0, 1]);
    }

    #[test]
    fn test_cancel_then_empty_trigger_restores_previous_string() {
        let buf = TextBuffer::from_text("Foo foo");
        let mut s = InteractiveSearch::new();
        s.trigger(&buf, pos(0, 2));
        s.key(&buf, pos(0, 2), 'F');
        assert_eq!(s.cancel(), Some(pos(0, 2)));
        assert!(!s.is_active());

        s.trigger(&buf, pos(0, 0));
        let out = s.trigger(&buf, pos(0, 0));
        assert_eq!(s.string(), "F");
        assert!(s.case_sensitive());
        assert!(matches!(out, SearchOutcome::Moved { pos: p, .. } if p == pos(0, 0)));
    }

    #[test]
    fn test_backspace_picks_match_on_or_after_cursor_line() {
        let buf = TextBuffer::from_text("ab\nab\nab");
        let mut s = InteractiveSearch::new();
        s.trigger(&buf, pos(1, 0));
        s.key(&buf, pos(1, 0), 'a');
        s.key(&buf, pos(1, 0), 'b');
        let out = s.backspace(&buf, pos(1, 0));
        assert_eq!(
            out,
            SearchOutcome::Moved {
                pos: pos(1, 0),
                select: None
            }
        );
        assert_eq!(s.string(), "a");
    }
}
