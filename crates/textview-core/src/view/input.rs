//! Key dispatch.
//!
//! A key goes, in order, to the completion popup, to interactive search, to the universal
//! commands (navigation, selection, copy, search), to the editing commands (skipped on
//! read-only views, which use Tab and Enter for link navigation instead), and finally to
//! text insertion. The first stage that takes it wins.

use crate::keymap::{KeyEvent, KeyFunction};

use super::TextView;

impl TextView {
    /// Handle a key press. Returns false if the view did not consume it, so the host can
    /// route it elsewhere (focus traversal, dialog accept, global shortcuts).
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if self.shared().is_none() {
            return false;
        }
        self.sync();
        let func = self.keymap.lookup(&event.chord);
        tracing::trace!(target: "textview_core::view", view = self.id.get(), chord = %event.chord, ?func, "key");

        if func != Some(KeyFunction::Recenter) {
            self.last_recenter = 0;
        }
        let was_tab = func == Some(KeyFunction::FocusNext);
        let handled = self.dispatch_key(event, func);
        if !was_tab {
            self.last_was_tab_ai = false;
        }
        handled
    }

    fn dispatch_key(&mut self, event: &KeyEvent, func: Option<KeyFunction>) -> bool {
        if self.completion.is_open() && self.popup_key(func) {
            return true;
        }
        if self.isearch.is_active() && self.search_key(event, func) {
            return true;
        }
        let Some(func) = func else {
            return self.insert_typed(event);
        };
        if func.is_universal() {
            self.universal_command(func, event.shift());
            return true;
        }
        if self.options.read_only {
            return self.read_only_command(func);
        }
        self.edit_command(event, func)
    }

    fn popup_key(&mut self, func: Option<KeyFunction>) -> bool {
        match func {
            Some(KeyFunction::MoveUp) => self.completion.move_up(),
            Some(KeyFunction::MoveDown) => self.completion.move_down(),
            Some(KeyFunction::Enter) | Some(KeyFunction::Accept) => {
                if let Some(item) = self.completion.accept() {
                    self.complete_text(&item);
                }
            }
            Some(KeyFunction::Abort) | Some(KeyFunction::CancelSelect) => {
                self.completion.close()
            }
            Some(KeyFunction::FocusNext) => self.complete_extend(),
            _ => return false,
        }
        true
    }

    fn search_key(&mut self, event: &KeyEvent, func: Option<KeyFunction>) -> bool {
        match func {
            None => match event.text {
                Some(ch) if !ch.is_control() && !event.chord.modifiers.has_command() => {
                    self.isearch_key(ch);
                    true
                }
                _ => false,
            },
            Some(KeyFunction::Backspace) => {
                self.isearch_backspace();
                true
            }
            _ => false,
        }
    }

    /// Leave transient modes before running another command.
    fn cancel_all(&mut self) {
        self.completion.close();
        self.isearch_cancel();
        self.last_auto_insert = None;
    }

    fn universal_command(&mut self, func: KeyFunction, shift: bool) {
        match func {
            KeyFunction::Search => {
                self.completion.close();
                self.isearch_trigger();
                return;
            }
            KeyFunction::Abort | KeyFunction::CancelSelect => {
                self.escape();
                return;
            }
            _ => self.cancel_all(),
        }
        let motion = !matches!(
            func,
            KeyFunction::SelectMode
                | KeyFunction::SelectAll
                | KeyFunction::Copy
                | KeyFunction::Recenter
        );
        if motion {
            self.op(|view, _| view.track_shift(shift));
        }
        match func {
            KeyFunction::MoveUp => self.cursor_up(1),
            KeyFunction::MoveDown => self.cursor_down(1),
            KeyFunction::MoveRight => self.cursor_forward(1),
            KeyFunction::MoveLeft => self.cursor_backward(1),
            KeyFunction::WordRight => self.cursor_word_right(1),
            KeyFunction::WordLeft => self.cursor_word_left(1),
            KeyFunction::PageUp => self.page_up(),
            KeyFunction::PageDown => self.page_down(),
            KeyFunction::Home => self.cursor_line_start(),
            KeyFunction::End => self.cursor_line_end(),
            KeyFunction::DocHome => self.cursor_doc_start(),
            KeyFunction::DocEnd => self.cursor_doc_end(),
            KeyFunction::SelectMode => self.select_mode_toggle(),
            KeyFunction::SelectAll => self.select_all(),
            KeyFunction::Copy => {
                self.copy(true);
            }
            KeyFunction::Recenter => self.recenter(),
            _ => {}
        }
    }

    /// A shifted motion starts a selection; the first unshifted one drops it again.
    /// Selections made through select mode are left alone.
    fn track_shift(&mut self, shift: bool) {
        if shift {
            if !self.cursor.select_mode() {
                self.cursor.shift_select(true);
                self.shift_selecting = true;
            }
        } else if self.shift_selecting {
            self.shift_selecting = false;
            self.cursor.select_reset();
        } else if !self.cursor.select_mode() && self.cursor.has_selection() {
            self.cursor.select_reset();
        }
    }

    fn read_only_command(&mut self, func: KeyFunction) -> bool {
        self.cancel_all();
        match func {
            KeyFunction::FocusNext => self.cursor_next_link(),
            KeyFunction::FocusPrev => self.cursor_prev_link(),
            KeyFunction::Enter | KeyFunction::Accept => self.activate_link_at_cursor(),
            _ => false,
        }
    }

    fn edit_command(&mut self, event: &KeyEvent, func: KeyFunction) -> bool {
        let command = event.chord.modifiers.has_command();
        match func {
            KeyFunction::Backspace => {
                self.backspace(1);
                self.offer_complete(false);
            }
            KeyFunction::Delete => {
                self.cancel_all();
                self.delete_forward(1);
            }
            KeyFunction::Kill => {
                self.cancel_all();
                self.kill_line();
            }
            KeyFunction::Cut => {
                self.cancel_all();
                self.cut();
            }
            KeyFunction::Paste => {
                self.cancel_all();
                self.paste();
            }
            KeyFunction::Undo => {
                self.cancel_all();
                self.undo();
            }
            KeyFunction::Redo => {
                self.cancel_all();
                self.redo();
            }
            KeyFunction::Complete => {
                self.isearch_cancel();
                self.offer_complete(true);
            }
            KeyFunction::Enter if !command => {
                self.cancel_all();
                self.newline();
            }
            KeyFunction::FocusNext if !command => {
                self.cancel_all();
                self.tab();
            }
            KeyFunction::FocusPrev if !command => {
                self.cancel_all();
                self.unindent();
            }
            _ => {
                self.cancel_all();
                return false;
            }
        }
        true
    }

    fn insert_typed(&mut self, event: &KeyEvent) -> bool {
        let Some(ch) = event.text else {
            return false;
        };
        if ch.is_control() || event.chord.modifiers.has_command() {
            return false;
        }
        if self.options.read_only {
            return ch == ' ' && self.activate_link_at_cursor();
        }
        self.type_char(ch);
        true
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::buffer::TextBuffer;
    use crate::config::{EditorOptions, Theme};
    use crate::keymap::{Key, KeyEvent, Modifiers};
    use crate::position::{TextPosition, TextRegion};
    use crate::view::TextView;

    fn key(chord: &str) -> KeyEvent {
        KeyEvent::parse(chord).unwrap()
    }

    fn type_str(view: &mut TextView, s: &str) {
        for ch in s.chars() {
            assert!(view.handle_key(&KeyEvent::char(ch)));
        }
    }

    #[test]
    fn test_typing_and_shift_selection() {
        let buf = TextBuffer::shared("");
        let mut view = TextView::with_defaults(&buf);
        type_str(&mut view, "Hello world");
        assert_eq!(buf.borrow().text(), "Hello world");

        assert!(view.handle_key(&key("Shift+Control+LeftArrow")));
        assert_eq!(
            view.selection(),
            TextRegion::new(TextPosition::new(0, 6), TextPosition::new(0, 11))
        );
        assert!(view.handle_key(&key("DeleteBackspace")));
        assert_eq!(buf.borrow().text(), "Hello ");
    }

    #[test]
    fn test_control_keys_are_not_inserted() {
        let buf = TextBuffer::shared("abc");
        let mut view = TextView::with_defaults(&buf);
        let event = KeyEvent {
            chord: "Control+Q".parse().unwrap(),
            text: Some('q'),
        };
        assert!(!view.handle_key(&event));
        assert!(!view.handle_key(&KeyEvent::new(Key::F(5), Modifiers::NONE)));
        assert_eq!(buf.borrow().text(), "abc");
    }

    #[test]
    fn test_search_mode_swallows_text() {
        let buf = TextBuffer::shared("one two\ntwo");
        let mut view = TextView::with_defaults(&buf);
        assert!(view.handle_key(&key("Control+F")));
        type_str(&mut view, "two");
        assert_eq!(buf.borrow().text(), "one two\ntwo");
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 4));

        assert!(view.handle_key(&key("Control+F")));
        assert_eq!(view.cursor_pos(), TextPosition::new(1, 0));

        // Any other command leaves search mode where the cursor is.
        assert!(view.handle_key(&key("RightArrow")));
        assert!(!view.isearch().is_active());
        assert_eq!(view.cursor_pos(), TextPosition::new(1, 1));
    }

    #[test]
    fn test_escape_cancels_search_then_selection() {
        let buf = TextBuffer::shared("abc abc");
        let mut view = TextView::with_defaults(&buf);
        view.handle_key(&key("Control+F"));
        type_str(&mut view, "abc");
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 4));
        view.handle_key(&key("Escape"));
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 0));

        view.handle_key(&key("Control+A"));
        assert!(view.has_selection());
        view.handle_key(&key("Escape"));
        assert!(!view.has_selection());
    }

    #[test]
    fn test_read_only_allows_navigation_only() {
        let buf = TextBuffer::shared("abc\ndef");
        let opts = EditorOptions {
            read_only: true,
            ..EditorOptions::default()
        };
        let mut view = TextView::new(&buf, opts, Theme::default());
        assert!(!view.handle_key(&KeyEvent::char('x')));
        assert!(!view.handle_key(&key("DeleteForward")));
        assert!(view.handle_key(&key("DownArrow")));
        assert_eq!(view.cursor_pos(), TextPosition::new(1, 0));
        assert_eq!(buf.borrow().text(), "abc\ndef");
    }

    #[test]
    fn test_accept_is_left_to_the_host() {
        let buf = TextBuffer::shared("abc");
        let mut view = TextView::with_defaults(&buf);
        assert!(!view.handle_key(&key("Control+ReturnEnter")));
        assert_eq!(buf.borrow().text(), "abc");
    }

    #[test]
    fn test_emacs_map_and_overrides() {
        let buf = TextBuffer::shared("abc");
        let mut opts = EditorOptions {
            keymap: "emacs".into(),
            ..EditorOptions::default()
        };
        opts.key_overrides
            .insert("Control+J".into(), crate::keymap::KeyFunction::DocEnd);
        let mut view = TextView::new(&buf, opts, Theme::default());
        assert!(view.handle_key(&key("Control+F")));
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 1));
        assert!(view.handle_key(&key("Control+J")));
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 3));
    }
}
