//! Mouse input and link handling.

use crate::events::EditorEvent;
use crate::geometry::Point;
use crate::keymap::Modifiers;
use crate::position::{TextPosition, TextRegion};

use super::TextView;

impl TextView {
    /// A mouse button press at `point` (view coordinates) with the host's click count.
    ///
    /// A press on a link activates it. A double click selects the word under the pointer and
    /// a triple click the whole line. Shift extends the selection from the old cursor.
    pub fn mouse_press(&mut self, point: Point, clicks: u32, modifiers: Modifiers) -> bool {
        if self.shared().is_none() {
            return false;
        }
        self.sync();
        let pos = self.layout.pos_at_point(self.doc_point(point));
        if clicks <= 1 && !modifiers.shift {
            let target = self
                .layout
                .line(pos.line)
                .and_then(|line| line.link_at(pos.column))
                .map(|link| link.target.clone());
            if let Some(target) = target {
                self.activate_link(&target);
                return true;
            }
        }
        self.dragging = clicks <= 1;
        self.last_auto_insert = None;
        self.op(|view, shared| {
            view.completion.close();
            view.isearch_cancel();
            let buf = shared.borrow();
            match clicks {
                0 | 1 => {
                    view.cursor
                        .mouse_select(&buf, &view.layout, pos, modifiers.shift, false)
                }
                2 => {
                    view.cursor.place(&buf, &view.layout, pos);
                    view.cursor.select_word(&buf);
                    let start = view.cursor.selection().start;
                    view.cursor.place(&buf, &view.layout, start);
                }
                _ => {
                    view.cursor.place(&buf, &view.layout, pos);
                    let ln = view.cursor.pos().line;
                    let line = TextRegion::new(
                        TextPosition::new(ln, 0),
                        TextPosition::new(ln, buf.line_len(ln)),
                    );
                    view.cursor.set_selection(&buf, line);
                }
            }
        })
        .is_some()
    }

    /// Pointer motion with the button held after [`mouse_press`](Self::mouse_press).
    ///
    /// The first drag enters select mode anchored at the press position.
    pub fn mouse_drag(&mut self, point: Point) {
        if !self.dragging {
            return;
        }
        self.op(|view, shared| {
            if !view.cursor.select_mode() {
                view.cursor.select_mode_toggle();
                view.shift_selecting = true;
            }
            let pos = view.layout.pos_at_point(view.doc_point(point));
            let buf = shared.borrow();
            view.cursor.mouse_select(&buf, &view.layout, pos, false, true);
        });
    }

    /// `point` relative to the visible area, in document coordinates.
    fn doc_point(&self, point: Point) -> Point {
        let visible = self.viewport.visible_rect();
        Point::new(point.x + visible.x, point.y + visible.y)
    }

    /// The button was released.
    pub fn mouse_release(&mut self) {
        self.dragging = false;
    }

    /// Follow a link target. Position links (`#L12C3`) move the cursor; anything else is
    /// reported to subscribers as [`EditorEvent::LinkActivated`].
    pub fn activate_link(&mut self, target: &str) {
        if target.starts_with('#') {
            match target.parse::<TextPosition>() {
                Ok(pos) => {
                    tracing::debug!(target: "textview_core::view", view = self.id.get(), %pos, "position link");
                    self.select_reset();
                    self.set_cursor_show(pos);
                    return;
                }
                Err(e) => {
                    tracing::debug!(target: "textview_core::view", view = self.id.get(), error = %e, "not a position link");
                }
            }
        }
        tracing::debug!(target: "textview_core::view", view = self.id.get(), target, "link activated");
        self.emit(EditorEvent::LinkActivated(target.to_string()));
    }

    /// Activate the link under the cursor. Returns `false` if there is none.
    pub fn activate_link_at_cursor(&mut self) -> bool {
        self.sync();
        let pos = self.cursor.pos();
        let target = self
            .layout
            .line(pos.line)
            .and_then(|line| line.link_at(pos.column))
            .map(|link| link.target.clone());
        match target {
            Some(target) => {
                self.activate_link(&target);
                true
            }
            None => false,
        }
    }

    /// Move to the next link after the cursor and select it, wrapping at the end.
    pub fn cursor_next_link(&mut self) -> bool {
        self.sync();
        let links = self.link_regions();
        let pos = self.cursor.pos();
        let next = links
            .iter()
            .find(|r| r.start > pos)
            .or_else(|| links.first())
            .copied();
        self.select_link(next)
    }

    /// Move to the previous link before the cursor and select it, wrapping at the start.
    pub fn cursor_prev_link(&mut self) -> bool {
        self.sync();
        let links = self.link_regions();
        let pos = self.cursor.pos();
        let prev = links
            .iter()
            .rev()
            .find(|r| r.start < pos)
            .or_else(|| links.last())
            .copied();
        self.select_link(prev)
    }

    fn link_regions(&self) -> Vec<TextRegion> {
        (0..self.layout.line_count())
            .filter_map(|ln| self.layout.line(ln).map(|line| (ln, line)))
            .flat_map(|(ln, line)| {
                line.links.iter().map(move |l| {
                    TextRegion::new(TextPosition::new(ln, l.start), TextPosition::new(ln, l.end))
                })
            })
            .collect()
    }

    fn select_link(&mut self, region: Option<TextRegion>) -> bool {
        let Some(region) = region else {
            return false;
        };
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.select_reset();
            view.cursor.place(&buf, &view.layout, region.start);
            view.cursor.set_selection(&buf, region);
            drop(buf);
            view.scroll_cursor_to_center_if_hidden();
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use textview_lang::LanguageConfig;

    use crate::buffer::TextBuffer;
    use crate::config::{EditorOptions, Theme};
    use crate::events::EditorEvent;
    use crate::highlight::{HighlightError, LexerProvider, Token, Tokenizer};
    use crate::keymap::{KeyEvent, Modifiers};
    use crate::position::{TextPosition, TextRegion};
    use crate::view::TextView;

    /// Words starting with `#` or `http` become links.
    struct LinkWords;

    impl Tokenizer for LinkWords {
        fn language(&self) -> &str {
            "notes"
        }

        fn tokenize_line(&mut self, line: &str) -> Result<Vec<Token>, HighlightError> {
            let mut tokens = Vec::new();
            let mut start = 0;
            for word in line.split(' ') {
                if word.starts_with('#') || word.starts_with("http") {
                    tokens.push(Token::link(start, start + word.len(), word));
                }
                start += word.len() + 1;
            }
            Ok(tokens)
        }
    }

    impl LexerProvider for LinkWords {
        fn lexer(&self, language: &str) -> Option<Box<dyn Tokenizer>> {
            (language == "notes").then(|| Box::new(LinkWords) as Box<dyn Tokenizer>)
        }
    }

    fn linked_view(text: &str, read_only: bool) -> (crate::buffer::SharedBuffer, TextView) {
        let buf = TextBuffer::shared(text);
        buf.borrow_mut()
            .set_language(Some(LanguageConfig::new("notes", ["notes"])));
        let opts = EditorOptions {
            read_only,
            ..EditorOptions::default()
        };
        let mut view = TextView::new(&buf, opts, Theme::default());
        view.resize(400.0, 160.0);
        view.set_lexer_provider(Box::new(LinkWords));
        (buf, view)
    }

    #[test]
    fn test_press_places_cursor_and_shift_extends() {
        let buf = TextBuffer::shared("hello world\nsecond line");
        let mut view = TextView::with_defaults(&buf);
        view.resize(400.0, 160.0);
        let p = view.layout().char_start_pos(TextPosition::new(1, 3));
        assert!(view.mouse_press(p, 1, Modifiers::NONE));
        assert_eq!(view.cursor_pos(), TextPosition::new(1, 3));
        view.mouse_release();

        let p = view.layout().char_start_pos(TextPosition::new(0, 6));
        view.mouse_press(p, 1, Modifiers::SHIFT);
        assert_eq!(
            view.selection(),
            TextRegion::new(TextPosition::new(0, 6), TextPosition::new(1, 3))
        );

        // A plain press clears the selection.
        let p = view.layout().char_start_pos(TextPosition::new(0, 1));
        view.mouse_press(p, 1, Modifiers::NONE);
        assert!(!view.has_selection());
    }

    #[test]
    fn test_drag_extends_selection() {
        let buf = TextBuffer::shared("abcdef");
        let mut view = TextView::with_defaults(&buf);
        view.resize(400.0, 160.0);
        let start = view.layout().char_start_pos(TextPosition::new(0, 1));
        let end = view.layout().char_start_pos(TextPosition::new(0, 4));
        view.mouse_press(start, 1, Modifiers::NONE);
        view.mouse_drag(end);
        view.mouse_release();
        assert_eq!(view.selected_text().as_deref(), Some("bcd"));
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 4));

        // The next plain arrow key drops a dragged selection.
        view.handle_key(&KeyEvent::parse("LeftArrow").unwrap());
        assert!(!view.has_selection());
    }

    #[test]
    fn test_double_and_triple_click() {
        let buf = TextBuffer::shared("one two three");
        let mut view = TextView::with_defaults(&buf);
        view.resize(400.0, 160.0);
        let p = view.layout().char_start_pos(TextPosition::new(0, 5));
        view.mouse_press(p, 2, Modifiers::NONE);
        assert_eq!(view.selected_text().as_deref(), Some("two"));
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 4));
        view.mouse_press(p, 3, Modifiers::NONE);
        assert_eq!(view.selected_text().as_deref(), Some("one two three"));
    }

    #[test]
    fn test_press_on_link_reports_it() {
        let (_buf, mut view) = linked_view("see http://x.io now", false);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        view.subscribe(move |e: &EditorEvent| {
            if let EditorEvent::LinkActivated(target) = e {
                sink.borrow_mut().push(target.clone());
            }
        });
        let p = view.layout().char_start_pos(TextPosition::new(0, 6));
        assert!(view.mouse_press(p, 1, Modifiers::NONE));
        assert_eq!(*seen.borrow(), vec!["http://x.io".to_string()]);
        assert_eq!(view.cursor_pos(), TextPosition::ZERO);
    }

    #[test]
    fn test_position_link_moves_cursor() {
        let (_buf, mut view) = linked_view("jump #L3C2\nb\nccc", false);
        view.activate_link("#L3C2");
        assert_eq!(view.cursor_pos(), TextPosition::new(2, 2));
    }

    #[test]
    fn test_read_only_tab_walks_links() {
        let (_buf, mut view) = linked_view("a http://one b\nhttp://two", true);
        let tab = KeyEvent::parse("Tab").unwrap();
        let back = KeyEvent::parse("Shift+Tab").unwrap();

        assert!(view.handle_key(&tab));
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 2));
        assert_eq!(view.selected_text().as_deref(), Some("http://one"));
        assert!(view.handle_key(&tab));
        assert_eq!(view.cursor_pos(), TextPosition::new(1, 0));
        assert!(view.handle_key(&tab));
        assert_eq!(view.cursor_pos(), TextPosition::new(0, 2));
        assert!(view.handle_key(&back));
        assert_eq!(view.cursor_pos(), TextPosition::new(1, 0));

        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        view.subscribe(move |e: &EditorEvent| {
            if let EditorEvent::LinkActivated(target) = e {
                *sink.borrow_mut() = Some(target.clone());
            }
        });
        assert!(view.handle_key(&KeyEvent::char(' ')));
        assert_eq!(seen.borrow().as_deref(), Some("http://two"));
    }

    #[test]
    fn test_no_links_is_unhandled() {
        let (_buf, mut view) = linked_view("plain text", true);
        assert!(!view.cursor_next_link());
        assert!(!view.activate_link_at_cursor());
    }
}
