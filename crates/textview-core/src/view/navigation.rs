//! Cursor motion, selection and scrolling.

use crate::geometry::Rect;
use crate::position::{TextPosition, TextRegion};
use crate::viewport::Dim;

use super::TextView;

impl TextView {
    /// Place the cursor at `pos` (clamped). The selection is extended in select mode.
    pub fn set_cursor(&mut self, pos: TextPosition) {
        self.last_auto_insert = None;
        self.op(|view, shared| {
            let buf = shared.borrow();
            let origin = view.cursor.pos();
            view.cursor.place(&buf, &view.layout, pos);
            view.cursor.cursor_select(origin);
        });
    }

    /// Place the cursor at `pos` and center it if it ended up outside the viewport.
    pub fn set_cursor_show(&mut self, pos: TextPosition) {
        self.last_auto_insert = None;
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.place(&buf, &view.layout, pos);
            drop(buf);
            view.scroll_cursor_to_center_if_hidden();
        });
    }

    /// Move forward `steps` characters.
    pub fn cursor_forward(&mut self, steps: usize) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.move_forward(&buf, &view.layout, steps);
        });
    }

    /// Move backward `steps` characters.
    pub fn cursor_backward(&mut self, steps: usize) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.move_backward(&buf, &view.layout, steps);
        });
    }

    /// Move down `steps` visual lines.
    pub fn cursor_down(&mut self, steps: usize) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.move_down(&buf, &view.layout, steps);
        });
    }

    /// Move up `steps` visual lines.
    pub fn cursor_up(&mut self, steps: usize) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.move_up(&buf, &view.layout, steps);
        });
    }

    /// Move forward `steps` words.
    pub fn cursor_word_right(&mut self, steps: usize) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.move_word_right(&buf, &view.layout, steps);
        });
    }

    /// Move backward `steps` words.
    pub fn cursor_word_left(&mut self, steps: usize) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.move_word_left(&buf, &view.layout, steps);
        });
    }

    /// Move to the start of the line.
    pub fn cursor_line_start(&mut self) {
        self.op(|view, shared| {
            view.cursor.move_to_line_start(&shared.borrow());
            view.viewport.scroll_dim_to_start(Dim::X, 0.0);
        });
    }

    /// Move to the end of the line.
    pub fn cursor_line_end(&mut self) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.move_to_line_end(&buf, &view.layout);
        });
    }

    /// Move to the start of the document and scroll to the top.
    pub fn cursor_doc_start(&mut self) {
        self.op(|view, shared| {
            view.cursor.move_to_doc_start(&shared.borrow());
            view.scroll_cursor_to_top();
        });
    }

    /// Move to the end of the document and scroll to the bottom.
    pub fn cursor_doc_end(&mut self) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            view.cursor.move_to_doc_end(&buf, &view.layout);
            drop(buf);
            view.scroll_cursor_to_bottom();
        });
    }

    /// Move down one page: to the last visible line, or a viewport height further when the
    /// cursor is already there. The cursor line is then scrolled to the top.
    pub fn page_down(&mut self) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            let cur = view.cursor.pos().line;
            let last = view.last_visible_line();
            let target = if last > cur {
                last
            } else {
                cur + view.visible_line_count()
            };
            view.cursor.move_to_line_keep_col(&buf, target);
            drop(buf);
            view.scroll_cursor_to_top();
        });
    }

    /// Move up one page; the mirror of [`page_down`](Self::page_down).
    pub fn page_up(&mut self) {
        self.op(|view, shared| {
            let buf = shared.borrow();
            let cur = view.cursor.pos().line;
            let first = view.first_visible_line();
            let target = if first < cur {
                first
            } else {
                cur.saturating_sub(view.visible_line_count())
            };
            view.cursor.move_to_line_keep_col(&buf, target);
            drop(buf);
            view.scroll_cursor_to_bottom();
        });
    }

    /// Jump to the start of line `ln` (0-based, clamped) and center it if hidden.
    pub fn jump_to_line(&mut self, ln: usize) {
        self.op(|view, shared| {
            view.cursor.move_to_line(&shared.borrow(), ln);
            view.scroll_cursor_to_center_if_hidden();
        });
    }

    /// Cycle the cursor line through the center, top and bottom of the viewport.
    pub fn recenter(&mut self) {
        self.op(|view, _| {
            let cur = (view.last_recenter + 1) % 3;
            match cur {
                0 => view.scroll_cursor_to_bottom(),
                1 => view.scroll_cursor_to_center(),
                _ => view.scroll_cursor_to_top(),
            };
            view.last_recenter = cur;
        });
    }

    /// Toggle select mode.
    pub fn select_mode_toggle(&mut self) {
        self.op(|view, _| {
            view.shift_selecting = false;
            view.cursor.select_mode_toggle();
        });
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        self.op(|view, shared| view.cursor.select_all(&shared.borrow()));
    }

    /// Select the word under the cursor.
    pub fn select_word(&mut self) {
        self.op(|view, shared| view.cursor.select_word(&shared.borrow()));
    }

    /// Clear the selection and leave select mode.
    pub fn select_reset(&mut self) {
        self.op(|view, _| view.cursor.select_reset());
    }

    /// Select `region` (clamped).
    pub fn set_selection(&mut self, region: TextRegion) {
        self.last_auto_insert = None;
        self.op(|view, shared| view.cursor.set_selection(&shared.borrow(), region));
    }

    /// The selected text, if anything is selected.
    pub fn selected_text(&self) -> Option<String> {
        let region = self.cursor.selection();
        if !region.is_active() {
            return None;
        }
        let shared = self.buffer.upgrade()?;
        let text = shared.borrow().region_text(region.start, region.end);
        text
    }

    /// First line intersecting the viewport.
    pub fn first_visible_line(&self) -> usize {
        self.layout.line_at_y(self.viewport.visible_rect().y)
    }

    /// Last line intersecting the viewport.
    pub fn last_visible_line(&self) -> usize {
        let vis = self.viewport.visible_rect();
        self.layout.line_at_y(vis.bottom() - 1.0)
    }

    fn visible_line_count(&self) -> usize {
        let lh = self.theme.metrics.line_height;
        ((self.viewport.visible_rect().height / lh).floor() as usize).max(1)
    }

    /// Returns true if the character box at the cursor is entirely visible.
    pub fn cursor_is_visible(&self) -> bool {
        self.viewport.visible_rect().contains_rect(&self.cursor_bbox())
    }

    pub(super) fn note_scrolled(&mut self, scrolled: bool) {
        if scrolled {
            self.repaint.full();
        }
    }

    /// Scroll the minimum amount that makes the cursor visible.
    pub(super) fn scroll_cursor_in_view(&mut self) {
        let target = self.cursor_bbox();
        let scrolled = self.viewport.scroll_to_box(target);
        self.note_scrolled(scrolled);
    }

    pub(super) fn scroll_cursor_to_center_if_hidden(&mut self) {
        if !self.cursor_is_visible() {
            self.scroll_cursor_to_center();
        }
    }

    fn scroll_cursor_horizontally(&mut self, bbox: Rect) {
        let scrolled = self.viewport.scroll_to_box(Rect::new(
            bbox.x,
            self.viewport.visible_rect().y,
            bbox.width,
            0.0,
        ));
        self.note_scrolled(scrolled);
    }

    pub(super) fn scroll_cursor_to_center(&mut self) {
        let bbox = self.cursor_bbox();
        let scrolled = self
            .viewport
            .scroll_dim_to_center(Dim::Y, bbox.y + bbox.height / 2.0);
        self.note_scrolled(scrolled);
        self.scroll_cursor_horizontally(bbox);
    }

    pub(super) fn scroll_cursor_to_top(&mut self) {
        let bbox = self.cursor_bbox();
        let scrolled = self.viewport.scroll_dim_to_start(Dim::Y, bbox.y);
        self.note_scrolled(scrolled);
        self.scroll_cursor_horizontally(bbox);
    }

    pub(super) fn scroll_cursor_to_bottom(&mut self) {
        let bbox = self.cursor_bbox();
        let scrolled = self.viewport.scroll_dim_to_end(Dim::Y, bbox.bottom());
        self.note_scrolled(scrolled);
        self.scroll_cursor_horizontally(bbox);
    }
}

#[cfg(test)]
mod tests {
    use crate::buffer::TextBuffer;
    use crate::position::{TextPosition, TextRegion};
    use crate::view::TextView;

    fn numbered(n: usize) -> String {
        (0..n)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_page_down_moves_to_last_visible_then_scrolls() {
        let buf = TextBuffer::shared(&numbered(100));
        let mut view = TextView::with_defaults(&buf);
        view.resize(400.0, 160.0);
        assert_eq!(view.last_visible_line(), 9);

        view.page_down();
        assert_eq!(view.cursor_pos().line, 9);
        assert_eq!(view.first_visible_line(), 9);

        view.page_down();
        assert_eq!(view.cursor_pos().line, 18);
    }

    #[test]
    fn test_page_up_mirrors_page_down() {
        let buf = TextBuffer::shared(&numbered(100));
        let mut view = TextView::with_defaults(&buf);
        view.resize(400.0, 160.0);
        view.cursor_doc_end();
        assert_eq!(view.cursor_pos().line, 99);
        assert_eq!(view.last_visible_line(), 99);

        view.page_up();
        assert_eq!(view.cursor_pos().line, 90);
        assert_eq!(view.last_visible_line(), 90);
    }

    #[test]
    fn test_jump_to_line_centers_hidden_cursor() {
        let buf = TextBuffer::shared(&numbered(100));
        let mut view = TextView::with_defaults(&buf);
        view.resize(400.0, 160.0);
        view.jump_to_line(50);
        assert_eq!(view.cursor_pos(), TextPosition::new(50, 0));
        assert!(view.cursor_is_visible());
        let first = view.first_visible_line();
        assert!(first > 40 && first < 50, "first visible line {first}");
    }

    #[test]
    fn test_recenter_cycles_center_top_bottom() {
        let buf = TextBuffer::shared(&numbered(100));
        let mut view = TextView::with_defaults(&buf);
        view.resize(400.0, 160.0);
        view.jump_to_line(50);

        view.recenter();
        assert!(view.first_visible_line() < 50 && view.last_visible_line() > 50);
        view.recenter();
        assert_eq!(view.first_visible_line(), 50);
        view.recenter();
        assert_eq!(view.last_visible_line(), 50);
    }

    #[test]
    fn test_select_mode_extends_with_motion() {
        let buf = TextBuffer::shared("hello world");
        let mut view = TextView::with_defaults(&buf);
        view.select_mode_toggle();
        view.cursor_forward(5);
        assert_eq!(
            view.selection(),
            TextRegion::new(TextPosition::new(0, 0), TextPosition::new(0, 5))
        );
        assert_eq!(view.selected_text().as_deref(), Some("hello"));
        view.select_reset();
        assert!(!view.has_selection());
        assert_eq!(view.selected_text(), None);
    }
}
