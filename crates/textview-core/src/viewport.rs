//! The scrolling container contract and a default implementation.
//!
//! The view keeps all geometry in document coordinates (origin at the top-left of the first
//! line, gutter included). A [`ViewportScroller`] knows which part of the document is visible
//! and moves that window; the host's scroll bars read it back.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dim {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

/// Contract of the scrollable container that hosts a view.
pub trait ViewportScroller {
    /// The visible part of the document, in document coordinates.
    fn visible_rect(&self) -> Rect;

    /// Set the viewport size and the full content size.
    fn set_size(&mut self, viewport: Size, content: Size);

    /// Scroll the minimum amount that makes `target` visible. Returns true if it scrolled.
    fn scroll_to_box(&mut self, target: Rect) -> bool;

    /// Scroll so coordinate `pos` along `dim` is at the start of the viewport.
    fn scroll_dim_to_start(&mut self, dim: Dim, pos: f32) -> bool;

    /// Scroll so coordinate `pos` along `dim` is at the end of the viewport.
    fn scroll_dim_to_end(&mut self, dim: Dim, pos: f32) -> bool;

    /// Scroll so coordinate `pos` along `dim` is in the middle of the viewport.
    fn scroll_dim_to_center(&mut self, dim: Dim, pos: f32) -> bool;
}

/// A plain scroll area: a viewport sliding over the content, clamped to its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollArea {
    offset: Point,
    viewport: Size,
    content: Size,
}

impl ScrollArea {
    /// A scroll area with the given viewport size and no content.
    pub fn new(viewport: Size) -> Self {
        Self {
            offset: Point::default(),
            viewport,
            content: Size::default(),
        }
    }

    /// Current scroll offset.
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Viewport size.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Content size.
    pub fn content(&self) -> Size {
        self.content
    }

    fn max_offset(&self, dim: Dim) -> f32 {
        match dim {
            Dim::X => (self.content.width - self.viewport.width).max(0.0),
            Dim::Y => (self.content.height - self.viewport.height).max(0.0),
        }
    }

    fn extent(&self, dim: Dim) -> f32 {
        match dim {
            Dim::X => self.viewport.width,
            Dim::Y => self.viewport.height,
        }
    }

    /// Set the offset along `dim`, clamped. Returns true if it changed.
    pub fn set_offset(&mut self, dim: Dim, value: f32) -> bool {
        let value = value.clamp(0.0, self.max_offset(dim));
        let slot = match dim {
            Dim::X => &mut self.offset.x,
            Dim::Y => &mut self.offset.y,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// Scroll by a delta, as a wheel would.
    pub fn scroll_by(&mut self, dx: f32, dy: f32) -> bool {
        let x = self.set_offset(Dim::X, self.offset.x + dx);
        let y = self.set_offset(Dim::Y, self.offset.y + dy);
        x || y
    }
}

impl ViewportScroller for ScrollArea {
    fn visible_rect(&self) -> Rect {
        Rect::new(
            self.offset.x,
            self.offset.y,
            self.viewport.width,
            self.viewport.height,
        )
    }

    fn set_size(&mut self, viewport: Size, content: Size) {
        self.viewport = viewport;
        self.content = content;
        self.set_offset(Dim::X, self.offset.x);
        self.set_offset(Dim::Y, self.offset.y);
    }

    fn scroll_to_box(&mut self, target: Rect) -> bool {
        let vis = self.visible_rect();
        let mut changed = false;
        if target.y < vis.y {
            changed |= self.set_offset(Dim::Y, target.y);
        } else if target.bottom() > vis.bottom() {
            changed |= self.set_offset(Dim::Y, target.bottom() - vis.height);
        }
        if target.x < vis.x {
            changed |= self.set_offset(Dim::X, target.x);
        } else if target.right() > vis.right() {
            changed |= self.set_offset(Dim::X, target.right() - vis.width);
        }
        changed
    }

    fn scroll_dim_to_start(&mut self, dim: Dim, pos: f32) -> bool {
        self.set_offset(dim, pos)
    }

    fn scroll_dim_to_end(&mut self, dim: Dim, pos: f32) -> bool {
        self.set_offset(dim, pos - self.extent(dim))
    }

    fn scroll_dim_to_center(&mut self, dim: Dim, pos: f32) -> bool {
        self.set_offset(dim, pos - self.extent(dim) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> ScrollArea {
        let mut a = ScrollArea::new(Size::new(100.0, 50.0));
        a.set_size(Size::new(100.0, 50.0), Size::new(300.0, 500.0));
        a
    }

    #[test]
    fn test_scroll_to_box_minimal_moves() {
        let mut a = area();
        assert!(!a.scroll_to_box(Rect::new(0.0, 10.0, 5.0, 16.0)));
        assert!(a.scroll_to_box(Rect::new(0.0, 100.0, 5.0, 16.0)));
        assert_eq!(a.offset().y, 66.0);
        assert!(a.scroll_to_box(Rect::new(0.0, 20.0, 5.0, 16.0)));
        assert_eq!(a.offset().y, 20.0);
        assert!(a.scroll_to_box(Rect::new(150.0, 20.0, 8.0, 16.0)));
        assert_eq!(a.offset().x, 58.0);
    }

    #[test]
    fn test_scroll_dims_clamp_to_content() {
        let mut a = area();
        a.scroll_dim_to_center(Dim::Y, 100.0);
        assert_eq!(a.offset().y, 75.0);
        a.scroll_dim_to_end(Dim::Y, 10.0);
        assert_eq!(a.offset().y, 0.0);
        a.scroll_dim_to_start(Dim::Y, 1000.0);
        assert_eq!(a.offset().y, 450.0);
    }

    #[test]
    fn test_shrinking_content_reclamps() {
        let mut a = area();
        a.scroll_dim_to_start(Dim::Y, 400.0);
        a.set_size(Size::new(100.0, 50.0), Size::new(100.0, 80.0));
        assert_eq!(a.offset().y, 30.0);
        assert!(!a.scroll_by(0.0, 100.0));
    }
}
