//! Line layout: soft wrapping, per-line render cache and pixel geometry.
//!
//! Text is measured on a monospace cell grid. Character widths follow UAX #11 (wide CJK and
//! emoji take two cells, combining marks zero) and `'\t'` advances to the next tab stop.
//! Cells are converted to pixels with the [`FontMetrics`] of the view.
//!
//! [`LayoutEngine`] owns one [`LineRender`] per logical buffer line plus the vertical offset
//! of each line. It is rebuilt by [`LayoutEngine::layout_all`] and patched by
//! [`LayoutEngine::layout_range`] after small edits; multi-line edits first splice the cache
//! with [`LayoutEngine::insert_lines`] / [`LayoutEngine::delete_lines`]. After either pass
//! returns (and, when `layout_range` asks for it, `layout_all` has been run) the cache has
//! exactly one entry per buffer line and offsets are non-decreasing.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::buffer::TextBuffer;
use crate::geometry::{Point, Size};
use crate::highlight::{HighlightAdapter, LineMarkup, LinkSpan, StyledRun};
use crate::position::TextPosition;

/// Default tab width (in cells) used when a caller does not specify a tab width.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Soft wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// No soft wrapping (each logical line is a single visual span).
    None,
    /// Wrap at character boundaries.
    Char,
    /// Prefer wrapping at word boundaries (whitespace), falling back to character wrap.
    #[default]
    Word,
}

/// Wrap point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapPoint {
    /// Character index where wrapping occurs (within the logical line)
    pub char_index: usize,
    /// Byte offset where wrapping occurs (within the logical line)
    pub byte_offset: usize,
}

/// Calculate visual width of a character (based on UAX #11)
///
/// Return value:
/// - 1: Narrow character (ASCII, etc.)
/// - 2: Wide character (CJK, fullwidth, etc.)
/// - 0: Zero-width character (combining characters, etc.)
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Calculate visual width (in cells) for a character at a specific cell offset within the line.
///
/// For `'\t'`, width advances to the next tab stop based on `tab_width`.
pub fn cell_width_at(ch: char, cell_offset_in_line: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        let rem = cell_offset_in_line % tab_width;
        tab_width - rem
    } else {
        char_width(ch)
    }
}

/// Calculate total visual width of a string, interpreting `'\t'` using `tab_width`.
pub fn str_width(s: &str, tab_width: usize) -> usize {
    let mut x = 0usize;
    for ch in s.chars() {
        x = x.saturating_add(cell_width_at(ch, x, tab_width));
    }
    x
}

/// Calculate wrap points for `text` at `viewport_width` cells.
///
/// A `viewport_width` of 0 or [`WrapMode::None`] disables wrapping.
pub fn calculate_wrap_points(
    text: &str,
    viewport_width: usize,
    tab_width: usize,
    wrap_mode: WrapMode,
) -> Vec<WrapPoint> {
    if viewport_width == 0 {
        return Vec::new();
    }
    match wrap_mode {
        WrapMode::None => Vec::new(),
        WrapMode::Char => wrap_points_char(text, viewport_width, tab_width),
        WrapMode::Word => wrap_points_word(text, viewport_width, tab_width),
    }
}

fn wrap_points_char(text: &str, viewport_width: usize, tab_width: usize) -> Vec<WrapPoint> {
    let mut wrap_points = Vec::new();
    let mut x_in_segment = 0usize;
    let mut x_in_line = 0usize;

    for (char_index, (byte_offset, ch)) in text.char_indices().enumerate() {
        let ch_width = cell_width_at(ch, x_in_line, tab_width);

        // A double-width character that does not fit moves to the next span intact.
        if x_in_segment + ch_width > viewport_width && x_in_segment > 0 {
            wrap_points.push(WrapPoint {
                char_index,
                byte_offset,
            });
            x_in_segment = 0;
        }

        x_in_segment = x_in_segment.saturating_add(ch_width);
        x_in_line = x_in_line.saturating_add(ch_width);

        if x_in_segment >= viewport_width && byte_offset + ch.len_utf8() < text.len() {
            wrap_points.push(WrapPoint {
                char_index: char_index + 1,
                byte_offset: byte_offset + ch.len_utf8(),
            });
            x_in_segment = 0;
        }
    }

    wrap_points
}

fn wrap_points_word(text: &str, viewport_width: usize, tab_width: usize) -> Vec<WrapPoint> {
    let mut wrap_points = Vec::new();

    let mut segment_start_char = 0usize;
    let mut segment_start_x_in_line = 0usize;
    let mut last_break: Option<(usize, usize, usize)> = None; // (char_index, byte_offset, x_in_line)

    let mut x_in_line = 0usize;

    for (char_index, (byte_offset, ch)) in text.char_indices().enumerate() {
        let ch_width = cell_width_at(ch, x_in_line, tab_width);

        // Trailing whitespace may hang past the edge; it is where the line breaks anyway.
        if !ch.is_whitespace() {
            loop {
                let x_in_segment = x_in_line.saturating_sub(segment_start_x_in_line);
                if x_in_segment.saturating_add(ch_width) <= viewport_width {
                    break;
                }

                if let Some((break_char, break_byte, break_x)) = last_break
                    && break_char > segment_start_char
                {
                    wrap_points.push(WrapPoint {
                        char_index: break_char,
                        byte_offset: break_byte,
                    });
                    segment_start_char = break_char;
                    segment_start_x_in_line = break_x;
                    last_break = None;
                    continue;
                }

                if char_index > segment_start_char {
                    // Fallback: wrap at the current character.
                    wrap_points.push(WrapPoint {
                        char_index,
                        byte_offset,
                    });
                    segment_start_char = char_index;
                    segment_start_x_in_line = x_in_line;
                    last_break = None;
                }
                break;
            }
        }

        x_in_line = x_in_line.saturating_add(ch_width);

        if ch.is_whitespace() {
            last_break = Some((char_index + 1, byte_offset + ch.len_utf8(), x_in_line));
        }
    }

    wrap_points
}

/// Width of the line-number gutter in pixels: room for at least three digits plus margin.
pub fn line_number_gutter_width(line_count: usize, char_width: f32) -> f32 {
    let digits = line_count.max(1).to_string().len();
    (digits.max(3) + 3) as f32 * char_width
}

/// Font measurements of a view, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontMetrics {
    /// Advance of one cell.
    pub char_width: f32,
    /// Height of one visual span.
    pub line_height: f32,
    /// Ascent plus descent of the font.
    pub font_height: f32,
    /// Descent below the baseline.
    pub descent: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 16.0,
            font_height: 14.0,
            descent: 3.0,
        }
    }
}

/// One on-screen wrapped segment of a logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualSpan {
    /// First column of the span.
    pub start: usize,
    /// Column just past the span.
    pub end: usize,
    /// Cell offset of each column boundary relative to the span start; `end - start + 1`
    /// entries.
    pub cell_x: Vec<usize>,
    /// Width of the span in cells.
    pub width_cells: usize,
}

impl VisualSpan {
    /// Number of characters in the span.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` for a span without characters (an empty line).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Cell offset of rune `ri` within the span (clamped to the span end).
    pub fn x_of(&self, ri: usize) -> usize {
        self.cell_x
            .get(ri)
            .or(self.cell_x.last())
            .copied()
            .unwrap_or(0)
    }
}

/// Cached render state of one logical line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRender {
    /// Highlighted runs.
    pub markup: Vec<StyledRun>,
    /// `false` when the line renders as plain text.
    pub has_markup: bool,
    /// Wrapped visual spans (at least one).
    pub spans: Vec<VisualSpan>,
    /// Activatable links.
    pub links: Vec<LinkSpan>,
    /// Pixel size of the line (without gutter).
    pub size: Size,
    /// Length of the line in characters.
    pub char_len: usize,
    /// `false` for a freshly spliced placeholder that has not been laid out yet.
    pub laid: bool,
}

impl LineRender {
    /// A not-yet-laid placeholder.
    pub fn blank() -> Self {
        Self {
            markup: Vec::new(),
            has_markup: false,
            spans: Vec::new(),
            links: Vec::new(),
            size: Size::default(),
            char_len: 0,
            laid: false,
        }
    }

    /// Link covering `column`, if any.
    pub fn link_at(&self, column: usize) -> Option<&LinkSpan> {
        self.links.iter().find(|l| l.contains(column))
    }
}

/// Owns the per-line render cache and pixel geometry of one view.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    metrics: FontMetrics,
    tab_width: usize,
    wrap_mode: WrapMode,
    line_numbers: bool,
    view_width: f32,
    gutter: f32,
    wrap_cells: usize,
    lines: Vec<LineRender>,
    offsets: Vec<f32>,
    total: Size,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(FontMetrics::default())
    }
}

impl LayoutEngine {
    /// Create an engine with no lines laid out.
    pub fn new(metrics: FontMetrics) -> Self {
        Self {
            metrics,
            tab_width: DEFAULT_TAB_WIDTH,
            wrap_mode: WrapMode::default(),
            line_numbers: false,
            view_width: 0.0,
            gutter: 0.0,
            wrap_cells: 0,
            lines: Vec::new(),
            offsets: Vec::new(),
            total: Size::default(),
        }
    }

    /// Font metrics.
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Replace the font metrics. Returns `true` if they changed (a full layout is then due).
    pub fn set_metrics(&mut self, metrics: FontMetrics) -> bool {
        let changed = self.metrics != metrics;
        self.metrics = metrics;
        changed
    }

    /// Tab width (in cells).
    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// Set tab width. Returns `true` if it changed (a full layout is then due).
    pub fn set_tab_width(&mut self, tab_width: usize) -> bool {
        let tab_width = tab_width.max(1);
        let changed = self.tab_width != tab_width;
        self.tab_width = tab_width;
        changed
    }

    /// Soft wrapping mode.
    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    /// Set wrap mode. Returns `true` if it changed (a full layout is then due).
    pub fn set_wrap_mode(&mut self, wrap_mode: WrapMode) -> bool {
        let changed = self.wrap_mode != wrap_mode;
        self.wrap_mode = wrap_mode;
        changed
    }

    /// Returns `true` if the line-number gutter is shown.
    pub fn line_numbers(&self) -> bool {
        self.line_numbers
    }

    /// Show or hide the line-number gutter. Returns `true` if it changed.
    pub fn set_line_numbers(&mut self, on: bool) -> bool {
        let changed = self.line_numbers != on;
        self.line_numbers = on;
        changed
    }

    /// Width last passed to [`layout_all`](Self::layout_all).
    pub fn view_width(&self) -> f32 {
        self.view_width
    }

    /// Width of the line-number gutter in pixels (0 when hidden).
    pub fn gutter_width(&self) -> f32 {
        self.gutter
    }

    /// Wrap width in cells (0 = no wrapping).
    pub fn wrap_cells(&self) -> usize {
        self.wrap_cells
    }

    fn gutter_for(&self, line_count: usize) -> f32 {
        if self.line_numbers {
            line_number_gutter_width(line_count, self.metrics.char_width)
        } else {
            0.0
        }
    }

    fn wrap_cells_for(&self, view_width: f32, gutter: f32) -> usize {
        if self.wrap_mode == WrapMode::None || self.metrics.char_width <= 0.0 {
            return 0;
        }
        let avail = view_width - gutter;
        if avail <= 0.0 {
            return 0;
        }
        ((avail / self.metrics.char_width).floor() as usize).max(1)
    }

    /// Full rebuild of the cache for `buffer` at `view_width` pixels. Returns the total
    /// content size.
    ///
    /// The whole text goes through the highlighter in one pass; a highlighter error degrades
    /// every line to plain text.
    pub fn layout_all(
        &mut self,
        buffer: &TextBuffer,
        adapter: &mut HighlightAdapter,
        view_width: f32,
    ) -> Size {
        let texts: Vec<String> = buffer.lines().collect();
        self.view_width = view_width.max(0.0);
        self.gutter = self.gutter_for(texts.len());
        self.wrap_cells = self.wrap_cells_for(self.view_width, self.gutter);

        let markup = match adapter.markup_whole(&texts) {
            Ok(markup) => markup,
            Err(err) => {
                tracing::warn!(target: "textview_core::layout", %err, "highlighting failed; rendering plain text");
                vec![LineMarkup::default(); texts.len()]
            }
        };

        self.lines = texts
            .iter()
            .zip(markup)
            .map(|(text, markup)| self.render_line(text, markup))
            .collect();
        self.offsets = vec![0.0; self.lines.len()];
        self.recompute_offsets(0);
        self.total.width = self.max_line_width();

        tracing::debug!(
            target: "textview_core::layout",
            lines = self.lines.len(),
            wrap_cells = self.wrap_cells,
            width = self.total.width,
            height = self.total.height,
            "full layout"
        );
        self.total
    }

    /// Re-lay lines `st..=ed` after an edit. Returns `true` when the caller must run
    /// [`layout_all`](Self::layout_all) to restore a consistent cache.
    ///
    /// Escalates on a highlighter error, on any visual-span-count change of a line that was
    /// already laid out, when the gutter width changes, or when the cache length no longer
    /// matches the buffer.
    pub fn layout_range(
        &mut self,
        buffer: &TextBuffer,
        adapter: &mut HighlightAdapter,
        st: usize,
        ed: usize,
        is_deletion: bool,
    ) -> bool {
        let count = buffer.line_count();
        if self.lines.len() != count {
            tracing::debug!(
                target: "textview_core::layout",
                cache = self.lines.len(),
                buffer = count,
                "cache out of step with buffer; escalating"
            );
            return true;
        }
        let st = st.min(count - 1);
        let ed = ed.clamp(st, count - 1);

        let gutter = self.gutter_for(count);
        if gutter != self.gutter {
            tracing::trace!(target: "textview_core::layout", "gutter width changed; escalating");
            return true;
        }

        let mut escalate = false;
        let mut shrank = false;
        let mut max_width = self.total.width;
        for ln in st..=ed {
            let text = buffer.line(ln);
            let markup = match adapter.markup_line(&text) {
                Ok(markup) => markup,
                Err(err) => {
                    tracing::warn!(target: "textview_core::layout", line = ln, %err, "highlighting failed; escalating");
                    escalate = true;
                    LineMarkup::default()
                }
            };
            let render = self.render_line(&text, markup);
            let old = &self.lines[ln];
            if old.laid && old.spans.len() != render.spans.len() {
                tracing::trace!(
                    target: "textview_core::layout",
                    line = ln,
                    old = old.spans.len(),
                    new = render.spans.len(),
                    "span count changed; escalating"
                );
                escalate = true;
            }
            shrank |= render.size.width < old.size.width;
            max_width = max_width.max(render.size.width);
            self.lines[ln] = render;
        }

        if escalate || is_deletion || st != ed {
            self.recompute_offsets(st.max(1) - 1);
        }
        if is_deletion || st != ed || shrank {
            max_width = self.max_line_width();
        }
        self.total.width = max_width;

        tracing::trace!(target: "textview_core::layout", st, ed, is_deletion, escalate, "incremental layout");
        escalate
    }

    /// Splice `n` placeholder entries in at line `at` (after a multi-line insertion).
    pub fn insert_lines(&mut self, at: usize, n: usize) {
        let at = at.min(self.lines.len());
        let off = self.offsets.get(at).copied().unwrap_or(self.total.height);
        self.lines
            .splice(at..at, std::iter::repeat_with(LineRender::blank).take(n));
        self.offsets.splice(at..at, std::iter::repeat_n(off, n));
    }

    /// Remove the `n` entries starting at line `at` (after a multi-line deletion).
    pub fn delete_lines(&mut self, at: usize, n: usize) {
        let at = at.min(self.lines.len());
        let end = at.saturating_add(n).min(self.lines.len());
        self.lines.drain(at..end);
        self.offsets.drain(at..end);
    }

    fn render_line(&self, text: &str, markup: LineMarkup) -> LineRender {
        let spans = self.build_spans(text);
        let width_cells = spans.iter().map(|s| s.width_cells).max().unwrap_or(0);
        let has_markup = !markup.is_plain();
        LineRender {
            markup: markup.runs,
            has_markup,
            size: Size::new(
                width_cells as f32 * self.metrics.char_width,
                spans.len() as f32 * self.metrics.line_height,
            ),
            char_len: text.chars().count(),
            spans,
            links: markup.links,
            laid: true,
        }
    }

    fn build_spans(&self, text: &str) -> Vec<VisualSpan> {
        let wraps = calculate_wrap_points(text, self.wrap_cells, self.tab_width, self.wrap_mode);
        let chars: Vec<char> = text.chars().collect();

        let mut bounds: Vec<usize> = Vec::with_capacity(wraps.len() + 2);
        bounds.push(0);
        bounds.extend(wraps.iter().map(|w| w.char_index));
        bounds.push(chars.len());

        let mut spans = Vec::with_capacity(bounds.len() - 1);
        let mut x_in_line = 0usize;
        for pair in bounds.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let mut cell_x = Vec::with_capacity(end - start + 1);
            let mut x = 0usize;
            cell_x.push(0);
            for &ch in &chars[start..end] {
                let w = cell_width_at(ch, x_in_line, self.tab_width);
                x_in_line += w;
                x += w;
                cell_x.push(x);
            }
            spans.push(VisualSpan {
                start,
                end,
                cell_x,
                width_cells: x,
            });
        }
        spans
    }

    fn recompute_offsets(&mut self, from: usize) {
        let from = from.min(self.lines.len());
        let mut off = if from == 0 {
            0.0
        } else {
            self.offsets.get(from).copied().unwrap_or(0.0)
        };
        for ln in from..self.lines.len() {
            self.offsets[ln] = off;
            off += self.lines[ln].size.height.max(self.metrics.line_height);
        }
        self.total.height = off;
    }

    fn max_line_width(&self) -> f32 {
        self.lines
            .iter()
            .map(|l| l.size.width)
            .fold(0.0, f32::max)
    }

    /// Number of cached lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Cached render of line `ln`.
    pub fn line(&self, ln: usize) -> Option<&LineRender> {
        self.lines.get(ln)
    }

    /// All cached lines.
    pub fn lines(&self) -> &[LineRender] {
        &self.lines
    }

    /// Vertical offset of every line.
    pub fn offsets(&self) -> &[f32] {
        &self.offsets
    }

    /// Vertical offset of line `ln` (clamped to the last line).
    pub fn offset(&self, ln: usize) -> f32 {
        match self.offsets.get(ln) {
            Some(off) => *off,
            None => self.offsets.last().copied().unwrap_or(0.0),
        }
    }

    /// Pixel height of line `ln`.
    pub fn line_height(&self, ln: usize) -> f32 {
        self.lines
            .get(ln)
            .map(|l| l.size.height)
            .unwrap_or(0.0)
            .max(self.metrics.line_height)
    }

    /// Size of all laid-out text plus the gutter.
    pub fn total_size(&self) -> Size {
        Size::new(self.total.width + self.gutter, self.total.height)
    }

    /// Number of visual spans of line `ln` (at least 1).
    pub fn span_count(&self, ln: usize) -> usize {
        self.lines.get(ln).map(|l| l.spans.len()).unwrap_or(0).max(1)
    }

    /// Span and rune-within-span of column `col` on line `ln`.
    ///
    /// A column on a wrap boundary belongs to the later span; the end of the line belongs to
    /// the last span.
    pub fn rune_span_pos(&self, ln: usize, col: usize) -> (usize, usize) {
        let Some(line) = self.lines.get(ln) else {
            return (0, col);
        };
        let last = line.spans.len().saturating_sub(1);
        for (si, span) in line.spans.iter().enumerate() {
            if col < span.end || si == last {
                return (si, col.saturating_sub(span.start).min(span.len()));
            }
        }
        (0, col)
    }

    /// Column of rune `ri` in span `si` of line `ln`, clamped to that span.
    ///
    /// Past the end of a non-last span this is the span's last character, so the cursor
    /// stays on the visual row it was moved to.
    pub fn span_pos_to_col(&self, ln: usize, si: usize, ri: usize) -> usize {
        let Some(line) = self.lines.get(ln) else {
            return ri;
        };
        let Some(last) = line.spans.len().checked_sub(1) else {
            return 0;
        };
        let si = si.min(last);
        let span = &line.spans[si];
        if ri < span.len() {
            span.start + ri
        } else if si == last {
            span.end
        } else {
            span.start + span.len().saturating_sub(1)
        }
    }

    /// Top-left pixel corner of the character at `pos`, in document coordinates.
    pub fn char_start_pos(&self, pos: TextPosition) -> Point {
        if self.lines.is_empty() {
            return Point::new(self.gutter, 0.0);
        }
        let ln = pos.line.min(self.lines.len() - 1);
        let (si, ri) = self.rune_span_pos(ln, pos.column);
        let x = self.lines[ln]
            .spans
            .get(si)
            .map(|s| s.x_of(ri))
            .unwrap_or(0);
        Point::new(
            self.gutter + x as f32 * self.metrics.char_width,
            self.offset(ln) + si as f32 * self.metrics.line_height,
        )
    }

    /// Bottom-right pixel corner of the character at `pos`, in document coordinates.
    pub fn char_end_pos(&self, pos: TextPosition) -> Point {
        if pos.line >= self.lines.len() {
            return Point::new(self.gutter, self.total.height);
        }
        let start = self.char_start_pos(pos);
        let (si, ri) = self.rune_span_pos(pos.line, pos.column);
        let x = self.lines[pos.line]
            .spans
            .get(si)
            .map(|s| s.x_of(ri + 1))
            .unwrap_or(0);
        Point::new(
            self.gutter + x as f32 * self.metrics.char_width,
            start.y + self.metrics.line_height,
        )
    }

    /// Line whose vertical extent contains `y` (clamped to the document).
    pub fn line_at_y(&self, y: f32) -> usize {
        if self.offsets.is_empty() || y <= 0.0 {
            return 0;
        }
        let idx = self.offsets.partition_point(|off| *off <= y);
        idx.saturating_sub(1).min(self.offsets.len() - 1)
    }

    /// Column in span `si` of line `ln` nearest to pixel `x` (document coordinates).
    pub fn col_at_x(&self, ln: usize, si: usize, x: f32) -> usize {
        let Some(line) = self.lines.get(ln) else {
            return 0;
        };
        let Some(last) = line.spans.len().checked_sub(1) else {
            return 0;
        };
        let si = si.min(last);
        let span = &line.spans[si];
        let cx = (x - self.gutter) / self.metrics.char_width.max(f32::EPSILON);
        if cx <= 0.0 {
            return span.start;
        }
        for ri in 0..span.len() {
            let left = span.cell_x[ri] as f32;
            let right = span.cell_x[ri + 1] as f32;
            if cx < right {
                // Past the middle of a glyph places the cursor after it.
                return if cx - left > (right - left) / 2.0 {
                    self.span_pos_to_col(ln, si, ri + 1)
                } else {
                    span.start + ri
                };
            }
        }
        self.span_pos_to_col(ln, si, span.len())
    }

    /// Logical position under the pixel `p` (document coordinates), clamped to the text.
    pub fn pos_at_point(&self, p: Point) -> TextPosition {
        if self.lines.is_empty() {
            return TextPosition::ZERO;
        }
        let ln = self.line_at_y(p.y);
        let rel = (p.y - self.offset(ln)).max(0.0);
        let si = ((rel / self.metrics.line_height.max(f32::EPSILON)) as usize)
            .min(self.span_count(ln) - 1);
        TextPosition::new(ln, self.col_at_x(ln, si, p.x))
    }

    /// Returns `true` if the line-number gutter would change width for `line_count` lines.
    pub fn gutter_changes_for(&self, line_count: usize) -> bool {
        self.gutter_for(line_count) != self.gutter
    }
}
