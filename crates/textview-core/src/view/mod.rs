//! The [`TextView`] orchestrator.
//!
//! A view owns everything that is private to one pane onto a buffer: the cursor model, the
//! interactive search, the render cache, the highlighter, the completion popup, the viewport
//! and the subscriber list. The buffer itself is shared ([`SharedBuffer`]); the view only
//! keeps a weak reference plus the receiving end of the buffer's event channel.
//!
//! Every public operation first drains that channel, so edits made through other views (or
//! directly on the buffer) are applied to this view's cache before the operation runs. After
//! the view's own edits the channel is drained again, synchronously; the cache is therefore
//! consistent whenever control returns to the host.
//!
//! The view never paints. It exposes geometry (cursor and selection rectangles, line offsets)
//! and a [`Repaint`] request the host drains with [`TextView::take_repaint`].

mod editing;
mod input;
mod mouse;
mod navigation;
mod search;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::blink::BlinkScheduler;
use crate::buffer::{BufferEvent, SharedBuffer, TextBuffer, TextEdit, ViewId};
use crate::clipboard::{Clipboard, MemoryClipboard};
use crate::completion::{Completer, CompletionPopup};
use crate::config::{EditorOptions, Theme};
use crate::cursor::CursorModel;
use crate::events::{EditorEvent, EventSubscribers, SubscriptionId};
use crate::geometry::{Rect, Size};
use crate::highlight::{HighlightAdapter, LexerProvider};
use crate::isearch::InteractiveSearch;
use crate::keymap::KeyMap;
use crate::layout::LayoutEngine;
use crate::position::{TextPosition, TextRegion};
use crate::search::FindHighlights;
use crate::viewport::{ScrollArea, ViewportScroller};

/// What the host has to repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repaint {
    /// Nothing changed.
    #[default]
    None,
    /// Only lines `start..=end` changed.
    Lines {
        /// First line to repaint.
        start: usize,
        /// Last line to repaint.
        end: usize,
    },
    /// Everything.
    Full,
}

impl Repaint {
    fn add_lines(&mut self, a: usize, b: usize) {
        let (a, b) = (a.min(b), a.max(b));
        *self = match *self {
            Repaint::None => Repaint::Lines { start: a, end: b },
            Repaint::Lines { start, end } => Repaint::Lines {
                start: start.min(a),
                end: end.max(b),
            },
            Repaint::Full => Repaint::Full,
        };
    }

    fn full(&mut self) {
        *self = Repaint::Full;
    }

    /// Returns true if nothing needs repainting.
    pub fn is_none(&self) -> bool {
        *self == Repaint::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    pos: TextPosition,
    selection: TextRegion,
    search: (bool, String, usize, Option<usize>),
}

/// One editing pane onto a shared buffer.
pub struct TextView {
    id: ViewId,
    buffer: Weak<RefCell<TextBuffer>>,
    events: Receiver<BufferEvent>,
    options: EditorOptions,
    theme: Theme,
    keymap: KeyMap,
    cursor: CursorModel,
    isearch: InteractiveSearch,
    find: FindHighlights,
    layout: LayoutEngine,
    adapter: HighlightAdapter,
    completion: CompletionPopup,
    completer: Option<Box<dyn Completer>>,
    clipboard: Box<dyn Clipboard>,
    viewport: Box<dyn ViewportScroller>,
    subscribers: EventSubscribers,
    repaint: Repaint,
    last_recenter: usize,
    last_was_tab_ai: bool,
    last_auto_insert: Option<char>,
    view_size: Size,
    cursor_visible: Arc<AtomicBool>,
    blink: Option<BlinkScheduler>,
    focused: bool,
    dragging: bool,
    shift_selecting: bool,
}

impl std::fmt::Debug for TextView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextView")
            .field("id", &self.id)
            .field("cursor", &self.cursor)
            .field("isearch", &self.isearch.is_active())
            .field("lines", &self.layout.line_count())
            .field("repaint", &self.repaint)
            .finish()
    }
}

impl TextView {
    /// Open a view on `buffer` and lay it out with zero width (no wrapping until
    /// [`resize`](Self::resize) is called).
    pub fn new(buffer: &SharedBuffer, options: EditorOptions, theme: Theme) -> Self {
        let id = ViewId::next();
        let events = buffer.borrow_mut().add_view(id);
        let options = options.validated();
        let theme = theme.validated();
        let keymap = options.build_keymap().unwrap_or_else(|err| {
            tracing::warn!(target: "textview_core::view", %err, "invalid key map options; using the standard map");
            KeyMap::standard()
        });
        let mut layout = LayoutEngine::new(theme.metrics);
        layout.set_tab_width(options.tab_width);
        layout.set_wrap_mode(options.wrap);
        layout.set_line_numbers(options.line_numbers);

        let mut view = Self {
            id,
            buffer: Rc::downgrade(buffer),
            events,
            options,
            theme,
            keymap,
            cursor: CursorModel::new(),
            isearch: InteractiveSearch::new(),
            find: FindHighlights::new(),
            layout,
            adapter: HighlightAdapter::new(),
            completion: CompletionPopup::new(),
            completer: None,
            clipboard: Box::new(MemoryClipboard::new()),
            viewport: Box::new(ScrollArea::default()),
            subscribers: EventSubscribers::new(),
            repaint: Repaint::Full,
            last_recenter: 0,
            last_was_tab_ai: false,
            last_auto_insert: None,
            view_size: Size::default(),
            cursor_visible: Arc::new(AtomicBool::new(true)),
            blink: None,
            focused: false,
            dragging: false,
            shift_selecting: false,
        };
        {
            let buf = buffer.borrow();
            view.configure_highlighting(&buf);
            view.relayout(&buf);
        }
        tracing::debug!(target: "textview_core::view", view = id.get(), "view opened");
        view
    }

    /// A view with default options and theme.
    pub fn with_defaults(buffer: &SharedBuffer) -> Self {
        Self::new(buffer, EditorOptions::default(), Theme::default())
    }

    /// This view's id on its buffer.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The buffer, if it is still alive.
    pub fn buffer(&self) -> Option<SharedBuffer> {
        self.buffer.upgrade()
    }

    /// Options.
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Theme.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Active key map.
    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    /// Mutable key map, for host-side rebinding.
    pub fn keymap_mut(&mut self) -> &mut KeyMap {
        &mut self.keymap
    }

    /// Replace the key map.
    pub fn set_keymap(&mut self, keymap: KeyMap) {
        self.keymap = keymap;
    }

    /// Returns true if edits are allowed.
    pub fn is_editable(&self) -> bool {
        !self.options.read_only
    }

    /// The cursor model.
    pub fn cursor(&self) -> &CursorModel {
        &self.cursor
    }

    /// Cursor position.
    pub fn cursor_pos(&self) -> TextPosition {
        self.cursor.pos()
    }

    /// Current selection.
    pub fn selection(&self) -> TextRegion {
        self.cursor.selection()
    }

    /// Returns true if a non-empty region is selected.
    pub fn has_selection(&self) -> bool {
        self.cursor.has_selection()
    }

    /// The render cache and geometry.
    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    /// The highlighter.
    pub fn highlighter(&self) -> &HighlightAdapter {
        &self.adapter
    }

    /// Interactive search state.
    pub fn isearch(&self) -> &InteractiveSearch {
        &self.isearch
    }

    /// Highlighted search matches.
    pub fn find_highlights(&self) -> &FindHighlights {
        &self.find
    }

    /// The completion popup.
    pub fn completion(&self) -> &CompletionPopup {
        &self.completion
    }

    /// The viewport.
    pub fn viewport(&self) -> &dyn ViewportScroller {
        self.viewport.as_ref()
    }

    /// Size passed to the last [`resize`](Self::resize).
    pub fn view_size(&self) -> Size {
        self.view_size
    }

    /// Returns true if the cursor should currently be drawn.
    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible.load(Ordering::Relaxed)
    }

    /// Returns true while the view has focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Use `completer` for completion.
    pub fn set_completer(&mut self, completer: Option<Box<dyn Completer>>) {
        self.completer = completer;
        self.completion.close();
    }

    /// Use `clipboard` for cut, copy and paste.
    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = clipboard;
    }

    /// Host the view in a different scrolling container.
    pub fn set_viewport(&mut self, mut viewport: Box<dyn ViewportScroller>) {
        viewport.set_size(self.view_size, self.layout.total_size());
        self.viewport = viewport;
        self.repaint.full();
    }

    /// Use `provider` for lexers and re-highlight.
    pub fn set_lexer_provider(&mut self, provider: Box<dyn LexerProvider>) {
        self.adapter.set_provider(Some(provider));
        if let Some(shared) = self.shared() {
            let buf = shared.borrow();
            self.relayout(&buf);
        }
    }

    /// Subscribe to this view's notifications.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Take the pending repaint request.
    pub fn take_repaint(&mut self) -> Repaint {
        std::mem::take(&mut self.repaint)
    }

    /// Replace the options; wrapping, tab width and gutter changes trigger a full layout.
    pub fn set_options(&mut self, options: EditorOptions) {
        let options = options.validated();
        match options.build_keymap() {
            Ok(map) => self.keymap = map,
            Err(err) => {
                tracing::warn!(target: "textview_core::view", %err, "invalid key map options; keeping the current map")
            }
        }
        let mut changed = self.layout.set_tab_width(options.tab_width);
        changed |= self.layout.set_wrap_mode(options.wrap);
        changed |= self.layout.set_line_numbers(options.line_numbers);
        self.options = options;
        if changed {
            if let Some(shared) = self.shared() {
                let buf = shared.borrow();
                self.relayout(&buf);
            }
        }
    }

    /// Replace the theme; metrics or highlight style changes trigger a full layout.
    pub fn set_theme(&mut self, theme: Theme) {
        let theme = theme.validated();
        let metrics = self.layout.set_metrics(theme.metrics);
        self.theme = theme;
        if let Some(shared) = self.shared() {
            let buf = shared.borrow();
            let styled = self.configure_highlighting(&buf);
            if metrics || styled {
                self.relayout(&buf);
            }
        }
        self.repaint.full();
    }

    /// Set the size of the visible area. A width change re-wraps every line.
    pub fn resize(&mut self, width: f32, height: f32) {
        let size = Size::new(width.max(0.0), height.max(0.0));
        if size == self.view_size {
            return;
        }
        let rewrap = size.width != self.view_size.width;
        self.view_size = size;
        if rewrap {
            if let Some(shared) = self.shared() {
                let buf = shared.borrow();
                self.relayout(&buf);
            }
        }
        self.viewport.set_size(self.view_size, self.layout.total_size());
        self.repaint.full();
    }

    /// Apply pending buffer events. Returns true if there were any.
    ///
    /// Every public operation does this first; hosts only need it to refresh a view that is
    /// not receiving input.
    pub fn sync(&mut self) -> bool {
        let before = self.snapshot();
        let Some(shared) = self.shared() else {
            return false;
        };
        let any = self.drain_events(&shared, true);
        self.finish(before);
        any
    }

    /// Take keyboard focus: the cursor starts blinking under `blink`.
    pub fn focus_in(&mut self, blink: &BlinkScheduler) {
        self.focused = true;
        let solid = self.options.cursor_blink_ms == 0;
        if !solid {
            let interval = Duration::from_millis(self.options.cursor_blink_ms);
            if blink.interval() != interval {
                blink.set_interval(interval);
            }
        }
        let flag = self.cursor_visible.clone();
        blink.register_focused_editor(self.id, move |on| {
            flag.store(on || solid, Ordering::Relaxed);
        });
        self.blink = Some(blink.clone());
        self.repaint_cursor_line();
    }

    /// Lose keyboard focus: blinking stops, search and completion are dismissed.
    pub fn focus_out(&mut self, blink: &BlinkScheduler) {
        self.focused = false;
        blink.unregister(self.id);
        self.blink = None;
        self.cursor_visible.store(true, Ordering::Relaxed);
        self.completion.close();
        if self.isearch.is_active() {
            let before = self.snapshot();
            self.isearch_cancel();
            self.finish(before);
        }
        self.repaint_cursor_line();
    }

    // ---- geometry ----------------------------------------------------------------------

    /// Rectangle of the cursor bar in document coordinates.
    pub fn cursor_rect(&self) -> Rect {
        let p = self.layout.char_start_pos(self.cursor.pos());
        Rect::new(
            p.x,
            p.y,
            self.theme.cursor_width,
            self.theme.metrics.line_height,
        )
    }

    /// Bounding box of the character at the cursor, in document coordinates.
    pub fn cursor_bbox(&self) -> Rect {
        let pos = self.cursor.pos();
        let a = self.layout.char_start_pos(pos);
        let b = self.layout.char_end_pos(pos);
        Rect::new(
            a.x,
            a.y,
            (b.x - a.x).max(self.theme.cursor_width),
            self.theme.metrics.line_height,
        )
    }

    /// One rectangle per visual span covered by `region`, in document coordinates.
    pub fn region_rects(&self, region: TextRegion) -> Vec<Rect> {
        let mut rects = Vec::new();
        if region.is_empty() || self.layout.line_count() == 0 {
            return rects;
        }
        let cw = self.theme.metrics.char_width;
        let lh = self.theme.metrics.line_height;
        let gutter = self.layout.gutter_width();
        let last_line = region.end.line.min(self.layout.line_count() - 1);
        for ln in region.start.line..=last_line {
            let Some(line) = self.layout.line(ln) else {
                continue;
            };
            let lo = if ln == region.start.line {
                region.start.column
            } else {
                0
            };
            let hi = if ln == region.end.line {
                region.end.column
            } else {
                line.char_len
            };
            let base = self.layout.offset(ln);
            for (si, span) in line.spans.iter().enumerate() {
                let a = lo.max(span.start);
                let b = hi.min(span.end);
                if a >= b {
                    continue;
                }
                let x0 = span.x_of(a - span.start) as f32 * cw;
                let x1 = span.x_of(b - span.start) as f32 * cw;
                rects.push(Rect::new(
                    gutter + x0,
                    base + si as f32 * lh,
                    x1 - x0,
                    lh,
                ));
            }
        }
        rects
    }

    /// Rectangles of the current selection.
    pub fn selection_rects(&self) -> Vec<Rect> {
        self.region_rects(self.cursor.selection())
    }

    /// Rectangles of the highlighted search matches.
    pub fn find_highlight_rects(&self) -> Vec<Rect> {
        self.find
            .regions()
            .iter()
            .flat_map(|r| self.region_rects(*r))
            .collect()
    }

    // ---- internals ---------------------------------------------------------------------

    /// The buffer, checked for registration.
    ///
    /// A view whose buffer no longer lists it is a programmer error: it panics in debug builds
    /// and turns the calling operation into a no-op in release builds.
    fn shared(&self) -> Option<SharedBuffer> {
        let Some(shared) = self.buffer.upgrade() else {
            tracing::debug!(target: "textview_core::view", view = self.id.get(), "buffer dropped; ignoring");
            return None;
        };
        let registered = shared.borrow().is_registered(self.id);
        if !registered {
            debug_assert!(
                registered,
                "view {} is not registered on its buffer",
                self.id.get()
            );
            tracing::error!(target: "textview_core::view", view = self.id.get(), "view is not registered on its buffer; ignoring");
            return None;
        }
        Some(shared)
    }

    /// Run `f` as one public operation: sync, run, then emit notifications.
    fn op<R>(&mut self, f: impl FnOnce(&mut Self, &SharedBuffer) -> R) -> Option<R> {
        let before = self.snapshot();
        let shared = self.shared()?;
        self.drain_events(&shared, true);
        let out = f(self, &shared);
        self.finish(before);
        Some(out)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.cursor.pos(),
            selection: self.cursor.selection(),
            search: (
                self.isearch.is_active(),
                self.isearch.string().to_string(),
                self.isearch.matches().len(),
                self.isearch.current(),
            ),
        }
    }

    fn finish(&mut self, before: Snapshot) {
        let pos = self.cursor.pos();
        let selection = self.cursor.selection();
        if pos != before.pos {
            self.repaint.add_lines(before.pos.line, pos.line);
            self.scroll_cursor_in_view();
            self.emit(EditorEvent::CursorMoved(pos));
        }
        if selection != before.selection {
            self.repaint.add_lines(before.selection.start.line, before.selection.end.line);
            self.repaint.add_lines(selection.start.line, selection.end.line);
            self.emit(EditorEvent::SelectionChanged(selection));
        }
        let search = (
            self.isearch.is_active(),
            self.isearch.string().to_string(),
            self.isearch.matches().len(),
            self.isearch.current(),
        );
        if search != before.search {
            self.emit(EditorEvent::SearchUpdated {
                active: search.0,
                string: search.1,
                matches: search.2,
                current: search.3,
            });
        }
    }

    fn emit(&mut self, event: EditorEvent) {
        self.subscribers.emit(&event);
    }

    fn repaint_cursor_line(&mut self) {
        let ln = self.cursor.pos().line;
        self.repaint.add_lines(ln, ln);
    }

    /// Point the highlighter at the buffer's language and the theme's style.
    fn configure_highlighting(&mut self, buf: &TextBuffer) -> bool {
        let language = buf.language().map(|l| l.name.clone());
        self.adapter
            .configure(language.as_deref(), &self.theme.highlight_style)
    }

    fn relayout(&mut self, buf: &TextBuffer) {
        self.layout
            .layout_all(buf, &mut self.adapter, self.view_size.width);
        self.cursor.clamp(buf);
        self.viewport
            .set_size(self.view_size, self.layout.total_size());
        self.repaint.full();
    }

    /// Apply queued buffer events. `foreign` events move this view's cursor along with the
    /// text; the view's own edits have already placed it.
    fn drain_events(&mut self, shared: &SharedBuffer, foreign: bool) -> bool {
        let events: Vec<BufferEvent> = self.events.try_iter().collect();
        if events.is_empty() {
            return false;
        }
        let buf = shared.borrow();
        let edits = events
            .iter()
            .filter(|e| matches!(e, BufferEvent::Edited(_)))
            .count();
        let mut full = edits > 1;
        let mut content_changed = false;
        for event in &events {
            match event {
                BufferEvent::Edited(edit) => {
                    content_changed = true;
                    if foreign {
                        self.cursor.adjust_for_edit(edit);
                    }
                    if edits == 1 {
                        full |= self.layout_for_edit(&buf, edit);
                    }
                }
                BufferEvent::Reset => {
                    content_changed = true;
                    full = true;
                    if self.isearch.is_active() {
                        self.isearch.cancel();
                    }
                    self.find.clear();
                    self.completion.close();
                }
                BufferEvent::LanguageChanged => {
                    self.configure_highlighting(&buf);
                    full = true;
                }
            }
        }
        if full {
            self.relayout(&buf);
        } else {
            self.viewport
                .set_size(self.view_size, self.layout.total_size());
        }
        self.cursor.clamp(&buf);
        drop(buf);
        if !self.find.is_empty() && content_changed {
            self.refresh_find_highlights(shared);
        }
        if content_changed {
            self.emit(EditorEvent::ContentChanged);
        }
        tracing::trace!(target: "textview_core::view", view = self.id.get(), events = events.len(), foreign, full, "buffer events applied");
        true
    }

    /// Incremental re-layout for one edit. Returns true if a full layout is needed.
    fn layout_for_edit(&mut self, buf: &TextBuffer, edit: &TextEdit) -> bool {
        let st = edit.start_line();
        let delta = edit.line_delta();
        let full = if edit.is_multi_line() {
            if edit.is_insert {
                self.layout.insert_lines(st + 1, delta);
                self.layout
                    .layout_range(buf, &mut self.adapter, st, st + delta, false)
            } else {
                self.layout.delete_lines(st + 1, delta);
                self.layout.layout_range(buf, &mut self.adapter, st, st, true)
            }
        } else {
            self.layout
                .layout_range(buf, &mut self.adapter, st, st, edit.is_deletion())
        };
        if edit.is_multi_line() {
            self.repaint.full();
        } else {
            self.repaint.add_lines(st, st);
        }
        full
    }

    /// Drain the events produced by this view's own edit.
    fn absorb_own_edits(&mut self, shared: &SharedBuffer) {
        self.drain_events(shared, false);
    }
}

impl Drop for TextView {
    fn drop(&mut self) {
        if let Some(blink) = self.blink.take() {
            blink.unregister(self.id);
        }
        if let Some(shared) = self.buffer.upgrade() {
            if let Ok(mut buf) = shared.try_borrow_mut() {
                buf.remove_view(self.id);
            }
        }
    }
}
