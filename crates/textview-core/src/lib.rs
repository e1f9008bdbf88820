#![warn(missing_docs)]
//! Textview Core - Headless Text-Editing Widget Engine
//!
//! # Overview
//!
//! `textview-core` is the engine behind a text-editing widget: a line buffer shared by any
//! number of views, a per-view render cache of wrapped and highlighted lines, a cursor and
//! selection model that stays consistent under edits, interactive search, key dispatch and
//! the mapping between text positions and pixels. It does not paint anything; the host
//! reads the render cache and the repaint tracker and draws.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextView (dispatch, modes, notifications)  │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Cursor / Selection · Interactive Search    │  ← Interaction State
//! ├─────────────────────────────────────────────┤
//! │  Layout Engine (render cache, wrapping)     │  ← Geometry
//! ├─────────────────────────────────────────────┤
//! │  Highlight Adapter (Tokenizer → markup)     │  ← Styling
//! ├─────────────────────────────────────────────┤
//! │  TextBuffer (rope, undo, edit events)       │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use textview_core::{KeyEvent, TextBuffer, TextPosition, TextView};
//!
//! let buffer = TextBuffer::shared("fn main() {\n}\n");
//! let mut view = TextView::with_defaults(&buffer);
//! view.resize(640.0, 480.0);
//!
//! view.set_cursor(TextPosition::new(0, 11));
//! view.handle_key(&KeyEvent::parse("ReturnEnter").unwrap());
//! for ch in "println!();".chars() {
//!     view.handle_key(&KeyEvent::char(ch));
//! }
//!
//! assert_eq!(buffer.borrow().line(1), "\tprintln!();");
//! ```
//!
//! # Multiple Views
//!
//! Views hold a weak reference to their buffer and receive [`BufferEvent`]s over a channel.
//! Every public view operation first drains pending events: a single edit re-lays only the
//! touched lines, anything more re-lays the whole document. Edits made by another view move
//! this view's cursor so it stays on the same text.
//!
//! # Module Description
//!
//! - [`buffer`] - Shared line buffer, undo history and edit notifications
//! - [`layout`] - Render cache, soft wrapping and pixel geometry
//! - [`cursor`] - Cursor, desired column and selection
//! - [`isearch`] / [`search`] - Interactive search and match highlighting
//! - [`highlight`] - Tokenizer contract and markup production
//! - [`keymap`] - Key chords, logical functions and key maps
//! - [`view`] - The `TextView` that ties it all together

pub mod blink;
pub mod buffer;
pub mod clipboard;
pub mod completion;
pub mod config;
pub mod cursor;
pub mod events;
pub mod geometry;
pub mod highlight;
pub mod indent;
pub mod isearch;
pub mod keymap;
pub mod layout;
pub mod line_ending;
pub mod position;
pub mod search;
pub mod style;
mod text;
pub mod undo;
pub mod view;
pub mod viewport;

pub use blink::{BlinkScheduler, DEFAULT_BLINK_INTERVAL};
pub use buffer::{BufferEvent, SharedBuffer, TextBuffer, TextEdit, ViewId};
pub use clipboard::{Clipboard, MemoryClipboard};
pub use completion::{Completer, Completion, CompletionPopup, WordListCompleter};
pub use config::{ConfigError, EditorOptions, Theme};
pub use cursor::{CursorModel, LineGeometry};
pub use events::{EditorEvent, SubscriptionId};
pub use geometry::{Point, Rect, Size};
pub use highlight::{
    HighlightAdapter, HighlightError, LexerProvider, LineMarkup, LinkSpan, StyledRun, Token,
    TokenKind, Tokenizer,
};
pub use isearch::{InteractiveSearch, SearchOutcome};
pub use keymap::{Key, KeyChord, KeyEvent, KeyFunction, KeyMap, Modifiers, ParseChordError};
pub use layout::{FontMetrics, LayoutEngine, LineRender, VisualSpan, WrapMode};
pub use line_ending::LineEnding;
pub use position::{ParsePositionError, TextPosition, TextRegion};
pub use search::{FindHighlights, MAX_FIND_HIGHLIGHTS};
pub use style::{Color, HighlightStyle, TextStyle};
pub use view::{Repaint, TextView};
pub use viewport::{Dim, ScrollArea, ViewportScroller};

pub use textview_lang::{LanguageConfig, LanguageRegistry};
