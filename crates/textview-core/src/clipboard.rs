//! Clipboard access.
//!
//! The engine never talks to the OS clipboard itself; the host supplies a [`Clipboard`].
//! [`MemoryClipboard`] keeps the text in process and is what a view uses by default.

use std::cell::RefCell;
use std::rc::Rc;

/// A plain-text clipboard.
pub trait Clipboard {
    /// Current clipboard text, if any.
    fn read(&mut self) -> Option<String>;
    /// Replace the clipboard text.
    fn write(&mut self, text: &str);
}

/// In-process clipboard. Clones share the same contents, so several views can copy and paste
/// between each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Rc<RefCell<Option<String>>>,
}

impl MemoryClipboard {
    /// An empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at the contents without going through the trait.
    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&mut self) -> Option<String> {
        self.contents.borrow().clone()
    }

    fn write(&mut self, text: &str) {
        *self.contents.borrow_mut() = Some(text.to_string());
    }
}
