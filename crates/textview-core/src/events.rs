//! Outbound notifications from a view to the surrounding widget tree.
//!
//! Subscribers are plain callbacks owned by the view's [`EventSubscribers`]; they are dropped
//! with the view, and [`EventSubscribers::unsubscribe`] removes one early. Callbacks run
//! synchronously after the view has finished updating its own state.

use crate::position::{TextPosition, TextRegion};

/// Something observable happened in a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The selection changed.
    SelectionChanged(TextRegion),
    /// The cursor moved.
    CursorMoved(TextPosition),
    /// The buffer content changed (it now needs saving).
    ContentChanged,
    /// A link in the rendered markup was activated.
    LinkActivated(String),
    /// Interactive search state changed.
    SearchUpdated {
        /// Whether search mode is active.
        active: bool,
        /// Current search string.
        string: String,
        /// Number of matches.
        matches: usize,
        /// Index of the current match.
        current: Option<usize>,
    },
}

/// Handle returned by [`EventSubscribers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&EditorEvent)>;

/// The subscriber list of one view.
#[derive(Default)]
pub struct EventSubscribers {
    next: u64,
    subs: Vec<(SubscriptionId, Callback)>,
}

impl std::fmt::Debug for EventSubscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscribers")
            .field("count", &self.subs.len())
            .finish()
    }
}

impl EventSubscribers {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.next += 1;
        let id = SubscriptionId(self.next);
        self.subs.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subs.len();
        self.subs.retain(|(s, _)| *s != id);
        self.subs.len() != before
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// Returns true if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Deliver `event` to every subscriber in subscription order.
    pub fn emit(&mut self, event: &EditorEvent) {
        tracing::trace!(target: "textview_core::events", ?event, subscribers = self.subs.len(), "emit");
        for (_, cb) in self.subs.iter_mut() {
            cb(event);
        }
    }
}
