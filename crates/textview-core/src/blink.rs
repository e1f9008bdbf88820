//! Cursor blinking.
//!
//! Only the focused editor blinks. [`BlinkScheduler`] holds at most one registration: the
//! view that last took focus. The host calls [`BlinkScheduler::tick`] from its event loop
//! (timer or frame callback); when the interval has elapsed the registered toggle callback
//! is invoked with the new visibility. Toggle callbacks run while the scheduler is locked and
//! must not call back into it.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::buffer::ViewId;

/// Default blink half-period.
pub const DEFAULT_BLINK_INTERVAL: Duration = Duration::from_millis(500);

static GLOBAL: OnceLock<BlinkScheduler> = OnceLock::new();

type ToggleFn = Box<dyn FnMut(bool) + Send>;

struct Registration {
    id: ViewId,
    toggle: ToggleFn,
}

struct BlinkState {
    interval: Duration,
    focused: Option<Registration>,
    on: bool,
    last_toggle: Option<Instant>,
}

/// Process-wide (or per-window) cursor blink service. Clones share the same state.
#[derive(Clone)]
pub struct BlinkScheduler {
    state: Arc<Mutex<BlinkState>>,
}

impl std::fmt::Debug for BlinkScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BlinkScheduler")
            .field("interval", &state.interval)
            .field("focused", &state.focused.as_ref().map(|r| r.id))
            .field("on", &state.on)
            .finish()
    }
}

impl Default for BlinkScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BLINK_INTERVAL)
    }
}

impl BlinkScheduler {
    /// A scheduler toggling every `interval`; zero means the cursor never blinks.
    pub fn new(interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BlinkState {
                interval,
                focused: None,
                on: true,
                last_toggle: None,
            })),
        }
    }

    /// The shared scheduler, created on first use with the default interval.
    pub fn global() -> &'static BlinkScheduler {
        GLOBAL.get_or_init(BlinkScheduler::default)
    }

    /// Current interval.
    pub fn interval(&self) -> Duration {
        self.state.lock().interval
    }

    /// Change the interval. The cursor is made visible and the phase restarts.
    pub fn set_interval(&self, interval: Duration) {
        let mut state = self.state.lock();
        state.interval = interval;
        state.last_toggle = None;
        if !state.on {
            state.on = true;
            if let Some(reg) = state.focused.as_mut() {
                (reg.toggle)(true);
            }
        }
    }

    /// Make `id` the blinking editor. The previous registration is told "visible" and dropped.
    pub fn register_focused_editor<F>(&self, id: ViewId, toggle: F)
    where
        F: FnMut(bool) + Send + 'static,
    {
        let mut state = self.state.lock();
        if let Some(mut prev) = state.focused.take() {
            (prev.toggle)(true);
        }
        let mut reg = Registration {
            id,
            toggle: Box::new(toggle),
        };
        (reg.toggle)(true);
        state.focused = Some(reg);
        state.on = true;
        state.last_toggle = None;
        tracing::debug!(target: "textview_core::blink", view = id.get(), "blink focus registered");
    }

    /// Remove the registration if it belongs to `id`. Returns true if it did.
    pub fn unregister(&self, id: ViewId) -> bool {
        let mut state = self.state.lock();
        match state.focused.as_ref() {
            Some(reg) if reg.id == id => {
                if let Some(mut reg) = state.focused.take() {
                    (reg.toggle)(true);
                }
                state.on = true;
                state.last_toggle = None;
                tracing::debug!(target: "textview_core::blink", view = id.get(), "blink focus released");
                true
            }
            _ => false,
        }
    }

    /// The editor currently registered.
    pub fn focused(&self) -> Option<ViewId> {
        self.state.lock().focused.as_ref().map(|r| r.id)
    }

    /// Current visibility of the blinking cursor.
    pub fn is_on(&self) -> bool {
        self.state.lock().on
    }

    /// Advance the clock. Toggles and notifies the focused editor when the interval elapsed.
    /// Returns true if it toggled.
    pub fn tick(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        if state.interval.is_zero() || state.focused.is_none() {
            return false;
        }
        let Some(last) = state.last_toggle else {
            state.last_toggle = Some(now);
            return false;
        };
        if now.saturating_duration_since(last) < state.interval {
            return false;
        }
        state.on = !state.on;
        state.last_toggle = Some(now);
        let on = state.on;
        if let Some(reg) = state.focused.as_mut() {
            (reg.toggle)(on);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn flag() -> (Arc<AtomicBool>, impl FnMut(bool) + Send + 'static) {
        let f = Arc::new(AtomicBool::new(false));
        let g = f.clone();
        (f, move |on| g.store(on, Ordering::SeqCst))
    }

    #[test]
    fn test_tick_toggles_after_interval() {
        let s = BlinkScheduler::new(Duration::from_millis(100));
        let (on, cb) = flag();
        let id = ViewId::next();
        s.register_focused_editor(id, cb);
        assert!(on.load(Ordering::SeqCst));

        let t0 = Instant::now();
        assert!(!s.tick(t0));
        assert!(!s.tick(t0 + Duration::from_millis(50)));
        assert!(s.tick(t0 + Duration::from_millis(100)));
        assert!(!on.load(Ordering::SeqCst));
        assert!(s.tick(t0 + Duration::from_millis(200)));
        assert!(on.load(Ordering::SeqCst));
    }

    #[test]
    fn test_register_replaces_previous_and_leaves_it_visible() {
        let s = BlinkScheduler::new(Duration::from_millis(10));
        let (a_on, a) = flag();
        let a_id = ViewId::next();
        s.register_focused_editor(a_id, a);
        let t0 = Instant::now();
        s.tick(t0);
        s.tick(t0 + Duration::from_millis(10));
        assert!(!a_on.load(Ordering::SeqCst));

        let (_, b) = flag();
        let b_id = ViewId::next();
        s.register_focused_editor(b_id, b);
        assert!(a_on.load(Ordering::SeqCst));
        assert_eq!(s.focused(), Some(b_id));

        assert!(!s.unregister(a_id));
        assert!(s.unregister(b_id));
        assert_eq!(s.focused(), None);
    }

    #[test]
    fn test_zero_interval_never_blinks() {
        let s = BlinkScheduler::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        s.register_focused_editor(ViewId::next(), move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let t0 = Instant::now();
        for i in 0..5 {
            assert!(!s.tick(t0 + Duration::from_secs(i)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(s.is_on());
    }

    #[test]
    fn test_clones_share_registration() {
        let s = BlinkScheduler::new(Duration::from_millis(10));
        let handle = s.clone();
        let id = ViewId::next();
        handle.register_focused_editor(id, |_| {});
        assert_eq!(s.focused(), Some(id));
        assert!(s.unregister(id));
        assert_eq!(handle.focused(), None);
    }
}
