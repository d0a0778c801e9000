use foundation::math::Vec2;
use foundation::time::Time;
use tracing::debug;

/// Default delay between the end of a draw interaction and clicks being
/// accepted again.
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// Suppresses map clicks while an interactive draw is in progress.
///
/// The click that finishes a drawing arrives as an ordinary map click too, so
/// the gate stays closed for a settle delay after the draw ends. Time is passed
/// in explicitly; the gate never reads a clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickGate {
    settle_ms: u64,
    closed: bool,
    reopen_at: Option<Time>,
}

impl Default for ClickGate {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_MS)
    }
}

impl ClickGate {
    pub fn new(settle_ms: u64) -> Self {
        Self {
            settle_ms,
            closed: false,
            reopen_at: None,
        }
    }

    pub fn settle_ms(&self) -> u64 {
        self.settle_ms
    }

    /// Start ignoring clicks until [`ClickGate::release`] plus the settle delay.
    pub fn close(&mut self) {
        self.closed = true;
        self.reopen_at = None;
    }

    /// The draw finished at `now`; accept clicks again once the delay passes.
    pub fn release(&mut self, now: Time) {
        if self.closed {
            self.reopen_at = Some(now.after_millis(self.settle_ms));
        }
    }

    /// Accept clicks again immediately, e.g. after a cancelled draw.
    pub fn reopen(&mut self) {
        self.closed = false;
        self.reopen_at = None;
    }

    pub fn is_open(&mut self, now: Time) -> bool {
        if !self.closed {
            return true;
        }
        match self.reopen_at {
            Some(at) if now >= at => {
                self.closed = false;
                self.reopen_at = None;
                true
            }
            _ => false,
        }
    }
}

/// Identifies a handler registered with a [`ClickDispatcher`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Ordered list of pixel click handlers behind a [`ClickGate`].
pub struct ClickDispatcher {
    gate: ClickGate,
    next_id: u64,
    handlers: Vec<(HandlerId, Box<dyn FnMut(Vec2)>)>,
}

impl std::fmt::Debug for ClickDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickDispatcher")
            .field("gate", &self.gate)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Default for ClickDispatcher {
    fn default() -> Self {
        Self::new(ClickGate::default())
    }
}

impl ClickDispatcher {
    pub fn new(gate: ClickGate) -> Self {
        Self {
            gate,
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    pub fn gate(&self) -> &ClickGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut ClickGate {
        &mut self.gate
    }

    pub fn register(&mut self, handler: impl FnMut(Vec2) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(hid, _)| *hid != id);
        self.handlers.len() != before
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Checks the gate; `false` means the click must be dropped.
    pub fn accepts(&mut self, now: Time) -> bool {
        let open = self.gate.is_open(now);
        if !open {
            debug!(t = now.0, "map click ignored while drawing");
        }
        open
    }

    /// Invoke every handler in registration order. Does not consult the gate.
    pub fn notify(&mut self, pixel: Vec2) {
        for (_, handler) in &mut self.handlers {
            handler(pixel);
        }
    }

    /// Gate check followed by [`ClickDispatcher::notify`]. Returns whether the
    /// click was delivered.
    pub fn dispatch(&mut self, pixel: Vec2, now: Time) -> bool {
        if !self.accepts(now) {
            return false;
        }
        self.notify(pixel);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{ClickDispatcher, ClickGate};
    use foundation::math::Vec2;
    use foundation::time::Time;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn gate_reopens_after_settle_delay() {
        let mut gate = ClickGate::new(500);
        assert!(gate.is_open(Time(0.0)));

        gate.close();
        assert!(!gate.is_open(Time(10.0)));

        gate.release(Time(10.0));
        assert!(!gate.is_open(Time(10.2)));
        assert!(gate.is_open(Time(10.5)));
        assert!(gate.is_open(Time(10.6)));
    }

    #[test]
    fn release_without_close_is_ignored() {
        let mut gate = ClickGate::new(500);
        gate.release(Time(1.0));
        assert!(gate.is_open(Time(1.0)));
    }

    #[test]
    fn reopen_skips_the_delay() {
        let mut gate = ClickGate::new(500);
        gate.close();
        gate.reopen();
        assert!(gate.is_open(Time(0.0)));
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = ClickDispatcher::default();
        for name in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            dispatcher.register(move |p: Vec2| log.borrow_mut().push((name, p.x, p.y)));
        }

        assert!(dispatcher.dispatch(Vec2::new(3.0, 4.0), Time(0.0)));
        assert_eq!(
            *log.borrow(),
            vec![("first", 3.0, 4.0), ("second", 3.0, 4.0), ("third", 3.0, 4.0)]
        );
    }

    #[test]
    fn closed_gate_drops_clicks() {
        let hits = Rc::new(RefCell::new(0));
        let mut dispatcher = ClickDispatcher::new(ClickGate::new(500));
        let counter = Rc::clone(&hits);
        let id = dispatcher.register(move |_| *counter.borrow_mut() += 1);

        dispatcher.gate_mut().close();
        assert!(!dispatcher.dispatch(Vec2::new(0.0, 0.0), Time(1.0)));
        dispatcher.gate_mut().release(Time(1.0));
        assert!(dispatcher.dispatch(Vec2::new(0.0, 0.0), Time(2.0)));
        assert_eq!(*hits.borrow(), 1);

        assert!(dispatcher.unregister(id));
        assert_eq!(dispatcher.handler_count(), 0);
    }
}
