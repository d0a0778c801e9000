use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

/// Identifies one subscription on a [`Topic`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

struct Subscriber<T> {
    id: SubscriptionId,
    // Sequence number of the value replayed on subscribe; deliveries up to it
    // are skipped.
    since: u64,
    callback: Callback<T>,
}

struct Inner<T> {
    latest: Option<T>,
    seq: u64,
    next_id: u64,
    subscribers: Vec<Subscriber<T>>,
    // Set while callbacks run; publishes made from inside a callback are
    // queued and delivered after the current round, preserving order.
    notifying: bool,
    pending: VecDeque<(u64, T)>,
    cancelled: Vec<SubscriptionId>,
}

/// Replay-latest stream: a single-slot cache of the last published value plus
/// a list of subscribers notified synchronously on every publish.
///
/// Ordering contract:
/// - Subscribers are notified in subscription order.
/// - Every subscriber observes every value in publish order, including values
///   published re-entrantly from within a callback.
/// - A new subscriber is immediately called with the cached value, if any,
///   and then only with values published after it. A value queued by a
///   re-entrant publish is never delivered twice.
///
/// Handles are cheap clones sharing one stream. Single-threaded only.
pub struct Topic<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Default for Topic<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Topic")
            .field("has_value", &inner.latest.is_some())
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + 'static> Topic<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                latest: None,
                seq: 0,
                next_id: 0,
                subscribers: Vec::new(),
                notifying: false,
                pending: VecDeque::new(),
                cancelled: Vec::new(),
            })),
        }
    }

    /// A stream that already holds `value`.
    pub fn with_value(value: T) -> Self {
        let topic = Self::new();
        topic.inner.borrow_mut().latest = Some(value);
        topic
    }

    pub fn latest(&self) -> Option<T> {
        self.inner.borrow().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    pub fn subscribe(&self, mut callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        let (id, since, replay) = {
            let mut inner = self.inner.borrow_mut();
            let id = SubscriptionId(inner.next_id);
            inner.next_id += 1;
            (id, inner.seq, inner.latest.clone())
        };

        // Replay outside the borrow so the callback may touch the topic.
        if let Some(value) = replay {
            callback(&value);
        }

        self.inner.borrow_mut().subscribers.push(Subscriber {
            id,
            since,
            callback: Box::new(callback),
        });
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id);
        if inner.subscribers.len() != before {
            return true;
        }
        if inner.notifying && id.0 < inner.next_id && !inner.cancelled.contains(&id) {
            inner.cancelled.push(id);
            return true;
        }
        false
    }

    pub fn publish(&self, value: T) {
        let seq = {
            let mut inner = self.inner.borrow_mut();
            inner.seq += 1;
            let seq = inner.seq;
            inner.latest = Some(value.clone());
            if inner.notifying {
                inner.pending.push_back((seq, value));
                return;
            }
            inner.notifying = true;
            seq
        };

        let mut next = Some((seq, value));
        while let Some((seq, value)) = next.take() {
            let mut running = std::mem::take(&mut self.inner.borrow_mut().subscribers);
            trace!(subscribers = running.len(), seq, "publish");

            for subscriber in &mut running {
                let skip = subscriber.since >= seq
                    || self.inner.borrow().cancelled.contains(&subscriber.id);
                if skip {
                    continue;
                }
                (subscriber.callback)(&value);
            }

            let mut inner = self.inner.borrow_mut();
            let cancelled = std::mem::take(&mut inner.cancelled);
            running.retain(|s| !cancelled.contains(&s.id));
            // Subscriptions made during the round were pushed onto the now
            // empty list; keep them after the existing ones.
            running.append(&mut inner.subscribers);
            inner.subscribers = running;
            next = inner.pending.pop_front();
        }

        self.inner.borrow_mut().notifying = false;
    }
}
