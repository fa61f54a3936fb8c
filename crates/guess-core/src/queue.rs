//! Thread-safe FIFO queue with a blocking wait-for-non-empty.
//!
//! [`ConcurrentQueue`] backs both directions of every connection:
//!
//! - each connection's private outbound buffer (many `send` callers, one
//!   write loop draining it), and
//! - the shared inbound buffer (the I/O thread pushes decoded envelopes, the
//!   application thread pops them).
//!
//! Every operation takes the internal lock for its own duration only.  The
//! blocking [`ConcurrentQueue::wait`] parks on a condition variable, which
//! releases the lock while parked and re-checks emptiness after every wakeup.
//!
//! The queue is not `Clone`: one owner holds it (usually inside an
//! `Arc`) and everyone else borrows it.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A mutex-protected deque shared between producer and consumer threads.
///
/// No item is ever dropped implicitly; [`ConcurrentQueue::clear`] is the only
/// operation that discards items.
#[derive(Debug)]
pub struct ConcurrentQueue<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConcurrentQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    /// Appends `item` at the back and wakes any waiter.
    pub fn push_back(&self, item: T) {
        self.lock().push_back(item);
        self.ready.notify_all();
    }

    /// Inserts `item` at the front and wakes any waiter.
    pub fn push_front(&self, item: T) {
        self.lock().push_front(item);
        self.ready.notify_all();
    }

    /// Removes and returns the oldest item, or `None` when empty.
    pub fn pop_front(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Removes and returns the newest item, or `None` when empty.
    pub fn pop_back(&self) -> Option<T> {
        self.lock().pop_back()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discards every queued item.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Blocks the calling thread until the queue holds at least one item.
    ///
    /// Returns immediately when the queue is already non-empty.  Spurious
    /// wakeups are absorbed by re-checking emptiness.
    pub fn wait(&self) {
        let guard = self.lock();
        let _guard = self
            .ready
            .wait_while(guard, |items| items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`ConcurrentQueue::wait`] but gives up after `timeout`.
    ///
    /// Returns `true` if the queue is non-empty on return.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |items| items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        !guard.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        // A panic in another holder cannot leave the deque half-modified, so
        // the data is still consistent after poisoning.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> ConcurrentQueue<T> {
    /// Returns a copy of the oldest item without removing it.
    pub fn front(&self) -> Option<T> {
        self.lock().front().cloned()
    }

    /// Returns a copy of the newest item without removing it.
    pub fn back(&self) -> Option<T> {
        self.lock().back().cloned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
