//! Cross-thread FIFO of deferred actions.
//!
//! Producers on any thread enqueue boxed closures; the owning thread invokes
//! them once per tick via [`ActionQueue::drain_and_invoke`]. This keeps side
//! effects such as logging or host API calls pinned to the owning thread.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use log::error;
use parking_lot::Mutex;

/// Deferred zero-argument action.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Outcome reported by [`ActionQueue::enqueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The action will run on the next drain.
    Accepted,
    /// The queue was at capacity; the action was discarded.
    Dropped,
}

/// Thread-safe FIFO of deferred actions.
pub struct ActionQueue {
    pending: Mutex<VecDeque<Action>>,
    capacity: Option<usize>,
}

impl ActionQueue {
    /// Creates an unbounded queue.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            capacity: None,
        }
    }

    /// Creates a queue that refuses new actions once `capacity` are pending.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: Some(capacity),
        }
    }

    /// Appends an action to the tail of the queue.
    pub fn enqueue<F>(&self, action: F) -> EnqueueOutcome
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some(capacity) = self.capacity {
            if pending.len() >= capacity {
                return EnqueueOutcome::Dropped;
            }
        }
        pending.push_back(Box::new(action));
        EnqueueOutcome::Accepted
    }

    /// Invokes every action that was pending when the call started, in FIFO order.
    ///
    /// Actions enqueued while draining (including by the actions themselves)
    /// wait for the next call. A panicking action is logged and skipped.
    /// Returns the number of actions taken from the queue.
    pub fn drain_and_invoke(&self) -> usize {
        let batch = std::mem::take(&mut *self.pending.lock());
        let count = batch.len();
        for (idx, action) in batch.into_iter().enumerate() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(action)) {
                error!(
                    "deferred action {idx} of {count} panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
        count
    }

    /// Number of actions waiting for the next drain.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns true when no actions are waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort rendering of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
