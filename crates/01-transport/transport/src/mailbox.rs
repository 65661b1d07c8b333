//! Single-slot, coalescing mailbox.
//!
//! A mailbox stores the most recent value written by a producer. Subsequent
//! writes overwrite the previous value and report a `Coalesced` outcome while
//! remaining strictly non-blocking. The consumer always observes the latest
//! value and draining resets the coalescing state.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Outcome reported when writing into the mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MailboxSend {
    /// Value landed in an empty slot.
    Accepted,
    /// Value overwrote a pending value that had not yet been drained.
    Coalesced,
}

/// Coalescing mailbox that retains only the newest value.
///
/// `write` and `try_drain` share one lock, so a drain never observes a
/// partially applied write. The lock is held for a single `Option` swap.
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    coalesced: AtomicU64,
}

impl<T> Mailbox<T> {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            coalesced: AtomicU64::new(0),
        }
    }

    /// Stores `value`, discarding any value the consumer has not drained yet.
    pub fn write(&self, value: T) -> MailboxSend {
        let previous = self.slot.lock().replace(value);
        if previous.is_some() {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            MailboxSend::Coalesced
        } else {
            MailboxSend::Accepted
        }
    }

    /// Takes the pending value, leaving the mailbox empty.
    pub fn try_drain(&self) -> Option<T> {
        self.slot.lock().take()
    }

    /// Returns true when a value is waiting to be drained.
    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Drops any pending value without observing it.
    pub fn clear(&self) {
        self.slot.lock().take();
    }

    /// Number of writes that overwrote an undrained value.
    pub fn coalesced_writes(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Mailbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("pending", &self.is_pending())
            .field("coalesced", &self.coalesced_writes())
            .finish()
    }
}
