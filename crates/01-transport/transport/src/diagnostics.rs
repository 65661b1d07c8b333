//! Diagnostics raised off the owning thread and logged on it.

use std::sync::Arc;

use log::Level;

use crate::action_queue::{ActionQueue, EnqueueOutcome};

/// Handle that turns diagnostics into deferred log calls.
///
/// A disabled handle drops every report, which is how a run with logging
/// turned off stays silent without branching at each call site.
#[derive(Clone)]
pub struct Diagnostics {
    queue: Option<Arc<ActionQueue>>,
    target: &'static str,
}

impl Diagnostics {
    /// Routes reports into `queue`, logged under `target` once drained.
    pub fn new(queue: Arc<ActionQueue>, target: &'static str) -> Self {
        Self {
            queue: Some(queue),
            target,
        }
    }

    /// Handle that discards every report.
    pub fn disabled() -> Self {
        Self {
            queue: None,
            target: "",
        }
    }

    /// Returns true when reports reach a queue.
    pub fn is_enabled(&self) -> bool {
        self.queue.is_some()
    }

    /// Queues a log record at `level`. Returns true if the record was queued.
    pub fn report(&self, level: Level, message: impl Into<String>) -> bool {
        let Some(queue) = &self.queue else {
            return false;
        };
        let message = message.into();
        let target = self.target;
        let outcome = queue.enqueue(move || {
            log::log!(target: target, level, "{message}");
        });
        outcome == EnqueueOutcome::Accepted
    }

    pub fn info(&self, message: impl Into<String>) -> bool {
        self.report(Level::Info, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> bool {
        self.report(Level::Warn, message)
    }

    pub fn error(&self, message: impl Into<String>) -> bool {
        self.report(Level::Error, message)
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("enabled", &self.is_enabled())
            .field("target", &self.target)
            .finish()
    }
}
