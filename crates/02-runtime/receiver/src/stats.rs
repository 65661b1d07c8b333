use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the receive thread. They accumulate across runs of
/// the same listener.
#[derive(Debug, Default)]
pub struct ListenerStats {
    datagrams: AtomicU64,
    decode_failures: AtomicU64,
    messages: AtomicU64,
    values_delivered: AtomicU64,
    unsupported_arguments: AtomicU64,
    handler_failures: AtomicU64,
    observations_queued: AtomicU64,
    observations_dropped: AtomicU64,
}

impl ListenerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_datagram(&self) {
        self.datagrams.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_distribution(
        &self,
        messages: usize,
        delivered: usize,
        unsupported: usize,
    ) {
        self.messages.fetch_add(messages as u64, Ordering::Relaxed);
        self.values_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.unsupported_arguments
            .fetch_add(unsupported as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_observation(&self, queued: bool) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        if queued {
            self.observations_queued.fetch_add(1, Ordering::Relaxed);
        } else {
            self.observations_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ListenerStatsSnapshot {
        ListenerStatsSnapshot {
            datagrams: self.datagrams.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            values_delivered: self.values_delivered.load(Ordering::Relaxed),
            unsupported_arguments: self.unsupported_arguments.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            observations_queued: self.observations_queued.load(Ordering::Relaxed),
            observations_dropped: self.observations_dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerStatsSnapshot {
    pub datagrams: u64,
    pub decode_failures: u64,
    pub messages: u64,
    pub values_delivered: u64,
    pub unsupported_arguments: u64,
    pub handler_failures: u64,
    pub observations_queued: u64,
    pub observations_dropped: u64,
}
