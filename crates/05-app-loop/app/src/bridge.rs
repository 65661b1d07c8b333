//! Host-facing facade: one registry, one action queue, one listener, and the
//! subscribers drained on the host's tick.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use log::debug;
use receiver::{
    Dispatch, Listener, ListenerConfig, Observation, ObservationSink, ReceiverError, StartOutcome,
};
use router::{AddressRegistry, Distributor, Remap, Scale};
use transport::ActionQueue;
use wire::Decoder;

use crate::set::{SubscriberKey, SubscriberSet};
use crate::subscriber::{FloatSubscriber, IntSubscriber};

/// Default cap on queued receive-thread diagnostics.
pub const DEFAULT_ACTION_CAPACITY: usize = 4096;

/// Work performed by one [`Bridge::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Subscriber callbacks invoked.
    pub callbacks: usize,
    /// Deferred actions invoked.
    pub actions: usize,
}

pub struct Bridge {
    registry: Arc<AddressRegistry>,
    queue: Arc<ActionQueue>,
    listener: Listener,
    subscribers: SubscriberSet,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    pub fn new() -> Self {
        BridgeBuilder::new().build()
    }

    pub fn registry(&self) -> &Arc<AddressRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &Arc<ActionQueue> {
        &self.queue
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Starts the listener in distribution mode.
    pub fn start(&mut self, config: ListenerConfig) -> Result<StartOutcome, ReceiverError> {
        let distributor = Distributor::new(Arc::clone(&self.registry));
        let dispatch = Dispatch::Distribute(distributor);
        self.listener.start(config, dispatch)
    }

    /// Starts the listener in observation mode. The returned receiver yields
    /// one [`Observation`] per message; subscribers receive nothing.
    pub fn observe(
        &mut self,
        config: ListenerConfig,
    ) -> Result<(StartOutcome, Receiver<Observation>), ReceiverError> {
        let (sink, rx) = ObservationSink::bounded(config.observation_capacity.max(1));
        let outcome = self.listener.start(config, Dispatch::Observe(sink))?;
        Ok((outcome, rx))
    }

    pub fn stop(&mut self) -> bool {
        self.listener.stop()
    }

    /// Stops the listener and waits for its thread, then runs any diagnostics
    /// it queued on the way out.
    pub fn shutdown(&mut self) {
        self.listener.shutdown();
        self.queue.drain_and_invoke();
    }

    /// Registers an active int subscriber.
    pub fn subscribe_int(
        &mut self,
        address: impl Into<String>,
        scale: Scale,
        callback: impl FnMut(i32) + 'static,
    ) -> SubscriberKey<i32> {
        let mut sub = IntSubscriber::new(Arc::clone(&self.registry), address, scale, callback);
        sub.activate();
        self.subscribers.insert(sub)
    }

    /// Registers an active float subscriber.
    pub fn subscribe_float(
        &mut self,
        address: impl Into<String>,
        remap: Remap,
        callback: impl FnMut(f32) + 'static,
    ) -> SubscriberKey<f32> {
        let mut sub = FloatSubscriber::new(Arc::clone(&self.registry), address, remap, callback);
        sub.activate();
        self.subscribers.insert(sub)
    }

    pub fn subscribers(&self) -> &SubscriberSet {
        &self.subscribers
    }

    pub fn subscribers_mut(&mut self) -> &mut SubscriberSet {
        &mut self.subscribers
    }

    /// Per-frame entry point: deliver pending values, then run deferred
    /// actions.
    pub fn tick(&mut self) -> TickReport {
        let report = TickReport {
            callbacks: self.subscribers.update_all(),
            actions: self.queue.drain_and_invoke(),
        };
        if report != TickReport::default() {
            debug!(
                "tick: {} callbacks, {} actions",
                report.callbacks, report.actions
            );
        }
        report
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BridgeBuilder {
    action_capacity: Option<usize>,
    decoder: Option<Arc<dyn Decoder>>,
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self {
            action_capacity: Some(DEFAULT_ACTION_CAPACITY),
            decoder: None,
        }
    }

    /// Caps pending diagnostics; `None` leaves the queue unbounded.
    pub fn action_capacity(mut self, capacity: Option<usize>) -> Self {
        self.action_capacity = capacity;
        self
    }

    /// Replaces the OSC decoder on the listener.
    pub fn decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    pub fn build(self) -> Bridge {
        let queue = Arc::new(match self.action_capacity {
            Some(capacity) => ActionQueue::bounded(capacity),
            None => ActionQueue::new(),
        });
        let mut listener = Listener::new(Arc::clone(&queue));
        if let Some(decoder) = self.decoder {
            listener = listener.with_decoder(decoder);
        }
        Bridge {
            registry: Arc::new(AddressRegistry::new()),
            queue,
            listener,
            subscribers: SubscriberSet::new(),
        }
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
