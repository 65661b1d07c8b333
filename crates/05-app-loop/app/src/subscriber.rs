//! Owning-thread subscribers.
//!
//! A [`Subscriber`] pairs a registry [`Inbox`] with a transform and a
//! callback. Only the inbox is shared with the receive thread; the callback
//! stays here and is not `Send`, so it can only ever run where `update` is
//! called.

use std::fmt;
use std::sync::Arc;

use log::trace;
use router::{AddressRegistry, Inbox, Remap, Scalar, Scale, Transform};

pub type IntSubscriber = Subscriber<i32>;
pub type FloatSubscriber = Subscriber<f32>;

pub struct Subscriber<T: Scalar> {
    registry: Arc<AddressRegistry>,
    inbox: Arc<Inbox<T>>,
    transform: T::Transform,
    callback: Box<dyn FnMut(T)>,
    active: bool,
}

impl<T: Scalar> Subscriber<T> {
    /// Creates an inactive subscriber; nothing is delivered until
    /// [`activate`](Self::activate).
    pub fn new(
        registry: Arc<AddressRegistry>,
        address: impl Into<String>,
        transform: T::Transform,
        callback: impl FnMut(T) + 'static,
    ) -> Self {
        Self {
            registry,
            inbox: Inbox::new(address),
            transform,
            callback: Box::new(callback),
            active: false,
        }
    }

    /// Registers with the registry. Returns false if already active.
    pub fn activate(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.registry.register(Arc::clone(&self.inbox));
        self.active = true;
        true
    }

    /// Unregisters and discards any undelivered value. Returns false if
    /// already inactive.
    pub fn deactivate(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.registry.unregister(&self.inbox);
        self.inbox.mailbox().clear();
        self.active = false;
        true
    }

    /// Moves the subscriber to `address`. The pending value for the old
    /// address is discarded.
    pub fn set_address(&mut self, address: impl Into<String>) {
        let address = address.into();
        if address == self.inbox.address() {
            return;
        }
        let was_active = self.deactivate();
        self.inbox = Inbox::new(address);
        if was_active {
            self.activate();
        }
    }

    pub fn set_transform(&mut self, transform: T::Transform) {
        self.transform = transform;
    }

    pub fn transform(&self) -> &T::Transform {
        &self.transform
    }

    pub fn address(&self) -> &str {
        self.inbox.address()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drains the mailbox and, if a value was waiting, runs the transformed
    /// value through the callback. Returns whether the callback ran.
    pub fn update(&mut self) -> bool {
        let Some(raw) = self.inbox.try_drain() else {
            return false;
        };
        let value = self.transform.apply(raw);
        trace!("{} {:?} -> {:?}", self.inbox.address(), raw, value);
        (self.callback)(value);
        true
    }
}

impl IntSubscriber {
    /// Int subscriber with a multiplier.
    pub fn scaled(
        registry: Arc<AddressRegistry>,
        address: impl Into<String>,
        multiplier: i32,
        callback: impl FnMut(i32) + 'static,
    ) -> Self {
        Self::new(registry, address, Scale::new(multiplier), callback)
    }
}

impl FloatSubscriber {
    /// Float subscriber with a validated remap.
    pub fn remapped(
        registry: Arc<AddressRegistry>,
        address: impl Into<String>,
        remap: Remap,
        callback: impl FnMut(f32) + 'static,
    ) -> Self {
        Self::new(registry, address, remap, callback)
    }
}

impl<T: Scalar> Drop for Subscriber<T> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl<T: Scalar> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("type", &T::TYPE_NAME)
            .field("address", &self.inbox.address())
            .field("active", &self.active)
            .field("transform", &self.transform)
            .finish()
    }
}
