use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use router::Scalar;

use crate::subscriber::Subscriber;

/// Typed handle to a subscriber held by a [`SubscriberSet`].
pub struct SubscriberKey<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for SubscriberKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SubscriberKey<T> {}

impl<T> PartialEq for SubscriberKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for SubscriberKey<T> {}

impl<T> fmt::Debug for SubscriberKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriberKey({})", self.id)
    }
}

trait Slot {
    fn update(&mut self) -> bool;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Scalar> Slot for Subscriber<T> {
    fn update(&mut self) -> bool {
        Subscriber::update(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Subscribers drained together once per tick, in insertion order.
#[derive(Default)]
pub struct SubscriberSet {
    slots: BTreeMap<u64, Box<dyn Slot>>,
    next_id: u64,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Scalar>(&mut self, subscriber: Subscriber<T>) -> SubscriberKey<T> {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.insert(id, Box::new(subscriber));
        SubscriberKey {
            id,
            _marker: PhantomData,
        }
    }

    pub fn get_mut<T: Scalar>(&mut self, key: SubscriberKey<T>) -> Option<&mut Subscriber<T>> {
        self.slots
            .get_mut(&key.id)?
            .as_any_mut()
            .downcast_mut::<Subscriber<T>>()
    }

    /// Removes and drops the subscriber, which unregisters it.
    pub fn remove<T: Scalar>(&mut self, key: SubscriberKey<T>) -> bool {
        self.slots.remove(&key.id).is_some()
    }

    /// Runs `update` on every subscriber. Returns how many callbacks ran.
    pub fn update_all(&mut self) -> usize {
        self.slots
            .values_mut()
            .map(|slot| slot.update())
            .filter(|ran| *ran)
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("len", &self.slots.len())
            .finish()
    }
}
