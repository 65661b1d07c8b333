//! Address → subscriber routing tables.
//!
//! Each value type has its own table guarded by its own mutex. Buckets are
//! copy-on-write slices: registration churn is rare, so `register` and
//! `unregister` rebuild the affected bucket while a broadcast only clones
//! the bucket's `Arc` under the lock and writes mailboxes after releasing it.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::trace;
use parking_lot::Mutex;
use transport::{Mailbox, MailboxSend};

use crate::transform::{Remap, Scale, Transform};

/// Process-unique identity of one registered inbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SubscriberId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Value types the registry partitions subscribers by.
pub trait Scalar: Copy + Send + Sync + fmt::Debug + 'static {
    /// Transform applied by subscribers of this type.
    type Transform: Transform<Self> + Clone + fmt::Debug + 'static;

    const TYPE_NAME: &'static str;

    fn table(registry: &AddressRegistry) -> &Table<Self>;
}

impl Scalar for i32 {
    type Transform = Scale;
    const TYPE_NAME: &'static str = "int32";

    fn table(registry: &AddressRegistry) -> &Table<Self> {
        &registry.ints
    }
}

impl Scalar for f32 {
    type Transform = Remap;
    const TYPE_NAME: &'static str = "float32";

    fn table(registry: &AddressRegistry) -> &Table<Self> {
        &registry.floats
    }
}

/// The receive-thread-facing half of a subscriber: its address and mailbox.
///
/// An inbox's address never changes; retargeting a subscriber swaps in a new
/// inbox, which also discards whatever the old one held.
pub struct Inbox<T> {
    id: SubscriberId,
    address: String,
    mailbox: Mailbox<T>,
}

impl<T> Inbox<T> {
    pub fn new(address: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: SubscriberId::next(),
            address: address.into(),
            mailbox: Mailbox::new(),
        })
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn mailbox(&self) -> &Mailbox<T> {
        &self.mailbox
    }

    pub fn write(&self, value: T) -> MailboxSend {
        self.mailbox.write(value)
    }

    pub fn try_drain(&self) -> Option<T> {
        self.mailbox.try_drain()
    }
}

impl<T> fmt::Debug for Inbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbox")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("mailbox", &self.mailbox)
            .finish()
    }
}

type Bucket<T> = Arc<[Arc<Inbox<T>>]>;

/// Address → inboxes for one value type.
pub struct Table<T> {
    buckets: Mutex<HashMap<String, Bucket<T>>>,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn insert(&self, inbox: Arc<Inbox<T>>) -> bool {
        let mut buckets = self.buckets.lock();
        let bucket = buckets
            .entry(inbox.address.clone())
            .or_insert_with(|| Arc::from(Vec::new()));
        if bucket.iter().any(|existing| existing.id == inbox.id) {
            return false;
        }
        let mut next = Vec::with_capacity(bucket.len() + 1);
        next.extend(bucket.iter().cloned());
        next.push(inbox);
        *bucket = Arc::from(next);
        true
    }

    fn remove(&self, inbox: &Inbox<T>) -> bool {
        let mut buckets = self.buckets.lock();
        let Some(bucket) = buckets.get_mut(inbox.address()) else {
            return false;
        };
        if !bucket.iter().any(|existing| existing.id == inbox.id) {
            return false;
        }
        let next: Vec<_> = bucket
            .iter()
            .filter(|existing| existing.id != inbox.id)
            .cloned()
            .collect();
        if next.is_empty() {
            buckets.remove(inbox.address());
        } else {
            *bucket = Arc::from(next);
        }
        true
    }

    fn snapshot(&self, address: &str) -> Option<Bucket<T>> {
        self.buckets.lock().get(address).cloned()
    }

    fn broadcast(&self, address: &str, value: T) -> usize
    where
        T: Copy,
    {
        let Some(bucket) = self.snapshot(address) else {
            return 0;
        };
        for inbox in bucket.iter() {
            inbox.write(value);
        }
        bucket.len()
    }

    fn len_at(&self, address: &str) -> usize {
        self.buckets.lock().get(address).map_or(0, |b| b.len())
    }

    fn addresses(&self) -> Vec<String> {
        let mut out: Vec<String> = self.buckets.lock().keys().cloned().collect();
        out.sort();
        out
    }

    fn total(&self) -> usize {
        self.buckets.lock().values().map(|b| b.len()).sum()
    }
}

/// Shared routing state: one table per value type.
///
/// Cloned as `Arc<AddressRegistry>` into the distributor (receive thread) and
/// every subscriber (owning thread).
pub struct AddressRegistry {
    ints: Table<i32>,
    floats: Table<f32>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self {
            ints: Table::new(),
            floats: Table::new(),
        }
    }

    /// Adds `inbox` to the bucket for its address. Returns false if it was
    /// already registered.
    pub fn register<T: Scalar>(&self, inbox: Arc<Inbox<T>>) -> bool {
        trace!(
            "register {} {} at {}",
            T::TYPE_NAME,
            inbox.id(),
            inbox.address()
        );
        T::table(self).insert(inbox)
    }

    /// Removes exactly this inbox; other inboxes at the same address stay.
    /// Empty buckets are pruned. Returns false if it was not registered.
    pub fn unregister<T: Scalar>(&self, inbox: &Inbox<T>) -> bool {
        trace!(
            "unregister {} {} at {}",
            T::TYPE_NAME,
            inbox.id(),
            inbox.address()
        );
        T::table(self).remove(inbox)
    }

    /// Writes `value` into every inbox registered at `address` for `T`.
    /// Returns how many inboxes were written; an unknown address yields 0.
    pub fn lookup_and_broadcast<T: Scalar>(&self, address: &str, value: T) -> usize {
        T::table(self).broadcast(address, value)
    }

    /// Number of `T` subscribers registered at `address`.
    pub fn subscriber_count<T: Scalar>(&self, address: &str) -> usize {
        T::table(self).len_at(address)
    }

    /// Returns true when at least one `T` subscriber listens on `address`.
    pub fn contains<T: Scalar>(&self, address: &str) -> bool {
        self.subscriber_count::<T>(address) > 0
    }

    /// Sorted addresses that have at least one `T` subscriber.
    pub fn addresses<T: Scalar>(&self) -> Vec<String> {
        T::table(self).addresses()
    }

    /// Total registered inboxes across both tables.
    pub fn len(&self) -> usize {
        self.ints.total() + self.floats.total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AddressRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AddressRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressRegistry")
            .field("int_addresses", &self.ints.addresses())
            .field("float_addresses", &self.floats.addresses())
            .finish()
    }
}
