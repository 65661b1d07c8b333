//! Address routing between the receive thread and subscriber owners.
//!
//! The [`Distributor`] runs on the receive thread and writes scalar argument
//! values into per-subscriber mailboxes found through the shared
//! [`AddressRegistry`]. Owners drain those mailboxes on their own thread and
//! apply a [`Transform`] before invoking callbacks.

mod distributor;
mod error;
mod registry;
mod transform;

pub use distributor::{narrow_double, Distribution, Distributor};
pub use error::{DistributeError, TransformError};
pub use registry::{AddressRegistry, Inbox, Scalar, SubscriberId, Table};
pub use transform::{Remap, Scale, Transform};
