//! Owning-thread side of the control-message engine.
//!
//! Subscribers live here, together with the per-tick drain that hands their
//! pending values to callbacks. [`Bridge`] wires a registry, an action queue,
//! and a listener into one object a host loop can `tick`.

mod bridge;
mod set;
mod subscriber;

pub use bridge::{Bridge, BridgeBuilder, TickReport, DEFAULT_ACTION_CAPACITY};
pub use set::{SubscriberKey, SubscriberSet};
pub use subscriber::{FloatSubscriber, IntSubscriber, Subscriber};

pub use receiver::{ListenerConfig, Observation, StartOutcome};
pub use router::{AddressRegistry, Remap, Scale};
