//! UDP listener lifecycle and the receive thread.
//!
//! A [`Listener`] owns at most one background thread. The thread decodes each
//! datagram and dispatches its messages inline, either into a
//! [`router::Distributor`] or into an observation channel. Diagnostics raised
//! on the thread are queued on a [`transport::ActionQueue`] so they are logged
//! from the owning thread's tick.

mod config;
mod dispatch;
mod error;
mod lifecycle;
mod observe;
mod rx_thread;
mod stats;

pub use config::ListenerConfig;
pub use dispatch::{Dispatch, MessageHandler};
pub use error::ReceiverError;
pub use lifecycle::{Listener, ListenerState, StartOutcome, DIAGNOSTICS_TARGET};
pub use observe::{Observation, ObservationSink};
pub use stats::{ListenerStats, ListenerStatsSnapshot};
