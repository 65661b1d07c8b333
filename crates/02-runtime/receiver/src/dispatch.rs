use std::fmt;
use std::sync::Arc;

use router::Distributor;
use transport::Diagnostics;
use wire::Message;

use crate::observe::{Observation, ObservationSink};
use crate::stats::ListenerStats;

/// Caller-supplied message handler run on the receive thread.
pub type MessageHandler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Where the receive thread sends each decoded message.
#[derive(Clone)]
pub enum Dispatch {
    /// Route scalar arguments to registered subscribers.
    Distribute(Distributor),
    /// Record `(address, first argument)` pairs; subscribers are bypassed.
    Observe(ObservationSink),
    /// Hand each message to a custom handler.
    Handler(MessageHandler),
}

impl Dispatch {
    pub fn mode(&self) -> &'static str {
        match self {
            Dispatch::Distribute(_) => "distribute",
            Dispatch::Observe(_) => "observe",
            Dispatch::Handler(_) => "handler",
        }
    }

    /// Processes one message. Panics propagate to the caller, which isolates
    /// them per message.
    pub(crate) fn handle(
        &self,
        message: &Message,
        stats: &ListenerStats,
        diagnostics: &Diagnostics,
    ) {
        match self {
            Dispatch::Distribute(distributor) => {
                let report = distributor.distribute_message(message);
                stats.record_distribution(report.messages, report.delivered, report.errors.len());
                for err in report.errors {
                    diagnostics.warn(err.to_string());
                }
            }
            Dispatch::Observe(sink) => {
                let queued = sink.offer(Observation::from_message(message));
                stats.record_observation(queued);
            }
            Dispatch::Handler(handler) => {
                handler(message);
                stats.record_distribution(1, 0, 0);
            }
        }
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dispatch").field(&self.mode()).finish()
    }
}
