//! Observation mode: record which addresses arrive without routing values.

use std::fmt;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use wire::Message;

/// One observed message: its address and the first argument as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub address: String,
    /// Empty when the message carried no arguments.
    pub value: String,
}

impl Observation {
    pub fn from_message(message: &Message) -> Self {
        Self {
            address: message.address.clone(),
            value: message
                .args
                .first()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "addr: {} val: {}", self.address, self.value)
    }
}

/// Producer half of the bounded observation channel.
#[derive(Clone, Debug)]
pub struct ObservationSink {
    tx: Sender<Observation>,
}

impl ObservationSink {
    /// Creates a sink and the receiver the owning thread drains.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Observation>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }

    /// Queues an observation without blocking. Returns false when the channel
    /// is full or the receiver is gone.
    pub fn offer(&self, observation: Observation) -> bool {
        match self.tx.try_send(observation) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
