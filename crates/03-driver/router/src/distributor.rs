//! Receive-thread side of routing: scalar arguments → subscriber mailboxes.

use std::sync::Arc;

use log::{debug, trace};
use smallvec::SmallVec;
use wire::{Arg, Message, Packet};

use crate::error::DistributeError;
use crate::registry::AddressRegistry;

/// Narrows a double argument for float subscribers. Values outside the `f32`
/// range become infinities; precision loss is accepted.
pub fn narrow_double(value: f64) -> f32 {
    value as f32
}

/// Outcome of distributing one packet.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Distribution {
    /// Messages visited, in packet order.
    pub messages: usize,
    /// Mailbox writes performed.
    pub delivered: usize,
    /// Arguments that could not be routed. Siblings are still processed.
    pub errors: SmallVec<[DistributeError; 2]>,
}

impl Distribution {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn absorb(&mut self, other: Distribution) {
        self.messages += other.messages;
        self.delivered += other.delivered;
        self.errors.extend(other.errors);
    }
}

/// Routes decoded messages into the shared [`AddressRegistry`].
#[derive(Clone, Debug)]
pub struct Distributor {
    registry: Arc<AddressRegistry>,
}

impl Distributor {
    pub fn new(registry: Arc<AddressRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<AddressRegistry> {
        &self.registry
    }

    /// Routes one argument to the subscribers of `address`.
    ///
    /// Int goes to int subscribers; Float and Double go to float subscribers.
    /// Any other type is an error for this argument only.
    pub fn broadcast(
        &self,
        address: &str,
        index: usize,
        arg: &Arg,
    ) -> Result<usize, DistributeError> {
        let registry = &self.registry;
        match *arg {
            Arg::Int(value) => Ok(registry.lookup_and_broadcast(address, value)),
            Arg::Float(value) => Ok(registry.lookup_and_broadcast(address, value)),
            Arg::Double(value) => {
                let value = narrow_double(value);
                Ok(registry.lookup_and_broadcast(address, value))
            }
            Arg::Other(ref other) => Err(DistributeError::UnsupportedArgument {
                address: address.to_owned(),
                index,
                type_name: other.type_name(),
                tag: other.tag(),
            }),
        }
    }

    /// Routes every argument of `message` in order. Later arguments at the
    /// same address overwrite earlier ones in the mailbox.
    pub fn distribute_message(&self, message: &Message) -> Distribution {
        let mut out = Distribution {
            messages: 1,
            ..Distribution::default()
        };
        for (index, arg) in message.args.iter().enumerate() {
            match self.broadcast(&message.address, index, arg) {
                Ok(written) => out.delivered += written,
                Err(err) => {
                    debug!("{err}");
                    out.errors.push(err);
                }
            }
        }
        trace!(
            "{} args={} delivered={}",
            message.address,
            message.args.len(),
            out.delivered
        );
        out
    }

    /// Routes a message or every message of a bundle, in bundle order.
    pub fn distribute(&self, packet: &Packet) -> Distribution {
        let mut out = Distribution::default();
        for message in packet.messages() {
            out.absorb(self.distribute_message(message));
        }
        out
    }
}
