//! Packet model and the decoder boundary for inbound control datagrams.
//!
//! The receiver consumes datagrams through the [`Decoder`] trait and only ever
//! sees [`Packet`]s. [`OscDecoder`] implements OSC 1.0; [`encode`] produces
//! datagrams in the same format for senders and tests.

mod decode;
mod encode;
mod error;
mod packet;

pub use decode::{Decoder, OscDecoder, BUNDLE_TAG, DEFAULT_MAX_DEPTH};
pub use encode::{encode, encode_message};
pub use error::{WireError, WireResult};
pub use packet::{Arg, Bundle, Message, OtherArg, Packet};
