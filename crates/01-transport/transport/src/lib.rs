//! Thread-bridging primitives shared by the receiver and the app loop.
//!
//! * [`Mailbox`] – single-slot, latest-value-wins handoff from the receive
//!   thread to the owning thread.
//! * [`ActionQueue`] – FIFO of deferred closures drained once per tick.
//! * [`Diagnostics`] – log records raised anywhere, emitted on the owning thread.

mod action_queue;
mod diagnostics;
mod mailbox;

pub use action_queue::{panic_message, Action, ActionQueue, EnqueueOutcome};
pub use diagnostics::Diagnostics;
pub use mailbox::{Mailbox, MailboxSend};
