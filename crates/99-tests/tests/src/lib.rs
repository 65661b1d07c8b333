//! End-to-end scenarios: real UDP sockets on loopback, a live receive thread,
//! and an owning thread ticking subscribers.

#[cfg(all(test, not(target_arch = "wasm32")))]
mod native_e2e;
