//! Start/stop state machine for the single receive thread.
//!
//! `Stopped → Starting → Running → Stopped`. Every `start` and `stop` bumps a
//! generation counter; the receive thread only writes back into the control
//! block while its generation is still current, so a stale thread can never
//! clobber the state of a newer run.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use transport::{ActionQueue, Diagnostics};
use wire::{Decoder, OscDecoder};

use crate::config::ListenerConfig;
use crate::dispatch::Dispatch;
use crate::error::ReceiverError;
use crate::rx_thread::{self, RxContext};
use crate::stats::{ListenerStats, ListenerStatsSnapshot};

/// Log target for diagnostics the receive thread queues.
pub const DIAGNOSTICS_TARGET: &str = "receiver";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Starting,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new receive thread was spawned.
    Started,
    /// A run is already in progress; nothing changed.
    AlreadyRunning,
    /// `config.enabled` was false; nothing changed.
    Disabled,
}

struct Control {
    state: ListenerState,
    generation: u64,
    local_addr: Option<SocketAddr>,
    config: Option<ListenerConfig>,
}

/// State shared with the receive thread.
pub(crate) struct Shared {
    control: Mutex<Control>,
    changed: Condvar,
    stats: ListenerStats,
}

impl Shared {
    pub(crate) fn stats(&self) -> &ListenerStats {
        &self.stats
    }

    pub(crate) fn mark_bound(&self, generation: u64, addr: SocketAddr) {
        let mut control = self.control.lock();
        if control.generation == generation {
            control.local_addr = Some(addr);
            self.changed.notify_all();
        }
    }

    pub(crate) fn mark_failed(&self, generation: u64) {
        let mut control = self.control.lock();
        if control.generation == generation {
            control.state = ListenerState::Stopped;
            control.local_addr = None;
            control.config = None;
            self.changed.notify_all();
        }
    }
}

struct Run {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owns at most one receive thread and its config snapshot.
///
/// Lifecycle calls take `&mut self`: they belong to the owning thread.
/// Dropping the listener signals the thread to stop without waiting; use
/// [`Listener::shutdown`] to wait for it.
pub struct Listener {
    shared: Arc<Shared>,
    queue: Arc<ActionQueue>,
    decoder: Arc<dyn Decoder>,
    run: Option<Run>,
}

impl Listener {
    /// Creates a stopped listener that decodes OSC 1.0 and reports
    /// diagnostics into `queue`.
    pub fn new(queue: Arc<ActionQueue>) -> Self {
        Self {
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    state: ListenerState::Stopped,
                    generation: 0,
                    local_addr: None,
                    config: None,
                }),
                changed: Condvar::new(),
                stats: ListenerStats::new(),
            }),
            queue,
            decoder: Arc::new(OscDecoder::new()),
            run: None,
        }
    }

    /// Replaces the decoder used by subsequent runs.
    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Spawns the receive thread for `config`.
    ///
    /// Binding happens on the new thread; a bind failure is reported through
    /// the action queue (when logging is enabled) and returns the listener to
    /// `Stopped`. A running or disabled listener returns before `config` is
    /// validated.
    pub fn start(
        &mut self,
        config: ListenerConfig,
        dispatch: Dispatch,
    ) -> Result<StartOutcome, ReceiverError> {
        let generation = {
            let mut control = self.shared.control.lock();
            if control.state != ListenerState::Stopped {
                let port = control.config.as_ref().map(|c| c.port);
                warn!("listener already running on port {port:?}");
                return Ok(StartOutcome::AlreadyRunning);
            }
            if !config.enabled {
                info!("listener disabled by config; not starting");
                return Ok(StartOutcome::Disabled);
            }
            config.validate()?;
            control.generation += 1;
            control.state = ListenerState::Starting;
            control.local_addr = None;
            control.config = Some(config.clone());
            control.generation
        };

        // The previous thread was already signalled; it exits within one
        // poll interval.
        self.join_previous();

        let stop = Arc::new(AtomicBool::new(false));
        let diagnostics = if config.logging_enabled {
            Diagnostics::new(Arc::clone(&self.queue), DIAGNOSTICS_TARGET)
        } else {
            Diagnostics::disabled()
        };
        let port = config.port;
        let ctx = RxContext {
            generation,
            config,
            dispatch,
            decoder: Arc::clone(&self.decoder),
            stop: Arc::clone(&stop),
            shared: Arc::clone(&self.shared),
            diagnostics,
        };

        let mut control = self.shared.control.lock();
        let spawned = thread::Builder::new()
            .name(format!("osc-rx-{port}"))
            .spawn(move || rx_thread::run(ctx));
        match spawned {
            Ok(handle) => {
                if control.state == ListenerState::Starting {
                    control.state = ListenerState::Running;
                }
                self.run = Some(Run { stop, handle });
                info!("listener started on port {port}");
                Ok(StartOutcome::Started)
            }
            Err(err) => {
                control.state = ListenerState::Stopped;
                control.config = None;
                self.shared.changed.notify_all();
                Err(ReceiverError::Spawn(err))
            }
        }
    }

    /// Signals the receive thread to stop. Does not wait for it.
    /// Returns false if the listener was already stopped.
    pub fn stop(&mut self) -> bool {
        if let Some(run) = &self.run {
            run.stop.store(true, Ordering::Release);
        }
        let mut control = self.shared.control.lock();
        if control.state == ListenerState::Stopped {
            return false;
        }
        control.generation += 1;
        control.state = ListenerState::Stopped;
        control.local_addr = None;
        control.config = None;
        self.shared.changed.notify_all();
        info!("listener stopped");
        true
    }

    /// Stops and waits for the receive thread to exit.
    pub fn shutdown(&mut self) {
        self.stop();
        self.join_previous();
    }

    /// `stop` followed by `start` with a new snapshot.
    pub fn restart(
        &mut self,
        config: ListenerConfig,
        dispatch: Dispatch,
    ) -> Result<StartOutcome, ReceiverError> {
        self.stop();
        self.start(config, dispatch)
    }

    pub fn state(&self) -> ListenerState {
        self.shared.control.lock().state
    }

    pub fn is_listening(&self) -> bool {
        self.state() == ListenerState::Running
    }

    /// Config snapshot of the current run.
    pub fn config(&self) -> Option<ListenerConfig> {
        self.shared.control.lock().config.clone()
    }

    /// Address the current run is bound to, once binding has succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.shared.control.lock().local_addr
    }

    /// Blocks until the current run has bound its socket, has failed, or
    /// `timeout` elapses.
    pub fn wait_until_bound(&self, timeout: Duration) -> Option<SocketAddr> {
        let deadline = Instant::now() + timeout;
        let mut control = self.shared.control.lock();
        while control.state != ListenerState::Stopped && control.local_addr.is_none() {
            let waited = self.shared.changed.wait_until(&mut control, deadline);
            if waited.timed_out() {
                break;
            }
        }
        control.local_addr
    }

    pub fn stats(&self) -> ListenerStatsSnapshot {
        self.shared.stats.snapshot()
    }

    fn join_previous(&mut self) {
        if let Some(run) = self.run.take() {
            run.stop.store(true, Ordering::Release);
            if run.handle.join().is_err() {
                debug!("previous receive thread panicked");
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(run) = &self.run {
            run.stop.store(true, Ordering::Release);
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.shared.control.lock();
        f.debug_struct("Listener")
            .field("state", &control.state)
            .field("generation", &control.generation)
            .field("local_addr", &control.local_addr)
            .finish()
    }
}
