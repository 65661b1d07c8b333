use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReceiverError;

/// Listener settings. A running listener keeps the snapshot it was started
/// with; apply changes with `stop` followed by `start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// UDP port bound on all interfaces. Port 0 asks the OS for a free port.
    pub port: u16,
    /// Forward receive-thread diagnostics to the action queue.
    pub logging_enabled: bool,
    /// When false, `start` is a no-op.
    pub enabled: bool,
    /// Upper bound on how long the receive thread waits before checking its
    /// stop signal.
    pub poll_interval_ms: u64,
    /// Capacity of the observation channel created for observation mode.
    pub observation_capacity: usize,
}

impl ListenerConfig {
    pub const DEFAULT_PORT: u16 = 9023;
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5;
    pub const DEFAULT_OBSERVATION_CAPACITY: usize = 1024;

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ReceiverError> {
        let problem = if self.poll_interval_ms == 0 {
            "poll_interval_ms must be greater than zero"
        } else if self.observation_capacity == 0 {
            "observation_capacity must be greater than zero"
        } else {
            return Ok(());
        };
        Err(ReceiverError::InvalidConfig(problem))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            logging_enabled: false,
            enabled: true,
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
            observation_capacity: Self::DEFAULT_OBSERVATION_CAPACITY,
        }
    }
}
