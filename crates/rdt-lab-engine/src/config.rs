use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable timing and retry bounds for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdtConfig {
    /// Hard bound on a `receive` call, and on a Level 1 sender's wait for a
    /// reply, in milliseconds.
    pub receive_timeout_ms: u64,
    /// Retransmission deadline armed per transmission at Level 2, in
    /// milliseconds.
    pub timeout_interval_ms: u64,
    /// Maximum number of timeout-driven retransmissions before a send is
    /// abandoned.
    pub max_retries: u32,
}

impl Default for RdtConfig {
    fn default() -> Self {
        Self {
            receive_timeout_ms: 1000,
            timeout_interval_ms: 250,
            max_retries: 5,
        }
    }
}

impl RdtConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn timeout_interval(&self) -> Duration {
        Duration::from_millis(self.timeout_interval_ms)
    }
}
