//! The boundary to the unreliable channel, plus the shared bounded-wait
//! primitive.

use std::time::{Duration, Instant};

use thiserror::Error;

/// The transport under this endpoint has gone away for good. Distinct from a
/// timeout: a closed channel can never make progress again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("channel closed")]
pub struct ChannelClosed;

/// One directional link of the unreliable channel.
///
/// Implementations are free to lose, corrupt, duplicate or reorder what they
/// carry; the engine assumes nothing beyond delivery being best-effort.
/// Safe for one sender and one reader per link.
pub trait ChannelPort {
    /// Best-effort transmit of an encoded frame.
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), ChannelClosed>;

    /// Wait up to `wait` for inbound bytes.
    ///
    /// Returns whatever is available once anything arrives — possibly a
    /// partial frame, possibly several frames concatenated — or an empty
    /// vector if the wait elapsed in silence. Must block rather than spin.
    fn recv_timeout(&mut self, wait: Duration) -> Result<Vec<u8>, ChannelClosed>;
}

/// An absolute point in time after which a pending wait is abandoned.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(wait: Duration) -> Self {
        Self {
            at: Instant::now() + wait,
        }
    }

    /// Time left before the deadline, or `None` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        if self.at <= now {
            None
        } else {
            Some(self.at - now)
        }
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_has_time_remaining() {
        let deadline = Deadline::after(Duration::from_secs(60));
        assert!(!deadline.expired());
        assert!(deadline.remaining().unwrap() > Duration::from_secs(59));
    }

    #[test]
    fn zero_deadline_expires_immediately() {
        let deadline = Deadline::after(Duration::ZERO);
        assert!(deadline.expired());
        assert_eq!(deadline.remaining(), None);
    }
}
