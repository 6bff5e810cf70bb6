use rdt_lab_codec::CodecError;
use thiserror::Error;

use crate::channel::ChannelClosed;

/// Session-level failures surfaced to the application.
///
/// Corruption is always handled inside the engine (NAK-and-continue or
/// resend-and-continue); only a sustained absence of progress reaches the
/// caller. No partial or corrupted payload is ever handed upward.
#[derive(Debug, Error)]
pub enum RdtError {
    /// A damaged or truncated frame was handed directly to the codec.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] CodecError),
    /// No complete valid frame arrived within the timeout window.
    #[error("no complete frame arrived within the timeout window")]
    ReceiveTimeout,
    /// The bounded retransmission count was exceeded.
    #[error("retry budget exhausted after {retries} retransmissions")]
    RetryBudgetExhausted { retries: u32 },
    /// The underlying channel link is gone.
    #[error(transparent)]
    ChannelClosed(#[from] ChannelClosed),
}

impl RdtError {
    /// True for the timeout-class errors a harness maps to a non-zero exit.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            RdtError::ReceiveTimeout | RdtError::RetryBudgetExhausted { .. }
        )
    }
}
