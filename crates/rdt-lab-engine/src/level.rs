//! Protocol levels and their capability profiles.
//!
//! The three classical RDT variants are one engine with three capability
//! sets, not three copies of the state machine.

/// What a given protocol level is allowed to assume broken about the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The sender awaits a control reply per frame and the receiver
    /// acknowledges and de-duplicates by sequence number.
    pub corruption_detection: bool,
    /// The receiver answers damaged frames with an explicit NAK.
    pub nak_on_corruption: bool,
    /// The sender arms a retransmission deadline and resends into silence.
    pub retransmit_on_timeout: bool,
}

/// The escalating reliability levels offered by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdtLevel {
    /// Fire-and-forget: assumes the channel never corrupts, drops or
    /// duplicates.
    Unreliable,
    /// Stop-and-wait with ACK/NAK and duplicate suppression; handles
    /// corruption but blocks on genuine loss until the hard receive timeout.
    StopAndWait,
    /// Stop-and-wait plus a retransmission timer: recovers from a lost
    /// frame or a lost acknowledgment, bounded by the retry budget.
    StopAndWaitTimeout,
}

impl RdtLevel {
    pub fn capabilities(self) -> Capabilities {
        match self {
            RdtLevel::Unreliable => Capabilities {
                corruption_detection: false,
                nak_on_corruption: false,
                retransmit_on_timeout: false,
            },
            RdtLevel::StopAndWait => Capabilities {
                corruption_detection: true,
                nak_on_corruption: true,
                retransmit_on_timeout: false,
            },
            RdtLevel::StopAndWaitTimeout => Capabilities {
                corruption_detection: true,
                nak_on_corruption: true,
                retransmit_on_timeout: true,
            },
        }
    }
}
