//! Bidirectional in-memory links with genuine blocking waits.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use rdt_lab_engine::{ChannelClosed, ChannelPort};

use crate::fault::{FaultPlan, SimProfile};

/// One end of a simulated link.
///
/// Frames transmitted here run through this end's [`FaultPlan`] before being
/// queued for the peer; received chunks come off an mpsc queue with a real
/// blocking timed wait, so the engine never busy-polls.
pub struct LinkEnd {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    faults: FaultPlan,
    profile: SimProfile,
    rng: StdRng,
}

impl LinkEnd {
    /// Replace the scripted fault plan for frames this end transmits.
    pub fn set_faults(&mut self, faults: FaultPlan) {
        self.faults = faults;
    }

    /// Replace the probabilistic impairment profile (reseeds the RNG).
    pub fn set_profile(&mut self, profile: SimProfile) {
        self.rng = StdRng::seed_from_u64(profile.seed);
        self.profile = profile;
    }
}

/// Create a connected pair of clean link ends.
pub fn link_pair() -> (LinkEnd, LinkEnd) {
    let (a_tx, b_rx) = mpsc::channel();
    let (b_tx, a_rx) = mpsc::channel();
    let end = |tx, rx| LinkEnd {
        tx,
        rx,
        faults: FaultPlan::default(),
        profile: SimProfile::default(),
        rng: StdRng::seed_from_u64(0),
    };
    (end(a_tx, a_rx), end(b_tx, b_rx))
}

impl ChannelPort for LinkEnd {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), ChannelClosed> {
        for chunk in self.faults.apply(bytes, &self.profile, &mut self.rng) {
            self.tx.send(chunk).map_err(|_| ChannelClosed)?;
        }
        Ok(())
    }

    fn recv_timeout(&mut self, wait: Duration) -> Result<Vec<u8>, ChannelClosed> {
        let mut bytes = match self.rx.recv_timeout(wait) {
            Ok(chunk) => chunk,
            Err(RecvTimeoutError::Timeout) => return Ok(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => return Err(ChannelClosed),
        };
        // Merge whatever else is already queued, so the engine sees the
        // same coalesced reads a real byte stream would produce.
        while let Ok(more) = self.rx.try_recv() {
            bytes.extend_from_slice(&more);
        }
        Ok(bytes)
    }
}
