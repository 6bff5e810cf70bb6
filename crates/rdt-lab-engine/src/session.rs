//! The per-endpoint session: two directional links and the stop-and-wait
//! state machine driven over them.

use tracing::debug;

use rdt_lab_codec::{Frame, FrameBuffer};

use crate::channel::{ChannelPort, Deadline};
use crate::config::RdtConfig;
use crate::error::RdtError;
use crate::level::{Capabilities, RdtLevel};

/// One directional link: a channel port plus its own receive buffer.
///
/// Buffers are owned per link, never shared; a session's send path and
/// receive path cannot bleed bytes into each other.
struct Link<C: ChannelPort> {
    port: C,
    buffer: FrameBuffer,
}

/// Outcome of draining the link for one complete raw frame.
enum RawRead {
    /// A whole frame, boundary-valid but not yet integrity-checked.
    Frame(Vec<u8>),
    /// The byte stream lost its framing and had to be discarded.
    Garbled,
    /// The deadline elapsed in silence.
    TimedOut,
}

impl<C: ChannelPort> Link<C> {
    fn new(port: C) -> Self {
        Self {
            port,
            buffer: FrameBuffer::new(),
        }
    }

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), RdtError> {
        self.port.transmit(bytes)?;
        Ok(())
    }

    fn send_frame(&mut self, frame: &Frame) -> Result<(), RdtError> {
        self.send_bytes(&frame.encode())
    }

    /// Pull the next complete raw frame, waiting at most until `deadline`.
    fn next_raw_frame(&mut self, deadline: Deadline) -> Result<RawRead, RdtError> {
        loop {
            match self.buffer.take_frame() {
                Ok(Some(raw)) => return Ok(RawRead::Frame(raw.to_vec())),
                Ok(None) => {}
                Err(err) => {
                    debug!("discarding unframeable bytes: {}", err);
                    return Ok(RawRead::Garbled);
                }
            }
            let Some(wait) = deadline.remaining() else {
                return Ok(RawRead::TimedOut);
            };
            let chunk = self.port.recv_timeout(wait)?;
            if !chunk.is_empty() {
                self.buffer.extend(&chunk);
            }
        }
    }
}

/// A reliable-data-transfer endpoint over two directional links.
///
/// `outbound` carries this endpoint's data frames out and the peer's control
/// replies back; `inbound` carries the peer's data in and this endpoint's
/// replies out. The session is a single-threaded state machine: interleaving
/// two sends without external serialization would violate the stop-and-wait
/// invariant of at most one unacknowledged frame outstanding.
pub struct RdtSession<C: ChannelPort> {
    level: RdtLevel,
    caps: Capabilities,
    config: RdtConfig,
    outbound: Link<C>,
    inbound: Link<C>,
    /// Next sequence number to send: monotonic at Level 0, an alternating
    /// bit once acknowledgments are in play.
    next_seq: u64,
    /// Sequence number the receive path currently expects.
    expected_seq: u64,
}

impl<C: ChannelPort> RdtSession<C> {
    pub fn new(level: RdtLevel, config: RdtConfig, outbound: C, inbound: C) -> Self {
        Self {
            level,
            caps: level.capabilities(),
            config,
            outbound: Link::new(outbound),
            inbound: Link::new(inbound),
            next_seq: 0,
            expected_seq: 0,
        }
    }

    pub fn level(&self) -> RdtLevel {
        self.level
    }

    /// Send one application message reliably (to the degree the level
    /// supports).
    ///
    /// Blocks until the message is acknowledged, or fails with a
    /// timeout-class error once the configured bounds are exhausted. The
    /// sender never changes the sequence number on a resend, whatever
    /// triggered it; only the receiver advances expectations.
    pub fn send(&mut self, message: &[u8]) -> Result<(), RdtError> {
        let frame = Frame::new(self.next_seq, message.to_vec());
        let wire = frame.encode();
        debug!("sending seq {} ({} bytes)", frame.seq, message.len());
        self.outbound.send_bytes(&wire)?;

        if !self.caps.corruption_detection {
            self.next_seq += 1;
            return Ok(());
        }

        self.await_acknowledgment(frame.seq, &wire)?;
        // Alternate the outstanding bit; one frame in flight at a time.
        self.next_seq = 1 - self.next_seq;
        Ok(())
    }

    /// Stop-and-wait reply loop for the frame just put on the wire.
    fn await_acknowledgment(&mut self, seq: u64, wire: &[u8]) -> Result<(), RdtError> {
        let mut retries = 0u32;
        let mut deadline = self.reply_deadline();
        loop {
            match self.outbound.next_raw_frame(deadline)? {
                RawRead::TimedOut => {
                    if !self.caps.retransmit_on_timeout {
                        debug!("no reply for seq {} within the hard timeout", seq);
                        return Err(RdtError::ReceiveTimeout);
                    }
                    if retries >= self.config.max_retries {
                        debug!("abandoning seq {} after {} retransmissions", seq, retries);
                        return Err(RdtError::RetryBudgetExhausted { retries });
                    }
                    retries += 1;
                    debug!(
                        "reply deadline elapsed, retransmitting seq {} (retry {}/{})",
                        seq, retries, self.config.max_retries
                    );
                    self.outbound.send_bytes(wire)?;
                    deadline = self.reply_deadline();
                }
                RawRead::Garbled => {
                    debug!("garbled reply stream for seq {}, resending", seq);
                    self.resend(wire, &mut deadline)?;
                }
                RawRead::Frame(raw) => match Frame::decode(&raw) {
                    Err(_) => {
                        debug!("corrupt reply for seq {}, resending", seq);
                        self.resend(wire, &mut deadline)?;
                    }
                    Ok(reply) if reply.is_ack() => {
                        debug!("seq {} acknowledged", seq);
                        return Ok(());
                    }
                    Ok(reply) if reply.is_nak() => {
                        debug!("NAK for seq {}, resending", seq);
                        self.resend(wire, &mut deadline)?;
                    }
                    Ok(reply) => {
                        debug!(
                            "unexpected reply payload ({} bytes) for seq {}, resending",
                            reply.payload.len(),
                            seq
                        );
                        self.resend(wire, &mut deadline)?;
                    }
                },
            }
        }
    }

    /// Resend after a received-but-damaged or negative reply. Re-arms the
    /// retransmission deadline at Level 2; Level 1 keeps running against its
    /// hard timeout.
    fn resend(&mut self, wire: &[u8], deadline: &mut Deadline) -> Result<(), RdtError> {
        self.outbound.send_bytes(wire)?;
        if self.caps.retransmit_on_timeout {
            *deadline = self.reply_deadline();
        }
        Ok(())
    }

    fn reply_deadline(&self) -> Deadline {
        if self.caps.retransmit_on_timeout {
            Deadline::after(self.config.timeout_interval())
        } else {
            Deadline::after(self.config.receive_timeout())
        }
    }

    /// Receive the next application message.
    ///
    /// Corrupt frames are discarded (and NAKed where the level says so);
    /// duplicates are re-acknowledged but not re-delivered. Fails with
    /// [`RdtError::ReceiveTimeout`] if no fresh intact frame arrives within
    /// the timeout window.
    pub fn receive(&mut self) -> Result<Vec<u8>, RdtError> {
        let deadline = Deadline::after(self.config.receive_timeout());
        loop {
            let raw = match self.inbound.next_raw_frame(deadline)? {
                RawRead::TimedOut => return Err(RdtError::ReceiveTimeout),
                RawRead::Garbled => {
                    self.reject_corrupt()?;
                    continue;
                }
                RawRead::Frame(raw) => raw,
            };

            let frame = match Frame::decode(&raw) {
                Ok(frame) => frame,
                Err(err) => {
                    debug!("dropping corrupt frame: {}", err);
                    self.reject_corrupt()?;
                    continue;
                }
            };

            if !self.caps.corruption_detection {
                debug!("delivering seq {} ({} bytes)", frame.seq, frame.payload.len());
                return Ok(frame.payload);
            }

            // Every intact frame gets exactly one reply, sent before the
            // duplicate decision, so a stuck retransmitter can make
            // progress.
            self.inbound.send_frame(&Frame::ack(frame.seq))?;

            if frame.seq == self.expected_seq {
                self.expected_seq = 1 - self.expected_seq;
                debug!("delivering seq {} ({} bytes)", frame.seq, frame.payload.len());
                return Ok(frame.payload);
            }
            debug!(
                "duplicate seq {} (expecting {}), acknowledged without delivery",
                frame.seq, self.expected_seq
            );
        }
    }

    fn reject_corrupt(&mut self) -> Result<(), RdtError> {
        if self.caps.nak_on_corruption {
            self.inbound.send_frame(&Frame::nak(self.expected_seq))?;
        }
        Ok(())
    }

    /// Release both directional links.
    pub fn close(self) {
        debug!("session closed");
    }
}
