//! Wire-format definitions for RDT frames.
//!
//! Every frame on the wire is printable text:
//!
//! ```text
//! [length: 10 decimal digits][seq: 10 decimal digits][checksum: 32 hex digits][payload]
//! ```
//!
//! `length` counts the whole frame including itself, so a receiver can
//! determine the frame boundary from the first ten bytes alone. `checksum`
//! is the MD5 digest of the length field, the sequence field and the payload,
//! encoded as lowercase hex. Control replies (`ACK` / `NAK`) are ordinary
//! frames whose payload is the literal token.
//!
//! No I/O happens here — this is pure data transformation.

use thiserror::Error;

/// Width of the total-length field in bytes.
pub const LENGTH_WIDTH: usize = 10;
/// Width of the sequence-number field in bytes.
pub const SEQ_WIDTH: usize = 10;
/// Width of the hex-encoded MD5 checksum in bytes.
pub const CHECKSUM_WIDTH: usize = 32;
/// Total header size preceding the payload.
pub const HEADER_LEN: usize = LENGTH_WIDTH + SEQ_WIDTH + CHECKSUM_WIDTH;

/// Payload token acknowledging an intact frame.
pub const ACK_TOKEN: &[u8] = b"ACK";
/// Payload token reporting a damaged frame.
pub const NAK_TOKEN: &[u8] = b"NAK";

/// Errors that can arise when parsing a raw frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Fewer bytes than the fixed header size.
    #[error("frame shorter than the {HEADER_LEN}-byte header")]
    Truncated,
    /// The transmitted checksum does not match the recomputed digest.
    #[error("checksum mismatch, frame is corrupt")]
    ChecksumMismatch,
    /// A numeric header field is not fixed-width decimal.
    #[error("non-numeric bytes in a fixed-width decimal field")]
    BadHeaderField,
}

/// A decoded unit of wire transfer: sequence number plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub seq: u64,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(seq: u64, payload: Vec<u8>) -> Self {
        Self { seq, payload }
    }

    /// Control reply acknowledging the frame carrying `seq`.
    pub fn ack(seq: u64) -> Self {
        Self::new(seq, ACK_TOKEN.to_vec())
    }

    /// Control reply reporting corruption, tagged with the expected sequence.
    pub fn nak(seq: u64) -> Self {
        Self::new(seq, NAK_TOKEN.to_vec())
    }

    pub fn is_ack(&self) -> bool {
        self.payload == ACK_TOKEN
    }

    pub fn is_nak(&self) -> bool {
        self.payload == NAK_TOKEN
    }

    /// Serialise this frame into a newly allocated byte vector.
    ///
    /// Total and deterministic for in-contract inputs: the sequence number
    /// and the total frame length must both fit their ten-digit fields.
    /// Callers are responsible for rejecting payloads that would overflow
    /// those widths.
    pub fn encode(&self) -> Vec<u8> {
        let total = HEADER_LEN + self.payload.len();
        debug_assert!(total < 10usize.pow(LENGTH_WIDTH as u32));
        debug_assert!(self.seq < 10u64.pow(SEQ_WIDTH as u32));

        let length_field = format!("{:0width$}", total, width = LENGTH_WIDTH);
        let seq_field = format!("{:0width$}", self.seq, width = SEQ_WIDTH);
        let checksum = checksum_hex(length_field.as_bytes(), seq_field.as_bytes(), &self.payload);

        let mut buf = Vec::with_capacity(total);
        buf.extend_from_slice(length_field.as_bytes());
        buf.extend_from_slice(seq_field.as_bytes());
        buf.extend_from_slice(checksum.as_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Frame`] from exactly one whole raw frame.
    ///
    /// Callers must buffer until the full frame (as declared by the length
    /// prefix) is present; see [`crate::FrameBuffer`]. Returns an error
    /// instead of ever materialising a corrupt frame.
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        if buf.len() < HEADER_LEN {
            return Err(CodecError::Truncated);
        }
        if Self::is_corrupt(buf) {
            return Err(CodecError::ChecksumMismatch);
        }

        let seq_field = &buf[LENGTH_WIDTH..LENGTH_WIDTH + SEQ_WIDTH];
        let seq = parse_decimal_field(seq_field)?;
        Ok(Self {
            seq,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }

    /// Integrity check without materialising a frame.
    ///
    /// A buffer too short to carry the header is reported as corrupt rather
    /// than a distinct condition; protocol levels branch on this predicate
    /// when they must react to damage without raising.
    pub fn is_corrupt(buf: &[u8]) -> bool {
        if buf.len() < HEADER_LEN {
            return true;
        }
        let length_field = &buf[..LENGTH_WIDTH];
        let seq_field = &buf[LENGTH_WIDTH..LENGTH_WIDTH + SEQ_WIDTH];
        let transmitted = &buf[LENGTH_WIDTH + SEQ_WIDTH..HEADER_LEN];
        let payload = &buf[HEADER_LEN..];
        checksum_hex(length_field, seq_field, payload).as_bytes() != transmitted
    }
}

/// MD5 over the concatenated length field, sequence field and payload,
/// rendered as 32 lowercase hex digits.
fn checksum_hex(length_field: &[u8], seq_field: &[u8], payload: &[u8]) -> String {
    let mut input = Vec::with_capacity(LENGTH_WIDTH + SEQ_WIDTH + payload.len());
    input.extend_from_slice(length_field);
    input.extend_from_slice(seq_field);
    input.extend_from_slice(payload);
    format!("{:x}", md5::compute(&input))
}

pub(crate) fn parse_decimal_field(field: &[u8]) -> Result<u64, CodecError> {
    let text = std::str::from_utf8(field).map_err(|_| CodecError::BadHeaderField)?;
    text.parse::<u64>().map_err(|_| CodecError::BadHeaderField)
}
