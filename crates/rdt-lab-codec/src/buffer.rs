//! Per-link receive buffering.
//!
//! The channel hands back whatever bytes happen to be available: a partial
//! frame, several frames glued together, or nothing. [`FrameBuffer`]
//! accumulates those reads and splits off one complete raw frame at a time
//! using the self-delimiting length prefix. Each endpoint direction owns its
//! own buffer; nothing here is shared or static.

use bytes::{Bytes, BytesMut};

use crate::frame::{self, CodecError, HEADER_LEN, LENGTH_WIDTH};

/// Ordered bytes read from the channel but not yet consumed into a frame.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a channel read to the buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Split off the next complete raw frame, if one is fully buffered.
    ///
    /// `Ok(None)` means more bytes are needed. An unparsable or impossible
    /// length prefix is unrecoverable — the stream cannot be re-delimited —
    /// so the buffered bytes are discarded and the damage is reported for
    /// the caller's corruption policy to handle.
    pub fn take_frame(&mut self) -> Result<Option<Bytes>, CodecError> {
        if self.buf.len() < LENGTH_WIDTH {
            return Ok(None);
        }
        let declared = match frame::parse_decimal_field(&self.buf[..LENGTH_WIDTH]) {
            Ok(n) => n as usize,
            Err(err) => {
                self.buf.clear();
                return Err(err);
            }
        };
        if declared < HEADER_LEN {
            self.buf.clear();
            return Err(CodecError::Truncated);
        }
        if self.buf.len() < declared {
            return Ok(None);
        }
        Ok(Some(self.buf.split_to(declared).freeze()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    #[test]
    fn empty_buffer_yields_nothing() {
        let mut buf = FrameBuffer::new();
        assert_eq!(buf.take_frame().unwrap(), None);
    }

    #[test]
    fn partial_reads_accumulate_into_one_frame() {
        let bytes = Frame::new(0, b"split me".to_vec()).encode();
        let mut buf = FrameBuffer::new();
        let (head, tail) = bytes.split_at(LENGTH_WIDTH + 3);
        buf.extend(head);
        assert_eq!(buf.take_frame().unwrap(), None);
        buf.extend(tail);
        let raw = buf.take_frame().unwrap().unwrap();
        assert_eq!(Frame::decode(&raw).unwrap().payload, b"split me");
    }

    #[test]
    fn merged_reads_yield_frames_in_order() {
        let first = Frame::new(0, b"A".to_vec()).encode();
        let second = Frame::new(1, b"B".to_vec()).encode();
        let mut merged = first.clone();
        merged.extend_from_slice(&second);

        let mut buf = FrameBuffer::new();
        buf.extend(&merged);
        assert_eq!(buf.take_frame().unwrap().unwrap(), first.as_slice());
        assert_eq!(buf.take_frame().unwrap().unwrap(), second.as_slice());
        assert_eq!(buf.take_frame().unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn garbled_length_prefix_clears_the_buffer() {
        let mut buf = FrameBuffer::new();
        buf.extend(b"not a decimal prefix at all");
        assert_eq!(buf.take_frame(), Err(CodecError::BadHeaderField));
        assert!(buf.is_empty());
    }

    #[test]
    fn impossible_length_prefix_is_rejected() {
        let mut buf = FrameBuffer::new();
        // Declares a frame shorter than the fixed header.
        buf.extend(b"0000000005xxxxx");
        assert_eq!(buf.take_frame(), Err(CodecError::Truncated));
        assert!(buf.is_empty());
    }

    #[test]
    fn trailing_bytes_stay_buffered() {
        let frame = Frame::new(0, b"whole".to_vec()).encode();
        let mut merged = frame.clone();
        merged.extend_from_slice(b"00000000");
        let mut buf = FrameBuffer::new();
        buf.extend(&merged);
        assert_eq!(buf.take_frame().unwrap().unwrap(), frame.as_slice());
        assert_eq!(buf.len(), 8);
    }
}
