pub mod buffer;
pub mod frame;

pub use buffer::FrameBuffer;
pub use frame::{CodecError, Frame};
pub use frame::{CHECKSUM_WIDTH, HEADER_LEN, LENGTH_WIDTH, SEQ_WIDTH};
