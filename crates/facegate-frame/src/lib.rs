//! Raw frame codec and length-prefixed message framing.
//!
//! Two layers live here:
//! - the frame codec, which turns a captured [`Frame`] into an opaque payload
//!   (`"FG"` magic, version, pixel layout, dimensions, pixel bytes) and back;
//! - the message layer, which moves fixed-size records and payloads carrying
//!   a native-order `u64` length prefix over any byte stream.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod frame;
pub mod layout;
pub mod reader;
pub mod source;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, encoded_len, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
    LENGTH_PREFIX_SIZE,
};
pub use error::{FrameError, Result};
pub use frame::Frame;
pub use layout::PixelLayout;
pub use reader::MessageReader;
pub use source::{FrameSequence, FrameSource, IterSource, SourceError};
pub use writer::MessageWriter;
