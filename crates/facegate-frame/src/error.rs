use crate::layout::PixelLayout;

/// Errors that can occur during frame encoding/decoding and message I/O.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame payload does not start with the `"FG"` magic.
    #[error("invalid frame magic (expected 0x4647 \"FG\")")]
    InvalidMagic,

    /// The frame payload was produced by an unknown codec version.
    #[error("unsupported frame codec version {0}")]
    UnsupportedVersion(u8),

    /// The pixel layout tag is not recognised.
    #[error("unknown pixel layout tag {0}")]
    UnknownLayout(u8),

    /// The declared channel count disagrees with the pixel layout.
    #[error("{layout} frames carry {expected} channels, got {actual}")]
    ChannelMismatch {
        layout: PixelLayout,
        expected: u32,
        actual: u32,
    },

    /// The pixel buffer length does not equal `width * height * channels`.
    #[error("pixel data is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A frame dimension is zero or the byte size overflows.
    #[error("invalid frame dimensions {width}x{height}x{channels}")]
    InvalidDimensions {
        width: u64,
        height: u64,
        channels: u64,
    },

    /// The payload is shorter than its own header claims.
    #[error("frame payload truncated ({available} bytes, need {needed})")]
    Truncated { needed: usize, available: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing messages.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream between two messages.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer closed the stream in the middle of a message.
    #[error("connection closed mid-message ({received} of {expected} bytes)")]
    ShortRead { expected: usize, received: usize },
}

impl FrameError {
    /// Whether this error is a socket timeout. On the read side the call can
    /// be retried without losing buffered bytes; on the write side it is fatal.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
