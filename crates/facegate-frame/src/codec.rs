use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::frame::{byte_len, Frame};
use crate::layout::PixelLayout;

/// Frame header: magic (2) + version (1) + layout (1) + width, height,
/// channels (4 each) = 16 bytes.
pub const HEADER_SIZE: usize = 16;

/// Magic bytes: "FG" (0x46 0x47).
pub const MAGIC: [u8; 2] = [0x46, 0x47];

/// Current frame codec version.
pub const CODEC_VERSION: u8 = 1;

/// Message length prefix: one native-order `u64`.
pub const LENGTH_PREFIX_SIZE: usize = std::mem::size_of::<u64>();

/// Default maximum message payload size: 64 MiB (a 4K BGRA frame fits).
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Serialized size of `frame`.
pub fn encoded_len(frame: &Frame) -> usize {
    HEADER_SIZE + frame.byte_len()
}

/// Encode a frame into its opaque payload form.
///
/// Payload format:
/// ```text
/// ┌──────────┬─────────┬────────┬─────────┬──────────┬──────────┬──────────────┐
/// │ Magic    │ Version │ Layout │ Width   │ Height   │ Channels │ Pixels       │
/// │ "FG" 2B  │ 1B      │ 1B     │ 4B LE   │ 4B LE    │ 4B LE    │ W*H*C bytes  │
/// └──────────┴─────────┴────────┴─────────┴──────────┴──────────┴──────────────┘
/// ```
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    dst.reserve(encoded_len(frame));
    dst.put_slice(&MAGIC);
    dst.put_u8(CODEC_VERSION);
    dst.put_u8(frame.layout().tag());
    dst.put_u32_le(frame.width());
    dst.put_u32_le(frame.height());
    dst.put_u32_le(frame.channels());
    dst.put_slice(frame.data());
}

/// Decode a frame payload.
///
/// The pixel buffer shares memory with `payload`.
pub fn decode_frame(mut payload: Bytes) -> Result<Frame> {
    if payload.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            needed: HEADER_SIZE,
            available: payload.len(),
        });
    }

    if payload[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }
    payload.advance(2);

    let version = payload.get_u8();
    if version != CODEC_VERSION {
        return Err(FrameError::UnsupportedVersion(version));
    }

    let layout = PixelLayout::from_tag(payload.get_u8())?;
    let width = payload.get_u32_le();
    let height = payload.get_u32_le();
    let channels = payload.get_u32_le();

    if channels != layout.channels() {
        return Err(FrameError::ChannelMismatch {
            layout,
            expected: layout.channels(),
            actual: channels,
        });
    }

    let expected = byte_len(width, height, channels)?;
    if payload.len() != expected {
        return Err(FrameError::SizeMismatch {
            expected,
            actual: payload.len(),
        });
    }

    Frame::new(payload, width, height, layout)
}

/// Append a native-order `u64` length prefix.
pub(crate) fn put_length_prefix(len: usize, dst: &mut BytesMut) {
    dst.put_slice(&(len as u64).to_ne_bytes());
}

/// Read the length prefix at the front of `src` without consuming it.
///
/// Returns `None` when fewer than [`LENGTH_PREFIX_SIZE`] bytes are buffered.
pub(crate) fn peek_length_prefix(src: &[u8]) -> Option<u64> {
    let raw: [u8; LENGTH_PREFIX_SIZE] = src.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
    Some(u64::from_ne_bytes(raw))
}

/// Configuration for message I/O.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 64 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame(width: u32, height: u32, layout: PixelLayout) -> Frame {
        let len = (width * height * layout.channels()) as usize;
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        Frame::new(data, width, height, layout).unwrap()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = sample_frame(640, 480, PixelLayout::Bgr);
        let mut buf = BytesMut::new();
        encode_frame(&frame, &mut buf);

        assert_eq!(buf.len(), encoded_len(&frame));
        assert_eq!(buf.len(), HEADER_SIZE + 640 * 480 * 3);

        let decoded = decode_frame(buf.freeze()).unwrap();
        assert_eq!(decoded.shape(), (640, 480, 3));
        assert_eq!(decoded.layout(), PixelLayout::Bgr);
        assert_eq!(decoded.data(), frame.data());
    }

    #[test]
    fn test_decode_truncated_header() {
        let result = decode_frame(Bytes::from_static(&[0x46, 0x47, 0x01]));
        assert!(matches!(
            result,
            Err(FrameError::Truncated {
                needed: HEADER_SIZE,
                available: 3
            })
        ));
    }

    #[test]
    fn test_decode_invalid_magic() {
        let mut buf = BytesMut::new();
        encode_frame(&sample_frame(1, 1, PixelLayout::Gray), &mut buf);
        buf[0] = 0xFF;
        assert!(matches!(
            decode_frame(buf.freeze()),
            Err(FrameError::InvalidMagic)
        ));
    }

    #[test]
    fn test_decode_unsupported_version() {
        let mut buf = BytesMut::new();
        encode_frame(&sample_frame(1, 1, PixelLayout::Gray), &mut buf);
        buf[2] = 9;
        assert!(matches!(
            decode_frame(buf.freeze()),
            Err(FrameError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_decode_channel_mismatch() {
        let mut buf = BytesMut::new();
        encode_frame(&sample_frame(2, 2, PixelLayout::Rgb), &mut buf);
        buf[12] = 4; // channels field, low byte
        assert!(matches!(
            decode_frame(buf.freeze()),
            Err(FrameError::ChannelMismatch { actual: 4, .. })
        ));
    }

    #[test]
    fn test_decode_short_pixel_data() {
        let mut buf = BytesMut::new();
        encode_frame(&sample_frame(4, 4, PixelLayout::Rgb), &mut buf);
        buf.truncate(buf.len() - 1);
        assert!(matches!(
            decode_frame(buf.freeze()),
            Err(FrameError::SizeMismatch {
                expected: 48,
                actual: 47
            })
        ));
    }

    #[test]
    fn test_decode_zero_dimension() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u8(CODEC_VERSION);
        buf.put_u8(PixelLayout::Gray.tag());
        buf.put_u32_le(0);
        buf.put_u32_le(5);
        buf.put_u32_le(1);
        assert!(matches!(
            decode_frame(buf.freeze()),
            Err(FrameError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_length_prefix_is_native_order() {
        let mut buf = BytesMut::new();
        put_length_prefix(0x0102_0304, &mut buf);
        assert_eq!(buf.len(), LENGTH_PREFIX_SIZE);
        assert_eq!(&buf[..], &0x0102_0304u64.to_ne_bytes());
        assert_eq!(peek_length_prefix(&buf), Some(0x0102_0304));
        assert_eq!(peek_length_prefix(&buf[..4]), None);
    }
}
