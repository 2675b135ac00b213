use bytes::Bytes;

use crate::error::{FrameError, Result};
use crate::layout::PixelLayout;

/// A single captured image: interleaved pixel bytes in row-major order.
///
/// Frames are immutable once built. Cloning is cheap; the pixel buffer is
/// reference counted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
    width: u32,
    height: u32,
    layout: PixelLayout,
}

impl Frame {
    /// Build a frame, checking that `data` holds exactly
    /// `width * height * channels` bytes.
    pub fn new(data: impl Into<Bytes>, width: u32, height: u32, layout: PixelLayout) -> Result<Self> {
        let data = data.into();
        let expected = byte_len(width, height, layout.channels())?;
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.layout.channels()
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// `(width, height, channels)`.
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.channels())
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Convert to a three-channel RGB frame.
    ///
    /// Returns a cheap clone when the frame already is RGB. Alpha is
    /// dropped, gray is replicated into all three channels.
    pub fn to_rgb(&self) -> Frame {
        if self.layout == PixelLayout::Rgb {
            return self.clone();
        }

        let channels = self.channels() as usize;
        let [r, g, b] = self.layout.rgb_offsets();
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for pixel in self.data.chunks_exact(channels) {
            out.extend_from_slice(&[pixel[r], pixel[g], pixel[b]]);
        }

        Frame {
            data: Bytes::from(out),
            width: self.width,
            height: self.height,
            layout: PixelLayout::Rgb,
        }
    }
}

/// `width * height * channels` with overflow and zero checks.
pub(crate) fn byte_len(width: u32, height: u32, channels: u32) -> Result<usize> {
    let invalid = || FrameError::InvalidDimensions {
        width: width.into(),
        height: height.into(),
        channels: channels.into(),
    };
    if width == 0 || height == 0 || channels == 0 {
        return Err(invalid());
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels as usize))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![7u8; 12]; // 2x2 BGR
        let frame = Frame::new(data.clone(), 2, 2, PixelLayout::Bgr).unwrap();
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.shape(), (2, 2, 3));
        assert_eq!(frame.byte_len(), 12);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_mismatched_data_length_rejected() {
        let err = Frame::new(vec![0u8; 10], 2, 2, PixelLayout::Rgb).unwrap_err();
        assert!(matches!(
            err,
            FrameError::SizeMismatch {
                expected: 12,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let err = Frame::new(Vec::<u8>::new(), 0, 4, PixelLayout::Gray).unwrap_err();
        assert!(matches!(err, FrameError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_bgr_to_rgb_swaps_channels() {
        // one blue pixel, one red pixel
        let frame = Frame::new(vec![255, 0, 0, 0, 0, 255], 2, 1, PixelLayout::Bgr).unwrap();
        let rgb = frame.to_rgb();
        assert_eq!(rgb.layout(), PixelLayout::Rgb);
        assert_eq!(rgb.data(), &[0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn test_gray_and_alpha_to_rgb() {
        let gray = Frame::new(vec![9, 200], 1, 2, PixelLayout::Gray).unwrap();
        assert_eq!(gray.to_rgb().data(), &[9, 9, 9, 200, 200, 200]);

        let rgba = Frame::new(vec![1, 2, 3, 4], 1, 1, PixelLayout::Rgba).unwrap();
        assert_eq!(rgba.to_rgb().data(), &[1, 2, 3]);
    }

    #[test]
    fn test_rgb_to_rgb_shares_buffer() {
        let frame = Frame::new(vec![1u8; 3], 1, 1, PixelLayout::Rgb).unwrap();
        let rgb = frame.to_rgb();
        assert_eq!(rgb.data().as_ptr(), frame.data().as_ptr());
    }
}
