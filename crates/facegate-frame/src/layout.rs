//! Pixel layouts a frame may carry.
//!
//! The tag values are part of the frame payload format and must not be
//! renumbered.

use std::fmt;

use crate::error::{FrameError, Result};

/// Interleaved byte layout of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// Single luminance byte.
    Gray,
    /// Blue, green, red; what most capture devices hand out.
    Bgr,
    /// Red, green, blue; what the detection collaborator expects.
    Rgb,
    /// Blue, green, red, alpha.
    Bgra,
    /// Red, green, blue, alpha.
    Rgba,
}

impl PixelLayout {
    /// Number of bytes per pixel.
    pub fn channels(self) -> u32 {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Bgr | PixelLayout::Rgb => 3,
            PixelLayout::Bgra | PixelLayout::Rgba => 4,
        }
    }

    /// Wire tag.
    pub fn tag(self) -> u8 {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Bgr => 2,
            PixelLayout::Rgb => 3,
            PixelLayout::Bgra => 4,
            PixelLayout::Rgba => 5,
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(PixelLayout::Gray),
            2 => Ok(PixelLayout::Bgr),
            3 => Ok(PixelLayout::Rgb),
            4 => Ok(PixelLayout::Bgra),
            5 => Ok(PixelLayout::Rgba),
            other => Err(FrameError::UnknownLayout(other)),
        }
    }

    /// Default layout for a bare channel count, capture-device order.
    pub fn for_channels(channels: u32) -> Option<Self> {
        match channels {
            1 => Some(PixelLayout::Gray),
            3 => Some(PixelLayout::Bgr),
            4 => Some(PixelLayout::Bgra),
            _ => None,
        }
    }

    /// Byte offsets of red, green and blue within one pixel.
    pub(crate) fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelLayout::Gray => [0, 0, 0],
            PixelLayout::Bgr | PixelLayout::Bgra => [2, 1, 0],
            PixelLayout::Rgb | PixelLayout::Rgba => [0, 1, 2],
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelLayout::Gray => "GRAY",
            PixelLayout::Bgr => "BGR",
            PixelLayout::Rgb => "RGB",
            PixelLayout::Bgra => "BGRA",
            PixelLayout::Rgba => "RGBA",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PixelLayout; 5] = [
        PixelLayout::Gray,
        PixelLayout::Bgr,
        PixelLayout::Rgb,
        PixelLayout::Bgra,
        PixelLayout::Rgba,
    ];

    #[test]
    fn tags_are_unique_and_parse_back() {
        for layout in ALL {
            assert_eq!(PixelLayout::from_tag(layout.tag()).unwrap(), layout);
        }
        let mut tags: Vec<u8> = ALL.iter().map(|l| l.tag()).collect();
        tags.dedup();
        assert_eq!(tags.len(), ALL.len());
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(matches!(
            PixelLayout::from_tag(0),
            Err(FrameError::UnknownLayout(0))
        ));
    }

    #[test]
    fn capture_order_defaults() {
        assert_eq!(PixelLayout::for_channels(3), Some(PixelLayout::Bgr));
        assert_eq!(PixelLayout::for_channels(2), None);
    }
}
