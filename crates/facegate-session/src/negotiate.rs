use std::fmt;

use facegate_frame::{Frame, HEADER_SIZE};

use crate::error::{Result, SessionError};

const FIELD_SIZE: usize = std::mem::size_of::<u64>();

/// Negotiation message: width, height, channels as native-order `u64`.
pub const NEGOTIATION_SIZE: usize = 3 * FIELD_SIZE;

/// Frame shape agreed once per session.
///
/// Every frame streamed afterwards is expected to carry exactly
/// `width * height * channels` pixel bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NegotiatedShape {
    pub width: u64,
    pub height: u64,
    pub channels: u64,
}

impl NegotiatedShape {
    pub fn new(width: u64, height: u64, channels: u64) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Shape of an existing frame.
    pub fn of(frame: &Frame) -> Self {
        let (width, height, channels) = frame.shape();
        Self::new(width.into(), height.into(), channels.into())
    }

    /// `width * height * channels`, `None` on overflow.
    pub fn pixel_bytes(&self) -> Option<usize> {
        let bytes = self
            .width
            .checked_mul(self.height)?
            .checked_mul(self.channels)?;
        usize::try_from(bytes).ok()
    }

    /// Expected serialized frame size, used as the read-chunk hint.
    pub fn expected_payload_size(&self) -> usize {
        self.pixel_bytes()
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .unwrap_or(usize::MAX)
    }

    /// Whether `frame` has this shape.
    pub fn matches(&self, frame: &Frame) -> bool {
        *self == Self::of(frame)
    }

    pub fn as_tuple(&self) -> (u64, u64, u64) {
        (self.width, self.height, self.channels)
    }

    pub fn to_wire(&self) -> [u8; NEGOTIATION_SIZE] {
        let mut out = [0u8; NEGOTIATION_SIZE];
        for (slot, value) in out
            .chunks_exact_mut(FIELD_SIZE)
            .zip([self.width, self.height, self.channels])
        {
            slot.copy_from_slice(&value.to_ne_bytes());
        }
        out
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NEGOTIATION_SIZE {
            return Err(SessionError::Protocol(format!(
                "negotiation carries {} bytes, expected {NEGOTIATION_SIZE}",
                bytes.len()
            )));
        }
        let mut fields = bytes.chunks_exact(FIELD_SIZE).map(|chunk| {
            let mut raw = [0u8; FIELD_SIZE];
            raw.copy_from_slice(chunk);
            u64::from_ne_bytes(raw)
        });
        let mut next = || {
            fields
                .next()
                .ok_or_else(|| SessionError::Protocol("negotiation field missing".to_string()))
        };
        Ok(Self::new(next()?, next()?, next()?))
    }

    /// Reject shapes no frame can have or that exceed `max_payload`.
    pub fn validate(&self, max_payload: usize) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.channels == 0 {
            return Err(SessionError::Protocol(format!(
                "negotiated shape {self} has a zero dimension"
            )));
        }
        match self.pixel_bytes().and_then(|n| n.checked_add(HEADER_SIZE)) {
            Some(size) if size <= max_payload => Ok(()),
            Some(size) => Err(SessionError::Protocol(format!(
                "negotiated shape {self} needs {size} bytes per frame (max {max_payload})"
            ))),
            None => Err(SessionError::Protocol(format!(
                "negotiated shape {self} overflows"
            ))),
        }
    }
}

impl fmt::Display for NegotiatedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facegate_frame::{PixelLayout, DEFAULT_MAX_PAYLOAD};

    #[test]
    fn wire_layout_is_three_native_u64() {
        let shape = NegotiatedShape::new(640, 480, 3);
        let wire = shape.to_wire();
        assert_eq!(wire.len(), 24);
        assert_eq!(&wire[0..8], &640u64.to_ne_bytes());
        assert_eq!(&wire[8..16], &480u64.to_ne_bytes());
        assert_eq!(&wire[16..24], &3u64.to_ne_bytes());
        assert_eq!(NegotiatedShape::from_wire(&wire).unwrap(), shape);
    }

    #[test]
    fn from_wire_rejects_short_message() {
        let wire = NegotiatedShape::new(1, 2, 3).to_wire();
        assert!(matches!(
            NegotiatedShape::from_wire(&wire[..16]),
            Err(SessionError::Protocol(_))
        ));
    }

    #[test]
    fn shape_of_frame() {
        let frame = Frame::new(vec![0u8; 4 * 2 * 3], 4, 2, PixelLayout::Bgr).unwrap();
        let shape = NegotiatedShape::of(&frame);
        assert_eq!(shape.as_tuple(), (4, 2, 3));
        assert!(shape.matches(&frame));
        assert_eq!(shape.expected_payload_size(), HEADER_SIZE + 24);
    }

    #[test]
    fn validate_rejects_zero_and_oversized() {
        assert!(NegotiatedShape::new(0, 480, 3)
            .validate(DEFAULT_MAX_PAYLOAD)
            .is_err());
        assert!(NegotiatedShape::new(100_000, 100_000, 4)
            .validate(DEFAULT_MAX_PAYLOAD)
            .is_err());
        assert!(NegotiatedShape::new(u64::MAX, 2, 3)
            .validate(DEFAULT_MAX_PAYLOAD)
            .is_err());
        assert!(NegotiatedShape::new(640, 480, 3)
            .validate(DEFAULT_MAX_PAYLOAD)
            .is_ok());
    }

    #[test]
    fn display_is_wxhxc() {
        assert_eq!(NegotiatedShape::new(640, 480, 3).to_string(), "640x480x3");
    }
}
