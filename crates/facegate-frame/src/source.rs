//! Producers of frames for the camera node.
//!
//! A source yields `Some(frame)` until it is exhausted and `None` after
//! that. Live capture never returns `None`; a pre-supplied image sequence
//! does once its last image is handed out. Sources are not restartable.

use std::collections::VecDeque;
use std::error::Error as StdError;

use crate::frame::Frame;

/// Error type sources report for a failed capture or decode.
pub type SourceError = Box<dyn StdError + Send + Sync>;

/// A producer of frames.
pub trait FrameSource: Send {
    /// Produce the next frame, `Ok(None)` at end of sequence.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;
}

/// Finite, in-memory sequence of frames.
#[derive(Debug, Default, Clone)]
pub struct FrameSequence {
    frames: VecDeque<Frame>,
}

impl FrameSequence {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Frames not yet handed out.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for FrameSequence {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        Ok(self.frames.pop_front())
    }
}

/// Adapts any iterator of fallible frames into a source.
///
/// Useful for lazily decoded inputs: the iterator decides when the
/// sequence ends.
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> FrameSource for IterSource<I>
where
    I: Iterator<Item = Result<Frame, SourceError>> + Send,
{
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        self.iter.next().transpose()
    }
}
