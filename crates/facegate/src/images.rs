use std::path::{Path, PathBuf};

use facegate_frame::{Frame, FrameSource, PixelLayout, SourceError};
use tracing::debug;

/// Decode an image file into an RGB frame.
pub fn load_frame(path: &Path) -> Result<Frame, SourceError> {
    let img = image::open(path)
        .map_err(|err| format!("{}: {err}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    debug!(path = %path.display(), width, height, "image decoded");
    Ok(Frame::new(img.into_raw(), width, height, PixelLayout::Rgb)?)
}

/// Frame source that plays back image files in order, optionally looping.
pub struct ImageFileSource {
    paths: Vec<PathBuf>,
    next: usize,
    repeat: bool,
}

impl ImageFileSource {
    pub fn new(paths: Vec<PathBuf>, repeat: bool) -> Self {
        Self {
            paths,
            next: 0,
            repeat,
        }
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.next >= self.paths.len() {
            if !self.repeat || self.paths.is_empty() {
                return Ok(None);
            }
            self.next = 0;
        }
        let path = &self.paths[self.next];
        self.next += 1;
        load_frame(path).map(Some)
    }
}
