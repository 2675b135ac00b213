use std::io::{self, BufRead, BufReader, Stderr, Stdin, Write};
use std::path::{Path, PathBuf};

use facegate_frame::Frame;
use image::{Rgb, RgbImage};
use tracing::{info, warn};

use crate::embedding::{DetectedFace, FaceBox};
use crate::error::{DecisionError, Result};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Resolves ambiguous frames by asking someone.
///
/// Called synchronously; the decision node blocks until it returns.
pub trait HumanFallback: Send {
    fn confirm(&mut self, frame: &Frame, faces: &[DetectedFace]) -> Result<bool>;
}

/// Headless fallback: every ambiguous frame is denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyFallback;

impl HumanFallback for DenyFallback {
    fn confirm(&mut self, _frame: &Frame, faces: &[DetectedFace]) -> Result<bool> {
        info!(faces = faces.len(), "ambiguous frame denied without asking");
        Ok(false)
    }
}

/// Interactive fallback: writes a preview image with the detected faces
/// outlined, then reads `y`/`n` from a terminal.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
    preview_dir: Option<PathBuf>,
    asked: u64,
}

impl TerminalPrompt<BufReader<Stdin>, Stderr> {
    /// Prompt on stderr, answer on stdin.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            preview_dir: None,
            asked: 0,
        }
    }

    /// Write previews into `dir` (created on first use).
    pub fn with_preview_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preview_dir = Some(dir.into());
        self
    }

    fn write_preview(&self, dir: &Path, frame: &Frame, faces: &[DetectedFace]) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("ambiguous-{:04}.png", self.asked));
        render_preview(frame, faces)?
            .save(&path)
            .map_err(|source| DecisionError::Preview {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    fn ask(&mut self) -> Result<bool> {
        let mut line = String::new();
        loop {
            write!(self.output, "Grant access? [y/n] ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(DecisionError::Fallback(
                    "input closed before an answer".to_string(),
                ));
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer 'y' or 'n'.")?,
            }
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> HumanFallback for TerminalPrompt<R, W> {
    fn confirm(&mut self, frame: &Frame, faces: &[DetectedFace]) -> Result<bool> {
        self.asked += 1;

        let preview = match self.preview_dir.clone() {
            Some(dir) => match self.write_preview(&dir, frame, faces) {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!(error = %err, "could not write preview");
                    None
                }
            },
            None => None,
        };

        writeln!(
            self.output,
            "Ambiguous {}x{} frame: {} face(s) detected, allow and deny lists agree.",
            frame.width(),
            frame.height(),
            faces.len()
        )?;
        for (i, face) in faces.iter().enumerate() {
            let b = face.bounds;
            writeln!(
                self.output,
                "  face {}: top={} right={} bottom={} left={}",
                i + 1,
                b.top,
                b.right,
                b.bottom,
                b.left
            )?;
        }
        if let Some(path) = &preview {
            writeln!(self.output, "Preview: {}", path.display())?;
        }

        let grant = self.ask()?;
        info!(grant, "operator answered");
        Ok(grant)
    }
}

/// Convert `frame` to an RGB image with each face box outlined.
pub(crate) fn render_preview(frame: &Frame, faces: &[DetectedFace]) -> Result<RgbImage> {
    let rgb = frame.to_rgb();
    let mut img = RgbImage::from_raw(rgb.width(), rgb.height(), rgb.data().to_vec())
        .ok_or_else(|| DecisionError::Fallback("frame does not fit an RGB image".to_string()))?;
    for face in faces {
        outline(&mut img, face.bounds);
    }
    Ok(img)
}

fn outline(img: &mut RgbImage, bounds: FaceBox) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let left = bounds.left.min(w - 1);
    let right = bounds.right.min(w - 1);
    let top = bounds.top.min(h - 1);
    let bottom = bounds.bottom.min(h - 1);

    for x in left..=right.max(left) {
        img.put_pixel(x, top, BOX_COLOR);
        img.put_pixel(x, bottom, BOX_COLOR);
    }
    for y in top..=bottom.max(top) {
        img.put_pixel(left, y, BOX_COLOR);
        img.put_pixel(right, y, BOX_COLOR);
    }
}
