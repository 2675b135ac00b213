use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::thread;

use bytes::BytesMut;
use facegate_frame::{encode_frame, encoded_len, Frame};
use serde::Deserialize;
use tracing::debug;

use crate::embedding::{DetectedFace, FaceBox, FaceEmbedding};
use crate::error::{DecisionError, Result};

/// Finds faces in an RGB frame and describes each one with an embedding.
///
/// Implementations may keep state between frames, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, rgb: &Frame) -> Result<Vec<DetectedFace>>;
}

impl<F> FaceDetector for F
where
    F: FnMut(&Frame) -> Result<Vec<DetectedFace>> + Send,
{
    fn detect(&mut self, rgb: &Frame) -> Result<Vec<DetectedFace>> {
        self(rgb)
    }
}

/// Face localization model requested from the detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectionModel {
    /// Histogram of oriented gradients; fast, CPU friendly.
    #[default]
    Hog,
    /// Convolutional network; slower, more accurate.
    Cnn,
}

impl DetectionModel {
    pub const NAMES: [&'static str; 2] = ["hog", "cnn"];

    pub fn as_str(self) -> &'static str {
        match self {
            DetectionModel::Hog => "hog",
            DetectionModel::Cnn => "cnn",
        }
    }
}

impl fmt::Display for DetectionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hog" => Ok(DetectionModel::Hog),
            "cnn" => Ok(DetectionModel::Cnn),
            other => Err(format!(
                "unknown detection model '{other}' (expected one of: {})",
                Self::NAMES.join(", ")
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HelperOutput {
    faces: Vec<HelperFace>,
}

#[derive(Debug, Deserialize)]
struct HelperFace {
    top: u32,
    right: u32,
    bottom: u32,
    left: u32,
    embedding: Vec<f64>,
}

/// Runs an external helper program once per frame.
///
/// The helper is invoked as `<program> [args...] --model <hog|cnn>`, reads
/// one serialized RGB frame from stdin and prints
/// `{"faces":[{"top":..,"right":..,"bottom":..,"left":..,"embedding":[..]}]}`.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
    model: DetectionModel,
}

impl CommandDetector {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            model: DetectionModel::default(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model(mut self, model: DetectionModel) -> Self {
        self.model = model;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn model(&self) -> DetectionModel {
        self.model
    }

    fn spawn_error(&self, source: std::io::Error) -> DecisionError {
        DecisionError::DetectorSpawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl FaceDetector for CommandDetector {
    fn detect(&mut self, rgb: &Frame) -> Result<Vec<DetectedFace>> {
        let mut payload = BytesMut::with_capacity(encoded_len(rgb));
        encode_frame(rgb, &mut payload);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--model")
            .arg(self.model.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.spawn_error(std::io::Error::other("stdin not captured")))?;
        // Feed stdin from a separate thread so a chatty helper cannot
        // deadlock against a full stdout pipe.
        let feeder = thread::spawn(move || stdin.write_all(&payload));

        let output = child.wait_with_output().map_err(|e| self.spawn_error(e))?;
        let fed = feeder
            .join()
            .map_err(|_| self.spawn_error(std::io::Error::other("stdin writer panicked")))?;

        if !output.status.success() {
            return Err(DecisionError::DetectorFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // A helper may legitimately stop reading early; only its verdict counts.
        if let Err(err) = fed {
            debug!(error = %err, "detector closed stdin early");
        }

        let parsed: HelperOutput = serde_json::from_slice(&output.stdout)?;
        let faces = parsed
            .faces
            .into_iter()
            .map(|f| -> Result<DetectedFace> {
                Ok(DetectedFace {
                    bounds: FaceBox {
                        top: f.top,
                        right: f.right,
                        bottom: f.bottom,
                        left: f.left,
                    },
                    embedding: FaceEmbedding::new(f.embedding)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(program = %self.program, model = %self.model, faces = faces.len(), "detector finished");
        Ok(faces)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use facegate_frame::PixelLayout;

    use super::*;

    fn rgb() -> Frame {
        Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, PixelLayout::Rgb).unwrap()
    }

    fn shell(script: &str) -> CommandDetector {
        CommandDetector::new("sh").with_args(["-c", script, "detector"])
    }

    #[test]
    fn model_parsing() {
        assert_eq!("HOG".parse::<DetectionModel>().unwrap(), DetectionModel::Hog);
        assert_eq!("cnn".parse::<DetectionModel>().unwrap(), DetectionModel::Cnn);
        assert!("yolo".parse::<DetectionModel>().is_err());
    }

    #[test]
    fn parses_helper_output() {
        let mut detector = shell(
            r#"cat > /dev/null; echo '{"faces":[{"top":1,"right":3,"bottom":2,"left":0,"embedding":[0.25,0.5]}]}'"#,
        );
        let faces = detector.detect(&rgb()).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].bounds.right, 3);
        assert_eq!(faces[0].embedding.as_slice(), &[0.25, 0.5]);
    }

    #[test]
    fn passes_model_flag_and_frame() {
        // $1 and $2 are the appended "--model cnn"; stdin is the encoded frame.
        let mut detector = shell(
            r#"[ "$1" = "--model" ] && [ "$2" = "cnn" ] || exit 9; n=$(wc -c | tr -d ' '); [ "$n" = "64" ] || exit 8; echo '{"faces":[]}'"#,
        )
        .with_model(DetectionModel::Cnn);
        assert!(detector.detect(&rgb()).unwrap().is_empty());
    }

    #[test]
    fn non_zero_exit_is_error() {
        let mut detector = shell("cat > /dev/null; echo boom >&2; exit 3");
        let err = detector.detect(&rgb()).unwrap_err();
        assert!(matches!(err, DecisionError::DetectorFailed { ref stderr, .. } if stderr == "boom"));
    }

    #[test]
    fn malformed_output_is_error() {
        let mut detector = shell("cat > /dev/null; echo not-json");
        assert!(matches!(
            detector.detect(&rgb()),
            Err(DecisionError::DetectorOutput(_))
        ));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let mut detector = CommandDetector::new("/nonexistent/facegate-detector");
        assert!(matches!(
            detector.detect(&rgb()),
            Err(DecisionError::DetectorSpawn { .. })
        ));
    }

    #[test]
    fn closures_are_detectors() {
        let mut calls = 0;
        let mut detector = |_: &Frame| -> Result<Vec<DetectedFace>> {
            calls += 1;
            Ok(Vec::new())
        };
        assert!(FaceDetector::detect(&mut detector, &rgb()).unwrap().is_empty());
        drop(detector);
        assert_eq!(calls, 1);
    }
}
