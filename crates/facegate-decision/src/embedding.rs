use serde::{Deserialize, Serialize};

use crate::error::{DecisionError, Result};

/// Fixed-length numeric description of one face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceEmbedding(Vec<f64>);

impl FaceEmbedding {
    /// Wrap raw values, rejecting empty or non-finite vectors.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(DecisionError::InvalidEmbedding("empty vector".to_string()));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(DecisionError::InvalidEmbedding(format!(
                "component {i} is not finite"
            )));
        }
        Ok(Self(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Euclidean distance, or `None` when the dimensions differ.
    pub fn distance(&self, other: &FaceEmbedding) -> Option<f64> {
        if self.dimension() != other.dimension() {
            return None;
        }
        let sum: f64 = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Some(sum.sqrt())
    }
}

/// Face bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl FaceBox {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// One face found by a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFace {
    pub bounds: FaceBox,
    pub embedding: FaceEmbedding,
}
