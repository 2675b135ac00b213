use std::fmt;
use std::str::FromStr;

use crate::embedding::FaceEmbedding;
use crate::store::KnownEmbeddingSet;

pub const DEFAULT_TOLERANCE: f64 = 0.6;

/// Largest embedding distance still counted as the same face.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    /// `None` unless `value` is finite and non-negative.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Tolerance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|e| format!("invalid tolerance '{s}': {e}"))?;
        Self::new(value).ok_or_else(|| format!("tolerance must be finite and >= 0, got {s}"))
    }
}

/// Tests detected embeddings against a known list.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingMatcher {
    tolerance: Tolerance,
}

impl EncodingMatcher {
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Whether `embedding` is within tolerance of at least one member of
    /// `known`. Members of a different dimension never match.
    pub fn matches_any(&self, known: &KnownEmbeddingSet, embedding: &FaceEmbedding) -> bool {
        known.iter().any(|member| {
            member
                .distance(embedding)
                .is_some_and(|d| d <= self.tolerance.value())
        })
    }

    /// Whether every detected embedding matches `known`.
    ///
    /// Vacuously true for no detections.
    pub fn all_faces_match<'a>(
        &self,
        known: &KnownEmbeddingSet,
        detected: impl IntoIterator<Item = &'a FaceEmbedding>,
    ) -> bool {
        detected.into_iter().all(|e| self.matches_any(known, e))
    }
}
