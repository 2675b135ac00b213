//! Grant/deny decisions for frames received by the decision node.
//!
//! A [`DecisionEngine`] runs a [`FaceDetector`] over a frame, matches every
//! detected embedding against the allow and deny lists with
//! [`EncodingMatcher`], and defers to a [`HumanFallback`] when the two lists
//! agree.

pub mod detector;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod matcher;
pub mod store;

pub use detector::{CommandDetector, DetectionModel, FaceDetector};
pub use embedding::{DetectedFace, FaceBox, FaceEmbedding};
pub use engine::{Decision, DecisionBasis, DecisionEngine};
pub use error::{DecisionError, Result, StoreError};
pub use fallback::{DenyFallback, HumanFallback, TerminalPrompt};
pub use matcher::{EncodingMatcher, Tolerance, DEFAULT_TOLERANCE};
pub use store::KnownEmbeddingSet;
