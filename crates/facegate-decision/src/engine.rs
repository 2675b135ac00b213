use std::fmt;

use facegate_frame::Frame;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detector::FaceDetector;
use crate::embedding::{DetectedFace, FaceEmbedding};
use crate::error::Result;
use crate::fallback::HumanFallback;
use crate::matcher::EncodingMatcher;
use crate::store::KnownEmbeddingSet;

/// What produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    /// The allow and deny lists disagreed.
    Automatic,
    /// Ambiguous; a person said yes.
    HumanConfirmed,
    /// Ambiguous; a person said no.
    HumanRejected,
    /// Ambiguous and the fallback failed; denied.
    FallbackFailed,
}

impl fmt::Display for DecisionBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionBasis::Automatic => "automatic",
            DecisionBasis::HumanConfirmed => "human_confirmed",
            DecisionBasis::HumanRejected => "human_rejected",
            DecisionBasis::FallbackFailed => "fallback_failed",
        };
        f.write_str(s)
    }
}

/// Outcome for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub grant: bool,
    pub basis: DecisionBasis,
    pub faces: usize,
}

impl Decision {
    fn new(grant: bool, basis: DecisionBasis, faces: usize) -> Self {
        Self {
            grant,
            basis,
            faces,
        }
    }
}

/// Turns frames into grant/deny decisions.
pub struct DecisionEngine {
    detector: Box<dyn FaceDetector>,
    fallback: Box<dyn HumanFallback>,
    allow: KnownEmbeddingSet,
    deny: KnownEmbeddingSet,
    matcher: EncodingMatcher,
}

impl DecisionEngine {
    pub fn new(
        detector: impl FaceDetector + 'static,
        fallback: impl HumanFallback + 'static,
        allow: KnownEmbeddingSet,
        deny: KnownEmbeddingSet,
        matcher: EncodingMatcher,
    ) -> Self {
        Self {
            detector: Box::new(detector),
            fallback: Box::new(fallback),
            allow,
            deny,
            matcher,
        }
    }

    pub fn allow_list(&self) -> &KnownEmbeddingSet {
        &self.allow
    }

    pub fn deny_list(&self) -> &KnownEmbeddingSet {
        &self.deny
    }

    pub fn matcher(&self) -> EncodingMatcher {
        self.matcher
    }

    /// Decide one frame.
    ///
    /// Detection errors are returned; an ambiguous frame goes to the
    /// fallback, and a failing fallback denies.
    pub fn decide(&mut self, frame: &Frame) -> Result<Decision> {
        let rgb = frame.to_rgb();
        let faces = self.detector.detect(&rgb)?;

        let granted_all = self.matcher.all_faces_match(&self.allow, embeddings(&faces));
        let denied_all = self.matcher.all_faces_match(&self.deny, embeddings(&faces));
        debug!(faces = faces.len(), granted_all, denied_all, "matched faces");

        let decision = if granted_all == denied_all {
            match self.fallback.confirm(&rgb, &faces) {
                Ok(true) => Decision::new(true, DecisionBasis::HumanConfirmed, faces.len()),
                Ok(false) => Decision::new(false, DecisionBasis::HumanRejected, faces.len()),
                Err(err) => {
                    warn!(error = %err, "fallback failed, denying");
                    Decision::new(false, DecisionBasis::FallbackFailed, faces.len())
                }
            }
        } else {
            Decision::new(
                granted_all && !denied_all,
                DecisionBasis::Automatic,
                faces.len(),
            )
        };

        info!(grant = decision.grant, basis = %decision.basis, faces = decision.faces, "decision");
        Ok(decision)
    }
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("allow", &self.allow.len())
            .field("deny", &self.deny.len())
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

fn embeddings(faces: &[DetectedFace]) -> impl Iterator<Item = &FaceEmbedding> {
    faces.iter().map(|f| &f.embedding)
}
