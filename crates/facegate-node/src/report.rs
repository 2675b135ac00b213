use std::fmt;

use serde::Serialize;

/// Why a loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The frame source ran dry.
    SourceExhausted,
    /// The peer closed the connection between messages.
    PeerClosed,
    /// A stop was requested.
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::SourceExhausted => "source exhausted",
            StopReason::PeerClosed => "peer closed",
            StopReason::Interrupted => "interrupted",
        })
    }
}

/// Counters for one loop run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopReport {
    /// Frames exchanged (sent by the camera node, received by the decision node).
    pub frames: u64,
    pub grants: u64,
    pub denies: u64,
    /// Frames dropped locally because their shape differed from the session's.
    pub skipped: u64,
    /// Frames denied because the decision itself failed.
    pub decision_errors: u64,
    /// Unlock cycles started (camera node only).
    pub unlocks: u64,
    /// `WxHxC` agreed for the session, once negotiated.
    pub shape: Option<String>,
    pub stop: StopReason,
}

impl LoopReport {
    pub(crate) fn new() -> Self {
        Self {
            frames: 0,
            grants: 0,
            denies: 0,
            skipped: 0,
            decision_errors: 0,
            unlocks: 0,
            shape: None,
            stop: StopReason::SourceExhausted,
        }
    }

    pub(crate) fn record_answer(&mut self, grant: bool) {
        self.frames += 1;
        if grant {
            self.grants += 1;
        } else {
            self.denies += 1;
        }
    }

    pub(crate) fn finish(mut self, stop: StopReason) -> Self {
        self.stop = stop;
        self
    }
}
