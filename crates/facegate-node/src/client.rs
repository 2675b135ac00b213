use std::io::{Read, Write};
use std::time::Duration;

use facegate_frame::{Frame, FrameSource};
use facegate_lock::LockController;
use facegate_session::{NegotiatedShape, Session, SessionError, StopSignal};
use tracing::{debug, info, warn};

use crate::error::{NodeError, Result};
use crate::report::{LoopReport, StopReason};

/// Camera node settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Pause between sending a frame and reading its answer.
    pub delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
        }
    }
}

/// Reaction to a granted frame. Must not block the loop.
pub trait UnlockTrigger {
    fn trigger(&mut self);
}

impl UnlockTrigger for LockController {
    fn trigger(&mut self) {
        // Fire and forget; the cycle reports its own outcome.
        drop(self.spawn_cycle());
    }
}

/// Stream frames from `source` over a fresh session until the source runs
/// dry, a stop is requested, or the session fails.
///
/// The first frame fixes the session shape and is then sent like any other.
/// Later frames of a different shape are skipped.
pub fn run_client<R: Read, W: Write>(
    session: &mut Session<R, W>,
    source: &mut dyn FrameSource,
    trigger: &mut dyn UnlockTrigger,
    config: &ClientConfig,
    stop: &StopSignal,
) -> Result<LoopReport> {
    let mut report = LoopReport::new();

    let first = match next_frame(source, stop)? {
        Next::Frame(frame) => frame,
        Next::Done(reason) => {
            info!(%reason, "camera stopped before negotiation");
            return Ok(report.finish(reason));
        }
    };

    let shape = session.negotiate_client(NegotiatedShape::of(&first))?;
    report.shape = Some(shape.to_string());

    let mut pending = Some(first);
    let reason = loop {
        let frame = match pending.take() {
            Some(frame) => frame,
            None => match next_frame(source, stop)? {
                Next::Frame(frame) => frame,
                Next::Done(reason) => break reason,
            },
        };

        if !shape.matches(&frame) {
            warn!(
                expected = %shape,
                actual = %NegotiatedShape::of(&frame),
                "frame shape changed, skipping"
            );
            report.skipped += 1;
            continue;
        }

        session.send_frame(&frame)?;

        if !stop.sleep(config.delay) {
            break StopReason::Interrupted;
        }

        let grant = match session.recv_answer() {
            Ok(grant) => grant,
            Err(SessionError::Interrupted) => break StopReason::Interrupted,
            Err(err) => return Err(err.into()),
        };
        report.record_answer(grant);
        debug!(frame = report.frames, grant, "answer received");

        if grant {
            info!("access granted, unlocking");
            trigger.trigger();
            report.unlocks += 1;
        }
    };

    session.close();
    info!(%reason, frames = report.frames, grants = report.grants, "camera loop finished");
    Ok(report.finish(reason))
}

enum Next {
    Frame(Frame),
    Done(StopReason),
}

fn next_frame(source: &mut dyn FrameSource, stop: &StopSignal) -> Result<Next> {
    if stop.is_stopped() {
        return Ok(Next::Done(StopReason::Interrupted));
    }
    match source.next_frame().map_err(NodeError::Source)? {
        Some(frame) => Ok(Next::Frame(frame)),
        None => Ok(Next::Done(StopReason::SourceExhausted)),
    }
}
