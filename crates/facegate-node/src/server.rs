use std::io::{Read, Write};

use facegate_decision::{DecisionEngine, DecisionError};
use facegate_frame::Frame;
use facegate_session::{Session, SessionError, SessionListener, StopSignal};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::report::{LoopReport, StopReason};

/// Anything that can answer grant/deny for one frame.
pub trait Decide {
    fn decide(&mut self, frame: &Frame) -> std::result::Result<bool, DecisionError>;
}

impl Decide for DecisionEngine {
    fn decide(&mut self, frame: &Frame) -> std::result::Result<bool, DecisionError> {
        DecisionEngine::decide(self, frame).map(|decision| decision.grant)
    }
}

/// Accept exactly one camera connection on `listener` and serve it.
///
/// Attach the stop signal to the listener with
/// [`SessionListener::with_stop`] so a pending accept can be interrupted.
pub fn run_server(
    listener: &SessionListener,
    decider: &mut dyn Decide,
    stop: &StopSignal,
) -> Result<LoopReport> {
    info!(addr = %listener.local_addr(), "waiting for camera");
    let mut session = match listener.accept() {
        Ok(session) => session,
        Err(SessionError::Interrupted) => {
            info!("stopped before a camera connected");
            return Ok(LoopReport::new().finish(StopReason::Interrupted));
        }
        Err(err) => return Err(err.into()),
    };
    if let Ok(peer) = session.get_ref().0.peer_addr() {
        info!(%peer, "camera connected");
    }
    serve_session(&mut session, decider, stop)
}

/// Negotiate as the decision node, then answer frames until the camera
/// hangs up or a stop is requested.
///
/// A failed decision is answered with a deny and the loop continues.
pub fn serve_session<R: Read, W: Write>(
    session: &mut Session<R, W>,
    decider: &mut dyn Decide,
    stop: &StopSignal,
) -> Result<LoopReport> {
    let mut report = LoopReport::new();

    let shape = match session.negotiate_server() {
        Ok(shape) => shape,
        Err(SessionError::Interrupted) => return Ok(report.finish(StopReason::Interrupted)),
        Err(err) => return Err(err.into()),
    };
    report.shape = Some(shape.to_string());

    let reason = loop {
        if stop.is_stopped() {
            break StopReason::Interrupted;
        }

        let frame = match session.recv_frame() {
            Ok(frame) => frame,
            Err(SessionError::Disconnected) => break StopReason::PeerClosed,
            Err(SessionError::Interrupted) => break StopReason::Interrupted,
            Err(err) => return Err(err.into()),
        };

        let grant = match decider.decide(&frame) {
            Ok(grant) => grant,
            Err(err) => {
                warn!(error = %err, "decision failed, denying");
                report.decision_errors += 1;
                false
            }
        };

        session.send_answer(grant)?;
        report.record_answer(grant);
        debug!(frame = report.frames, grant, "answer sent");
    };

    session.close();
    info!(
        %reason,
        frames = report.frames,
        grants = report.grants,
        denies = report.denies,
        "decision loop finished"
    );
    Ok(report.finish(reason))
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use facegate_decision::{
        DenyFallback, DetectedFace, EncodingMatcher, FaceBox, FaceEmbedding, KnownEmbeddingSet,
    };
    use facegate_frame::{FrameSequence, PixelLayout};
    use facegate_session::NegotiatedShape;
    use facegate_transport::TransportKind;

    use super::*;
    use crate::client::{run_client, ClientConfig, UnlockTrigger};
    use crate::error::NodeError;

    struct Fixed(bool);

    impl Decide for Fixed {
        fn decide(&mut self, _frame: &Frame) -> std::result::Result<bool, DecisionError> {
            Ok(self.0)
        }
    }

    struct Failing;

    impl Decide for Failing {
        fn decide(&mut self, _frame: &Frame) -> std::result::Result<bool, DecisionError> {
            Err(DecisionError::Fallback("detector offline".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<u64>>);

    impl UnlockTrigger for Recorder {
        fn trigger(&mut self) {
            *self.0.lock().unwrap() += 1;
        }
    }

    fn bgr(width: u32, height: u32) -> Frame {
        Frame::new(
            vec![7u8; (width * height * 3) as usize],
            width,
            height,
            PixelLayout::Bgr,
        )
        .unwrap()
    }

    fn sessions() -> (
        Session<UnixStream, UnixStream>,
        Session<UnixStream, UnixStream>,
    ) {
        let (left, right) = UnixStream::pair().unwrap();
        (
            Session::new(left.try_clone().unwrap(), left),
            Session::new(right.try_clone().unwrap(), right),
        )
    }

    #[test]
    fn answers_every_frame_in_order_until_peer_closes() {
        let (mut client, mut server) = sessions();
        let handle = thread::spawn(move || {
            serve_session(&mut server, &mut Fixed(false), &StopSignal::new()).unwrap()
        });

        client.negotiate_client(NegotiatedShape::new(3, 3, 3)).unwrap();
        for _ in 0..4 {
            client.send_frame(&bgr(3, 3)).unwrap();
            assert!(!client.recv_answer().unwrap());
        }
        drop(client);

        let report = handle.join().unwrap();
        assert_eq!(report.stop, StopReason::PeerClosed);
        assert_eq!((report.frames, report.denies), (4, 4));
        assert_eq!(report.shape.as_deref(), Some("3x3x3"));
    }

    #[test]
    fn decision_errors_deny_and_continue() {
        let (mut client, mut server) = sessions();
        let handle = thread::spawn(move || {
            serve_session(&mut server, &mut Failing, &StopSignal::new()).unwrap()
        });

        client.negotiate_client(NegotiatedShape::new(2, 2, 3)).unwrap();
        for _ in 0..2 {
            client.send_frame(&bgr(2, 2)).unwrap();
            assert!(!client.recv_answer().unwrap());
        }
        drop(client);

        let report = handle.join().unwrap();
        assert_eq!(report.decision_errors, 2);
        assert_eq!(report.denies, 2);
    }

    #[test]
    fn garbage_negotiation_is_error() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut server = Session::new(right.try_clone().unwrap(), right);
        {
            use std::io::Write as _;
            let mut raw = left;
            raw.write_all(&[1, 2, 3]).unwrap();
        }
        let err = serve_session(&mut server, &mut Fixed(true), &StopSignal::new()).unwrap_err();
        assert!(matches!(err, NodeError::Session(SessionError::Protocol(_))));
    }

    #[test]
    fn stopped_listener_reports_interrupt() {
        let stop = StopSignal::new();
        stop.stop();
        let listener = SessionListener::bind(TransportKind::Tcp, "127.0.0.1", 0)
            .unwrap()
            .with_stop(stop.clone())
            .unwrap();
        let report = run_server(&listener, &mut Fixed(true), &stop).unwrap();
        assert_eq!(report.stop, StopReason::Interrupted);
        assert_eq!(report.frames, 0);
    }

    #[test]
    fn end_to_end_grant_schedules_unlock() {
        let listener = SessionListener::bind(TransportKind::Tcp, "127.0.0.1", 0).unwrap();
        let port = listener.local_addr().port();

        let server = thread::spawn(move || {
            let embedding = FaceEmbedding::new(vec![0.1, 0.2, 0.3]).unwrap();
            let allow = KnownEmbeddingSet::from_embeddings(vec![embedding.clone()]).unwrap();
            let detector = move |rgb: &Frame| -> facegate_decision::Result<Vec<DetectedFace>> {
                assert_eq!(rgb.shape(), (640, 480, 3));
                Ok(vec![DetectedFace {
                    bounds: FaceBox {
                        top: 100,
                        right: 300,
                        bottom: 300,
                        left: 100,
                    },
                    embedding: embedding.clone(),
                }])
            };
            let mut engine = DecisionEngine::new(
                detector,
                DenyFallback,
                allow,
                KnownEmbeddingSet::empty(),
                EncodingMatcher::default(),
            );
            run_server(&listener, &mut engine, &StopSignal::new()).unwrap()
        });

        let mut session =
            facegate_session::connect(TransportKind::Tcp, "127.0.0.1", port).unwrap();
        let mut source = FrameSequence::new(vec![bgr(640, 480)]);
        let mut trigger = Recorder::default();
        let client_report = run_client(
            &mut session,
            &mut source,
            &mut trigger,
            &ClientConfig {
                delay: Duration::from_millis(1),
            },
            &StopSignal::new(),
        )
        .unwrap();
        drop(session);

        assert_eq!(client_report.shape.as_deref(), Some("640x480x3"));
        assert_eq!(client_report.grants, 1);
        assert_eq!(client_report.unlocks, 1);
        assert_eq!(*trigger.0.lock().unwrap(), 1);

        let server_report = server.join().unwrap();
        assert_eq!(server_report.grants, 1);
        assert_eq!(server_report.stop, StopReason::PeerClosed);
    }
}
