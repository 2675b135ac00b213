use std::fmt;
use std::io::{Read, Write};
use std::time::Duration;

use facegate_frame::{Frame, FrameConfig, FrameError, MessageReader, MessageWriter};
use tracing::{debug, info, warn};

use crate::answer::{decode_answer, encode_answer};
use crate::error::{Result, SessionError};
use crate::negotiate::{NegotiatedShape, NEGOTIATION_SIZE};
use crate::stop::StopSignal;

/// Lifecycle of one connection.
///
/// `Init -> Negotiated -> Streaming -> Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Negotiated,
    Streaming,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Init => "init",
            SessionState::Negotiated => "negotiated",
            SessionState::Streaming => "streaming",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Which end of the session this is, fixed by the negotiation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Camera node: sends frames, receives answers.
    Client,
    /// Decision node: receives frames, sends answers.
    Server,
}

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Message I/O limits and socket timeouts.
    pub frame: FrameConfig,
    /// Socket read timeout used to wake up and check the stop signal.
    ///
    /// This is not a protocol deadline: a timed-out read is retried until
    /// data arrives or the stop signal fires.
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// One negotiated, request/response connection between two nodes.
pub struct Session<R, W> {
    reader: MessageReader<R>,
    writer: MessageWriter<W>,
    state: SessionState,
    role: Option<Role>,
    shape: Option<NegotiatedShape>,
    outstanding: bool,
    exchanges: u64,
    stop: Option<StopSignal>,
}

impl<R: Read, W: Write> Session<R, W> {
    /// Wrap a connected stream pair with default configuration.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, &SessionConfig::default())
    }

    /// Wrap a connected stream pair with explicit configuration.
    pub fn with_config(reader: R, writer: W, config: &SessionConfig) -> Self {
        Self::from_parts(
            MessageReader::with_config(reader, config.frame.clone()),
            MessageWriter::with_config(writer, config.frame.clone()),
        )
    }

    pub(crate) fn from_parts(reader: MessageReader<R>, writer: MessageWriter<W>) -> Self {
        Self {
            reader,
            writer,
            state: SessionState::Init,
            role: None,
            shape: None,
            outstanding: false,
            exchanges: 0,
            stop: None,
        }
    }

    /// Observe `stop` whenever a blocking read times out.
    pub fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Negotiated shape, once negotiation succeeded.
    pub fn shape(&self) -> Option<NegotiatedShape> {
        self.shape
    }

    /// Completed frame/answer round trips.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    /// Client side of negotiation: announce the shape all frames will have.
    pub fn negotiate_client(&mut self, shape: NegotiatedShape) -> Result<NegotiatedShape> {
        self.expect_state(SessionState::Init, "negotiate")?;
        if let Err(err) = shape.validate(self.writer.config().max_payload_size) {
            self.close();
            return Err(err);
        }

        self.writer
            .write_fixed(&shape.to_wire())
            .map_err(|err| self.fail(SessionError::from_write(err)))?;

        self.finish_negotiation(Role::Client, shape);
        Ok(shape)
    }

    /// Server side of negotiation: read the client's shape.
    pub fn negotiate_server(&mut self) -> Result<NegotiatedShape> {
        self.expect_state(SessionState::Init, "negotiate")?;

        let raw = self
            .read_polling(|reader| reader.read_fixed(NEGOTIATION_SIZE))
            .map_err(|err| match err {
                SessionError::Disconnected => SessionError::Protocol(
                    "connection closed before negotiation".to_string(),
                ),
                SessionError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                    SessionError::Protocol(format!("incomplete negotiation: {io}"))
                }
                other => other,
            })
            .map_err(|err| self.fail(err))?;

        let shape = NegotiatedShape::from_wire(&raw)
            .and_then(|shape| {
                shape.validate(self.reader.config().max_payload_size)?;
                Ok(shape)
            })
            .map_err(|err| self.fail(err))?;

        self.finish_negotiation(Role::Server, shape);
        Ok(shape)
    }

    /// Send one frame (client only). The answer must be read before the
    /// next frame may be sent.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        let shape = self.expect_streaming(Role::Client, "send a frame")?;
        if self.outstanding {
            return Err(SessionError::Protocol(
                "previous frame has not been answered".to_string(),
            ));
        }
        if !shape.matches(frame) {
            return Err(SessionError::ShapeMismatch {
                expected: shape.as_tuple(),
                actual: NegotiatedShape::of(frame).as_tuple(),
            });
        }

        self.writer
            .write_frame(frame)
            .map_err(|err| self.fail(SessionError::from_write(err)))?;
        self.outstanding = true;
        debug!(bytes = frame.byte_len(), "frame sent");
        Ok(())
    }

    /// Receive one frame (server only). It must be answered before the next
    /// frame is read.
    pub fn recv_frame(&mut self) -> Result<Frame> {
        let shape = self.expect_streaming(Role::Server, "receive a frame")?;
        if self.outstanding {
            return Err(SessionError::Protocol(
                "previous frame has not been answered".to_string(),
            ));
        }

        let hint = shape.expected_payload_size();
        let frame = self
            .read_polling(|reader| reader.read_frame(hint))
            .map_err(|err| self.fail(err))?;

        if !shape.matches(&frame) {
            let err = SessionError::Protocol(format!(
                "received {}x{}x{} frame in a {shape} session",
                frame.width(),
                frame.height(),
                frame.channels()
            ));
            return Err(self.fail(err));
        }

        self.outstanding = true;
        debug!(bytes = frame.byte_len(), "frame received");
        Ok(frame)
    }

    /// Answer the outstanding frame (server only).
    pub fn send_answer(&mut self, grant: bool) -> Result<()> {
        self.expect_streaming(Role::Server, "send an answer")?;
        if !self.outstanding {
            return Err(SessionError::Protocol(
                "no frame is waiting for an answer".to_string(),
            ));
        }

        self.writer
            .write_fixed(&[encode_answer(grant)])
            .map_err(|err| self.fail(SessionError::from_write(err)))?;
        self.complete_exchange();
        Ok(())
    }

    /// Read the answer to the outstanding frame (client only).
    pub fn recv_answer(&mut self) -> Result<bool> {
        self.expect_streaming(Role::Client, "receive an answer")?;
        if !self.outstanding {
            return Err(SessionError::Protocol(
                "no frame is waiting for an answer".to_string(),
            ));
        }

        let raw = self
            .read_polling(|reader| reader.read_fixed(1))
            .map_err(|err| match err {
                SessionError::Disconnected => SessionError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed while waiting for an answer",
                )),
                other => other,
            })
            .map_err(|err| self.fail(err))?;
        let grant = decode_answer(raw[0]).map_err(|err| self.fail(err))?;

        self.complete_exchange();
        Ok(grant)
    }

    /// Move to `Closed`. Further operations fail with [`SessionError::Closed`].
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            debug!(from = %self.state, exchanges = self.exchanges, "session closed");
            self.state = SessionState::Closed;
        }
    }

    /// Borrow the underlying reader and writer streams.
    pub fn get_ref(&self) -> (&R, &W) {
        (self.reader.get_ref(), self.writer.get_ref())
    }

    fn finish_negotiation(&mut self, role: Role, shape: NegotiatedShape) {
        self.role = Some(role);
        self.shape = Some(shape);
        self.state = SessionState::Negotiated;
        info!(?role, %shape, "session negotiated");
    }

    fn complete_exchange(&mut self) {
        self.outstanding = false;
        self.exchanges += 1;
        self.state = SessionState::Streaming;
    }

    fn expect_state(&self, expected: SessionState, action: &str) -> Result<()> {
        match self.state {
            SessionState::Closed => Err(SessionError::Closed),
            state if state == expected => Ok(()),
            state => Err(SessionError::Protocol(format!(
                "cannot {action} in state {state}"
            ))),
        }
    }

    fn expect_streaming(&self, role: Role, action: &str) -> Result<NegotiatedShape> {
        match (self.state, self.shape) {
            (SessionState::Closed, _) => Err(SessionError::Closed),
            (SessionState::Init, _) | (_, None) => Err(SessionError::Protocol(format!(
                "cannot {action} before negotiation"
            ))),
            (_, Some(shape)) if self.role == Some(role) => Ok(shape),
            (_, Some(_)) => Err(SessionError::Protocol(format!(
                "cannot {action} as {:?}",
                self.role
            ))),
        }
    }

    /// Run a blocking read, retrying poll timeouts until data arrives or
    /// the stop signal fires.
    fn read_polling<T>(
        &mut self,
        mut op: impl FnMut(&mut MessageReader<R>) -> std::result::Result<T, FrameError>,
    ) -> Result<T> {
        loop {
            if self.stop_requested() {
                return Err(SessionError::Interrupted);
            }
            match op(&mut self.reader) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_timeout() => continue,
                Err(err) => return Err(SessionError::from_read(err)),
            }
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(StopSignal::is_stopped)
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        match &err {
            SessionError::Interrupted | SessionError::Disconnected => {
                debug!(error = %err, "session ending");
            }
            _ => warn!(error = %err, state = %self.state, "session failed"),
        }
        self.close();
        err
    }
}

impl<R, W> fmt::Debug for Session<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("role", &self.role)
            .field("shape", &self.shape)
            .field("outstanding", &self.outstanding)
            .field("exchanges", &self.exchanges)
            .finish()
    }
}
