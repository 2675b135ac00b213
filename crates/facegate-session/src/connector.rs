use facegate_frame::{FrameConfig, MessageReader, MessageWriter};
use facegate_transport::{GateStream, TransportKind};

use crate::error::{Result, SessionError};
use crate::session::{Session, SessionConfig};
use crate::stop::StopSignal;

/// A session over a connected [`GateStream`].
pub type GateSession = Session<GateStream, GateStream>;

/// Connect to a listening decision node with default configuration.
///
/// The returned session is not yet negotiated.
pub fn connect(kind: TransportKind, host: &str, port: u16) -> Result<GateSession> {
    connect_with_config(kind, host, port, &SessionConfig::default(), None)
}

/// Connect with explicit configuration and an optional stop signal.
pub fn connect_with_config(
    kind: TransportKind,
    host: &str,
    port: u16,
    config: &SessionConfig,
    stop: Option<StopSignal>,
) -> Result<GateSession> {
    let stream = facegate_transport::connect(kind, host, port)?;
    open(stream, config, stop)
}

/// Wrap an already-connected stream.
///
/// Reads time out every `poll_interval` so the stop signal is observed
/// while blocked; writes keep the frame config's write timeout.
pub(crate) fn open(
    stream: GateStream,
    config: &SessionConfig,
    stop: Option<StopSignal>,
) -> Result<GateSession> {
    let reader_stream = stream.try_clone()?;

    let frame_config = FrameConfig {
        read_timeout: Some(config.poll_interval),
        ..config.frame.clone()
    };

    let reader = MessageReader::with_config_gate(reader_stream, frame_config.clone())
        .map_err(SessionError::from_read)?;
    let writer =
        MessageWriter::with_config_gate(stream, frame_config).map_err(SessionError::from_read)?;

    let session = Session::from_parts(reader, writer);
    Ok(match stop {
        Some(stop) => session.with_stop(stop),
        None => session,
    })
}
