use facegate_frame::FrameError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (resolve, bind, connect, accept).
    #[error("transport error: {0}")]
    Transport(#[from] facegate_transport::TransportError),

    /// The peer or the caller broke the session protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Socket read/write failure, including reads cut short by EOF.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(FrameError),

    /// The peer closed the connection between two messages.
    #[error("peer disconnected")]
    Disconnected,

    /// The stop signal fired while the session was waiting.
    #[error("session interrupted")]
    Interrupted,

    /// The session already failed or was closed.
    #[error("session closed")]
    Closed,

    /// A frame does not fit the negotiated shape; nothing was sent.
    #[error("frame shape {actual:?} does not match negotiated {expected:?}")]
    ShapeMismatch {
        expected: (u64, u64, u64),
        actual: (u64, u64, u64),
    },
}

impl SessionError {
    /// Map a read-side frame error.
    pub(crate) fn from_read(err: FrameError) -> Self {
        match err {
            FrameError::Io(io) => SessionError::Io(io),
            FrameError::ConnectionClosed => SessionError::Disconnected,
            FrameError::ShortRead { expected, received } => {
                SessionError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("connection closed after {received} of {expected} bytes"),
                ))
            }
            other => SessionError::Decode(other),
        }
    }

    /// Map a write-side frame error.
    pub(crate) fn from_write(err: FrameError) -> Self {
        match err {
            FrameError::Io(io) => SessionError::Io(io),
            FrameError::ConnectionClosed => SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "peer stopped accepting data",
            )),
            other => SessionError::Protocol(format!("cannot send message: {other}")),
        }
    }

    /// Whether this error ends the session without being a failure.
    pub fn is_clean_stop(&self) -> bool {
        matches!(self, SessionError::Interrupted | SessionError::Disconnected)
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
