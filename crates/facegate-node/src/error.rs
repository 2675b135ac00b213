use facegate_frame::SourceError;
use facegate_session::SessionError;
use facegate_transport::TransportError;

/// Errors that end a node loop.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The frame source failed to produce a frame.
    #[error("frame source: {0}")]
    Source(SourceError),
}

impl NodeError {
    /// Whether this is a wire or socket failure rather than bad local input.
    pub fn is_transport(&self) -> bool {
        match self {
            NodeError::Transport(_) => true,
            NodeError::Session(err) => matches!(
                err,
                SessionError::Transport(_) | SessionError::Io(_) | SessionError::Disconnected
            ),
            NodeError::Source(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;
