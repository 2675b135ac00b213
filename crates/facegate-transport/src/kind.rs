use std::fmt;
use std::str::FromStr;

use crate::error::TransportError;

/// Transport selected once at startup.
///
/// Only [`TransportKind::Tcp`] carries the session protocol. `Udp` is kept
/// so configuration naming it fails with a clear error instead of a parse
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    #[default]
    Tcp,
    Udp,
}

impl TransportKind {
    /// All identifiers accepted by [`FromStr`].
    pub const NAMES: [&'static str; 2] = ["tcp", "udp"];

    /// Identifier used on the command line and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Tcp => "tcp",
            TransportKind::Udp => "udp",
        }
    }

    /// Whether this transport has a stream implementation.
    pub fn is_supported(self) -> bool {
        matches!(self, TransportKind::Tcp)
    }

    pub(crate) fn ensure_supported(self) -> Result<(), TransportError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(TransportError::Unsupported(self))
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportKind::Tcp),
            "udp" => Ok(TransportKind::Udp),
            other => Err(TransportError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("tcp".parse::<TransportKind>().unwrap(), TransportKind::Tcp);
        assert_eq!(" UDP ".parse::<TransportKind>().unwrap(), TransportKind::Udp);
    }

    #[test]
    fn rejects_unknown_name() {
        let err = "rtsp".parse::<TransportKind>().unwrap_err();
        assert!(matches!(err, TransportError::UnknownKind(name) if name == "rtsp"));
    }

    #[test]
    fn only_tcp_is_supported() {
        assert!(TransportKind::Tcp.ensure_supported().is_ok());
        assert!(matches!(
            TransportKind::Udp.ensure_supported(),
            Err(TransportError::Unsupported(TransportKind::Udp))
        ));
    }

    #[test]
    fn display_matches_names() {
        for (kind, name) in [TransportKind::Tcp, TransportKind::Udp]
            .into_iter()
            .zip(TransportKind::NAMES)
        {
            assert_eq!(kind.to_string(), name);
        }
    }
}
