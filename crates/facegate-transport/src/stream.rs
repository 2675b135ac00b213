use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected node-to-node stream implementing Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// Today it always wraps a TCP stream.
pub struct GateStream {
    inner: GateStreamInner,
}

enum GateStreamInner {
    Tcp(TcpStream),
}

impl Read for GateStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            GateStreamInner::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for GateStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            GateStreamInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            GateStreamInner::Tcp(stream) => stream.flush(),
        }
    }
}

impl GateStream {
    /// Create a GateStream from a TCP stream.
    ///
    /// Nagle is disabled: answers are a single byte and must not wait for
    /// the next frame.
    pub(crate) fn from_tcp(stream: TcpStream) -> Result<Self> {
        // Some platforms hand out accepted sockets inheriting the listener's
        // non-blocking flag.
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            inner: GateStreamInner::Tcp(stream),
        })
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            GateStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            GateStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            GateStreamInner::Tcp(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self {
                    inner: GateStreamInner::Tcp(cloned),
                })
            }
        }
    }

    /// Address of the remote node.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        match &self.inner {
            GateStreamInner::Tcp(stream) => stream.peer_addr().map_err(Into::into),
        }
    }
}

impl std::fmt::Debug for GateStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            GateStreamInner::Tcp(stream) => f
                .debug_struct("GateStream")
                .field("type", &"tcp")
                .field("peer", &stream.peer_addr().ok())
                .finish(),
        }
    }
}
