use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::kind::TransportKind;
use crate::stream::GateStream;

/// Listening side of a transport.
///
/// Binds once and hands out connected [`GateStream`]s.
pub struct GateListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    kind: TransportKind,
}

impl GateListener {
    /// Bind and listen on `host:port`.
    ///
    /// Port `0` picks a free port; read it back with [`Self::local_addr`].
    pub fn bind(kind: TransportKind, host: &str, port: u16) -> Result<Self> {
        kind.ensure_supported()?;
        let addr = resolve(host, port)?;

        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind { addr, source: e })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::Bind { addr, source: e })?;

        info!(%local_addr, transport = %kind, "listening");

        Ok(Self {
            listener,
            local_addr,
            kind,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<GateStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        GateStream::from_tcp(stream)
    }

    /// Accept without blocking; `Ok(None)` when nobody is waiting.
    ///
    /// Only meaningful after [`Self::set_nonblocking`]`(true)`.
    pub fn try_accept(&self) -> Result<Option<GateStream>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                GateStream::from_tcp(stream).map(Some)
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// Switch the listening socket between blocking and polling accepts.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener.set_nonblocking(nonblocking).map_err(Into::into)
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport(&self) -> TransportKind {
        self.kind
    }
}

/// Connect to a listening node (blocking).
pub fn connect(kind: TransportKind, host: &str, port: u16) -> Result<GateStream> {
    kind.ensure_supported()?;
    let addr = resolve(host, port)?;
    let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect { addr, source: e })?;
    debug!(%addr, transport = %kind, "connected");
    GateStream::from_tcp(stream)
}

/// Resolve `host:port` to the first address the resolver returns.
fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let target = format!("{host}:{port}");
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            target: target.clone(),
            source,
        })?;
    addrs.next().ok_or_else(|| TransportError::Resolve {
        target,
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses returned"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_bind_accept_connect() {
        let listener = GateListener::bind(TransportKind::Tcp, "127.0.0.1", 0).unwrap();
        let port = listener.local_addr().port();
        assert_ne!(port, 0);

        let handle = std::thread::spawn(move || {
            let mut client = connect(TransportKind::Tcp, "127.0.0.1", port).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_udp_is_rejected_before_binding() {
        let result = GateListener::bind(TransportKind::Udp, "127.0.0.1", 0);
        assert!(matches!(
            result,
            Err(TransportError::Unsupported(TransportKind::Udp))
        ));

        let result = connect(TransportKind::Udp, "127.0.0.1", 9);
        assert!(matches!(
            result,
            Err(TransportError::Unsupported(TransportKind::Udp))
        ));
    }

    #[test]
    fn test_try_accept_polls() {
        let listener = GateListener::bind(TransportKind::Tcp, "127.0.0.1", 0).unwrap();
        listener.set_nonblocking(true).unwrap();
        assert!(listener.try_accept().unwrap().is_none());

        let port = listener.local_addr().port();
        let _client = connect(TransportKind::Tcp, "127.0.0.1", port).unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let accepted = loop {
            if let Some(stream) = listener.try_accept().unwrap() {
                break stream;
            }
            assert!(std::time::Instant::now() < deadline, "accept never became ready");
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert!(accepted.peer_addr().is_ok());
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to obtain a port with nothing listening.
        let port = {
            let listener = GateListener::bind(TransportKind::Tcp, "127.0.0.1", 0).unwrap();
            listener.local_addr().port()
        };
        let result = connect(TransportKind::Tcp, "127.0.0.1", port);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_clone_shares_connection() {
        let listener = GateListener::bind(TransportKind::Tcp, "127.0.0.1", 0).unwrap();
        let port = listener.local_addr().port();

        let handle = std::thread::spawn(move || {
            let stream = connect(TransportKind::Tcp, "127.0.0.1", port).unwrap();
            let mut writer = stream.try_clone().unwrap();
            writer.write_all(b"ab").unwrap();
            let mut reader = stream;
            let mut buf = [0u8; 1];
            reader.read_exact(&mut buf).unwrap();
            buf[0]
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 2];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ab");
        server.write_all(&[1]).unwrap();

        assert_eq!(handle.join().unwrap(), 1);
    }
}
