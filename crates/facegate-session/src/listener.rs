use std::net::SocketAddr;

use facegate_transport::{GateListener, TransportKind};
use tracing::debug;

use crate::connector::{open, GateSession};
use crate::error::{Result, SessionError};
use crate::session::SessionConfig;
use crate::stop::StopSignal;

/// Listens for camera node connections.
pub struct SessionListener {
    listener: GateListener,
    config: SessionConfig,
    stop: Option<StopSignal>,
}

impl SessionListener {
    /// Bind on `host:port`. Port `0` picks a free port.
    pub fn bind(kind: TransportKind, host: &str, port: u16) -> Result<Self> {
        let listener = GateListener::bind(kind, host, port)?;
        Ok(Self {
            listener,
            config: SessionConfig::default(),
            stop: None,
        })
    }

    /// Override the configuration applied to accepted sessions.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Make `accept` (and accepted sessions) observe `stop`.
    pub fn with_stop(mut self, stop: StopSignal) -> Result<Self> {
        self.listener.set_nonblocking(true)?;
        self.stop = Some(stop);
        Ok(self)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn transport(&self) -> TransportKind {
        self.listener.transport()
    }

    /// Accept the next connection as an un-negotiated session.
    ///
    /// With a stop signal attached, returns [`SessionError::Interrupted`]
    /// once it fires instead of blocking forever.
    pub fn accept(&self) -> Result<GateSession> {
        let stream = match &self.stop {
            None => self.listener.accept()?,
            Some(stop) => loop {
                if stop.is_stopped() {
                    debug!("accept interrupted");
                    return Err(SessionError::Interrupted);
                }
                if let Some(stream) = self.listener.try_accept()? {
                    break stream;
                }
                stop.sleep(self.config.poll_interval.min(ACCEPT_POLL));
            },
        };
        open(stream, &self.config, self.stop.clone())
    }
}

const ACCEPT_POLL: std::time::Duration = std::time::Duration::from_millis(50);
