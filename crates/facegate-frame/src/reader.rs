use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};
use facegate_transport::GateStream;
use tracing::{debug, warn};

use crate::codec::{decode_frame, peek_length_prefix, FrameConfig, LENGTH_PREFIX_SIZE};
use crate::error::{FrameError, Result};
use crate::frame::Frame;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const MIN_READ_CHUNK: usize = 8 * 1024;
const MAX_READ_CHUNK: usize = 4 * 1024 * 1024;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete messages.
/// A read timeout surfaces as [`FrameError::Io`] with the buffered bytes
/// kept, so the same call can simply be retried.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read exactly `len` bytes (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached
    /// before the first byte, `Err(FrameError::ShortRead)` when it is
    /// reached part way through.
    pub fn read_fixed(&mut self, len: usize) -> Result<Bytes> {
        self.fill_to(len, len)?;
        Ok(self.buf.split_to(len).freeze())
    }

    /// Read one length-prefixed payload (blocking).
    ///
    /// `chunk_hint` is the expected payload size. It sizes the individual
    /// reads; payloads larger than the hint are still read in full.
    pub fn read_prefixed(&mut self, chunk_hint: usize) -> Result<Bytes> {
        self.fill_to(LENGTH_PREFIX_SIZE, LENGTH_PREFIX_SIZE)?;

        let declared = peek_length_prefix(&self.buf).ok_or(FrameError::ShortRead {
            expected: LENGTH_PREFIX_SIZE,
            received: self.buf.len(),
        })?;
        let payload_len = usize::try_from(declared).unwrap_or(usize::MAX);
        if payload_len > self.config.max_payload_size {
            warn!(size = payload_len, max = self.config.max_payload_size, "peer declared oversized payload");
            return Err(FrameError::PayloadTooLarge {
                size: payload_len,
                max: self.config.max_payload_size,
            });
        }

        let total = LENGTH_PREFIX_SIZE + payload_len;
        self.fill_to(total, chunk_hint)?;

        self.buf.advance(LENGTH_PREFIX_SIZE);
        Ok(self.buf.split_to(payload_len).freeze())
    }

    /// Read one length-prefixed payload and decode it as a frame.
    pub fn read_frame(&mut self, chunk_hint: usize) -> Result<Frame> {
        let payload = self.read_prefixed(chunk_hint)?;
        decode_frame(payload)
    }

    /// Number of bytes received but not yet returned as a message.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn fill_to(&mut self, target: usize, chunk_hint: usize) -> Result<()> {
        let chunk_size = chunk_hint.clamp(MIN_READ_CHUNK, MAX_READ_CHUNK);

        while self.buf.len() < target {
            let start = self.buf.len();
            let want = chunk_size.min(target - start);
            self.buf.resize(start + want, 0);

            let read = match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {
                    self.buf.truncate(start);
                    continue;
                }
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(FrameError::Io(err));
                }
            };
            self.buf.truncate(start + read);

            if read == 0 {
                debug!(buffered = start, wanted = target, "peer closed the stream");
                return Err(if start == 0 {
                    FrameError::ConnectionClosed
                } else {
                    FrameError::ShortRead {
                        expected: target,
                        received: start,
                    }
                });
            }
        }
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl MessageReader<GateStream> {
    /// Create a message reader for `GateStream` and apply read timeout from config.
    pub fn with_config_gate(inner: GateStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: facegate_transport::TransportError) -> FrameError {
    match err {
        facegate_transport::TransportError::Io(io)
        | facegate_transport::TransportError::Accept(io) => FrameError::Io(io),
        facegate_transport::TransportError::Bind { source, .. }
        | facegate_transport::TransportError::Connect { source, .. }
        | facegate_transport::TransportError::Resolve { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
