use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use facegate_transport::GateStream;
use tracing::{debug, warn};

use crate::codec::{encode_frame, encoded_len, put_length_prefix, FrameConfig, LENGTH_PREFIX_SIZE};
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete messages to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new message writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a fixed-size record with no prefix (blocking).
    pub fn write_fixed(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.write_buffered()
    }

    /// Write a payload behind its length prefix (blocking).
    pub fn write_prefixed(&mut self, payload: &[u8]) -> Result<()> {
        self.check_size(payload.len())?;

        self.buf.clear();
        self.buf.reserve(LENGTH_PREFIX_SIZE + payload.len());
        put_length_prefix(payload.len(), &mut self.buf);
        self.buf.extend_from_slice(payload);
        self.write_buffered()
    }

    /// Encode `frame` and write it behind its length prefix (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let len = encoded_len(frame);
        self.check_size(len)?;

        self.buf.clear();
        self.buf.reserve(LENGTH_PREFIX_SIZE + len);
        put_length_prefix(len, &mut self.buf);
        encode_frame(frame, &mut self.buf);
        self.write_buffered()
    }

    fn check_size(&self, len: usize) -> Result<()> {
        if len > self.config.max_payload_size {
            warn!(size = len, max = self.config.max_payload_size, "refusing to send oversized payload");
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.config.max_payload_size,
            });
        }
        Ok(())
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => {
                    debug!(written = offset, total = self.buf.len(), "peer stopped accepting data");
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // A write timeout is fatal: part of the message may already be on the wire.
                Err(err) => {
                    debug!(written = offset, total = self.buf.len(), error = %err, "write failed");
                    return Err(FrameError::Io(err));
                }
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl MessageWriter<GateStream> {
    /// Create a message writer for `GateStream` and apply write timeout from config.
    pub fn with_config_gate(inner: GateStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::HEADER_SIZE;
    use crate::layout::PixelLayout;
    use crate::reader::MessageReader;

    #[test]
    fn write_prefixed_layout() {
        let mut writer = MessageWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_prefixed(b"hello").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(&wire[..LENGTH_PREFIX_SIZE], &5u64.to_ne_bytes());
        assert_eq!(&wire[LENGTH_PREFIX_SIZE..], b"hello");
    }

    #[test]
    fn write_fixed_has_no_prefix() {
        let mut writer = MessageWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_fixed(&[0]).unwrap();
        assert_eq!(writer.into_inner().into_inner(), vec![0]);
    }

    #[test]
    fn write_frame_prefix_covers_header_and_pixels() {
        let frame = Frame::new(vec![3u8; 4 * 2 * 3], 4, 2, PixelLayout::Rgb).unwrap();
        let mut writer = MessageWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_frame(&frame).unwrap();

        let wire = writer.into_inner().into_inner();
        let declared = u64::from_ne_bytes(wire[..LENGTH_PREFIX_SIZE].try_into().unwrap());
        assert_eq!(declared as usize, HEADER_SIZE + 24);
        assert_eq!(wire.len(), LENGTH_PREFIX_SIZE + HEADER_SIZE + 24);

        let mut reader = MessageReader::new(Cursor::new(wire));
        assert_eq!(reader.read_frame(24).unwrap(), frame);
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = MessageWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.write_prefixed(b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 4 }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn retries_interrupted_write_and_flush_then_flushes() {
        let sink = ScriptedSink::new(vec![Err(ErrorKind::Interrupted)], 1);
        let mut writer = MessageWriter::new(sink);
        writer.write_prefixed(b"retry").unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.data.len(), LENGTH_PREFIX_SIZE + 5);
        assert!(sink.flushed);
    }

    #[test]
    fn short_writes_are_resumed() {
        let sink = ScriptedSink::new(vec![Ok(3), Ok(2)], 0);
        let mut writer = MessageWriter::new(sink);
        writer.write_fixed(&[9, 8, 7, 6, 5, 4]).unwrap();
        assert_eq!(writer.into_inner().data, vec![9, 8, 7, 6, 5, 4]);
    }

    #[test]
    fn zero_length_write_means_peer_closed() {
        let mut writer = MessageWriter::new(ScriptedSink::new(vec![Ok(0)], 0));
        let err = writer.write_fixed(&[1]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn broken_pipe_is_io_error() {
        let sink = ScriptedSink::new(vec![Err(ErrorKind::BrokenPipe)], 0);
        let mut writer = MessageWriter::new(sink);
        let err = writer.write_prefixed(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn would_block_write_fails_instead_of_retrying() {
        let sink = ScriptedSink::new(vec![Ok(2), Err(ErrorKind::WouldBlock)], 0);
        let mut writer = MessageWriter::new(sink);
        let err = writer.write_fixed(&[1, 2, 3, 4]).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(writer.into_inner().data, vec![1, 2]);
    }

    #[cfg(unix)]
    #[test]
    fn write_timeout_on_stalled_peer_returns_error() {
        use std::os::unix::net::UnixStream;
        use std::time::{Duration, Instant};

        let (stream, _peer) = UnixStream::pair().unwrap();
        stream
            .set_write_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let frame = Frame::new(vec![7u8; 640 * 480 * 3], 640, 480, PixelLayout::Rgb).unwrap();
        let mut writer = MessageWriter::new(stream);

        let started = Instant::now();
        let err = writer.write_frame(&frame).unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    /// Sink that replays scripted write outcomes before accepting everything.
    /// `Ok(n)` accepts at most `n` bytes.
    struct ScriptedSink {
        script: std::collections::VecDeque<std::result::Result<usize, ErrorKind>>,
        flush_interrupts: usize,
        flushed: bool,
        data: Vec<u8>,
    }

    impl ScriptedSink {
        fn new(
            script: Vec<std::result::Result<usize, ErrorKind>>,
            flush_interrupts: usize,
        ) -> Self {
            Self {
                script: script.into(),
                flush_interrupts,
                flushed: false,
                data: Vec::new(),
            }
        }
    }

    impl Write for ScriptedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = match self.script.pop_front() {
                Some(Err(kind)) => return Err(kind.into()),
                Some(Ok(limit)) => limit.min(buf.len()),
                None => buf.len(),
            };
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if self.flush_interrupts > 0 {
                self.flush_interrupts -= 1;
                return Err(ErrorKind::Interrupted.into());
            }
            self.flushed = true;
            Ok(())
        }
    }
}
