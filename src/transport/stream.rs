//! Non-blocking Unix-socket connection transport.
//!
//! Produced by [`NonblockingUnixListener::accept`] on the server side and
//! by [`UnixTransport::connect`] on the client side. Every read and write
//! returns immediately; "nothing to do right now" is a zero count, never a
//! blocked thread.
//!
//! [`NonblockingUnixListener::accept`]: crate::NonblockingUnixListener::accept

use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use mio::unix::SourceFd;
use mio::{Interest, Registry, Token};

use crate::core::{Transport, TransportError, TransportResult};

/// A non-blocking connection transport over a Unix domain socket.
///
/// Owns its socket exclusively; dropping or closing the transport closes
/// the connection. There is no back-reference to the listener that
/// produced it.
#[derive(Debug)]
pub struct UnixTransport {
    /// `None` once closed.
    stream: Option<UnixStream>,
}

impl UnixTransport {
    /// Wrap an accepted or connected stream: switch it to non-blocking and
    /// apply the per-connection timeout.
    ///
    /// The timeout is carried onto the socket (`SO_RCVTIMEO`/`SO_SNDTIMEO`)
    /// for callers that later flip the socket back to blocking; it has no
    /// effect while the socket stays non-blocking.
    pub(crate) fn from_stream(
        stream: UnixStream,
        timeout: Option<Duration>,
    ) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        if let Some(timeout) = timeout.filter(|t| !t.is_zero()) {
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
        }
        Ok(Self {
            stream: Some(stream),
        })
    }

    /// Connect to a listening Unix socket at `path`.
    ///
    /// The returned transport is non-blocking, like its accepted
    /// counterpart.
    pub fn connect(path: impl AsRef<Path>, timeout: Option<Duration>) -> TransportResult<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| {
            TransportError::setup(
                format!("could not connect unix socket at {}", path.display()),
                e,
            )
        })?;
        Self::from_stream(stream, timeout).map_err(TransportError::Io)
    }

    /// Register this connection's readiness events with an externally
    /// owned multiplexer.
    ///
    /// Fails with `NotOpen` when the transport was closed concurrently;
    /// callers racing registration against close may ignore that result
    /// (`let _ =`).
    pub fn register(
        &self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> TransportResult<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or(TransportError::NotOpen("register on closed connection"))?;
        registry
            .register(&mut SourceFd(&stream.as_raw_fd()), token, interests)
            .map_err(TransportError::Io)
    }
}

impl Transport for UnixTransport {
    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Read up to `buf.len()` bytes. `Ok(0)` means no data is currently
    /// available; a peer hangup surfaces as [`TransportError::Closed`].
    fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(TransportError::NotOpen("read on closed connection"))?;
        if buf.is_empty() {
            return Ok(0);
        }
        match stream.read(buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Write up to `buf.len()` bytes, returning the count accepted.
    /// `Ok(0)` means the socket's send buffer is full.
    fn write(&mut self, buf: &[u8]) -> TransportResult<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(TransportError::NotOpen("write on closed connection"))?;
        match stream.write(buf) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(ref e) if e.kind() == io::ErrorKind::BrokenPipe => Err(TransportError::Closed),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn flush(&mut self) -> TransportResult<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream.flush().map_err(TransportError::Io)?;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    fn socket_pair() -> (UnixTransport, UnixStream) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let client = UnixStream::connect(&path).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        let transport = UnixTransport::from_stream(accepted, None).unwrap();
        // Established connections survive the socket file's removal.
        drop(dir);
        (transport, client)
    }

    #[test]
    fn test_read_without_data_returns_zero() {
        let (mut transport, _client) = socket_pair();
        let mut buf = [0u8; 16];
        assert_eq!(transport.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_returns_peer_bytes() {
        let (mut transport, mut client) = socket_pair();
        client.write_all(b"ping").unwrap();

        let mut buf = [0u8; 16];
        let n = transport.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }

    #[test]
    fn test_read_after_peer_hangup_is_closed() {
        let (mut transport, client) = socket_pair();
        drop(client);

        let mut buf = [0u8; 16];
        let err = transport.read(&mut buf).unwrap_err();
        assert!(err.is_closed());
    }

    #[test]
    fn test_write_reaches_peer() {
        let (mut transport, mut client) = socket_pair();
        assert_eq!(transport.write(b"pong").unwrap(), 4);
        transport.flush().unwrap();

        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[test]
    fn test_use_after_close_is_not_open() {
        let (mut transport, _client) = socket_pair();
        transport.close();
        assert!(!transport.is_open());

        let mut buf = [0u8; 4];
        assert!(transport.read(&mut buf).unwrap_err().is_not_open());
        assert!(transport.write(&buf).unwrap_err().is_not_open());

        // Idempotent.
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn test_connect_to_missing_endpoint_is_setup_error() {
        let err = UnixTransport::connect("/nonexistent/courier.sock", None).unwrap_err();
        assert!(err.is_setup());
    }
}
