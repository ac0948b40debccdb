//! Non-blocking Unix-socket listening transport.
//!
//! Wraps a Unix domain server socket created non-blocking at the OS level,
//! so `accept` never suspends the calling thread: when no connection is
//! pending it returns `Ok(None)` and the caller goes back to its readiness
//! loop. The listener produces one independently owned [`UnixTransport`]
//! per accepted connection and keeps no reference to it afterwards.
//!
//! The listener does not own a poll loop. It only offers
//! [`register`](NonblockingUnixListener::register) so an external
//! `mio::Poll` can wake the caller when a connection is pending.

use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use mio::unix::SourceFd;
use mio::{Interest, Registry, Token};
use nix::sys::socket::{
    AddressFamily, Backlog, SockFlag, SockType, UnixAddr, bind, listen, socket,
};
use tracing::{debug, warn};

use crate::core::{ServerTransport, TransportError, TransportResult};

use super::stream::UnixTransport;

/// Default accept backlog when the builder is not told otherwise.
pub const DEFAULT_BACKLOG: i32 = 128;

/// A non-blocking listening endpoint over a Unix domain socket.
///
/// Lifecycle: a successful [`bind`](Self::bind) yields a listening
/// instance; a failed bind yields no instance at all (the unbound state
/// has no value-level representation). [`close`](Self::close) is
/// idempotent and terminal; re-binding requires a new instance.
///
/// `close` takes `&self` and may be called from a different thread than
/// the one driving the accept loop (interrupt semantics): an accept
/// already in flight may still complete or return `Ok(None)`, but no new
/// connections are produced afterwards.
///
/// # Example
///
/// ```no_run
/// use courier_transport::NonblockingUnixListener;
///
/// # fn main() -> courier_transport::TransportResult<()> {
/// let listener = NonblockingUnixListener::bind("/tmp/courier.sock", 128)?;
/// loop {
///     match listener.accept()? {
///         Some(conn) => { /* hand conn to the protocol layer */ }
///         None => break, // nothing pending, go back to the poll loop
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NonblockingUnixListener {
    /// The OS socket, exclusively owned. `None` once closed.
    inner: Mutex<Option<UnixListener>>,
    /// Bind path, kept for diagnostics.
    path: PathBuf,
    /// Timeout applied to every accepted connection.
    client_timeout: Option<Duration>,
}

impl NonblockingUnixListener {
    /// Bind a non-blocking Unix server socket at `path` with the given
    /// accept backlog.
    ///
    /// On failure (address in use, permission denied, bad path) returns
    /// [`TransportError::Setup`] and no listener exists.
    pub fn bind(path: impl AsRef<Path>, backlog: i32) -> TransportResult<Self> {
        UnixListenerBuilder::new().backlog(backlog).bind(path)
    }

    fn bind_inner(
        path: &Path,
        backlog: i32,
        client_timeout: Option<Duration>,
    ) -> TransportResult<Self> {
        let setup = |e: nix::errno::Errno| {
            TransportError::setup(
                format!("could not bind unix socket at {}", path.display()),
                std::io::Error::from_raw_os_error(e as i32),
            )
        };

        // Non-blocking from birth: no window where an accept could hang.
        let fd = socket(
            AddressFamily::Unix,
            SockType::Stream,
            SockFlag::SOCK_NONBLOCK | SockFlag::SOCK_CLOEXEC,
            None,
        )
        .map_err(setup)?;
        let addr = UnixAddr::new(path).map_err(setup)?;
        bind(fd.as_raw_fd(), &addr).map_err(setup)?;
        listen(&fd, Backlog::new(backlog).map_err(setup)?).map_err(setup)?;

        debug!(path = %path.display(), backlog, "unix listener bound");
        Ok(Self {
            inner: Mutex::new(Some(UnixListener::from(fd))),
            path: path.to_path_buf(),
            client_timeout,
        })
    }

    /// Attempt to accept one pending connection without blocking.
    ///
    /// Returns `Ok(None)` immediately when no connection is pending,
    /// `Err(NotOpen)` after [`close`](Self::close), and `Err(Io)` for any
    /// other OS-level accept failure. Retry policy belongs to the caller's
    /// event loop.
    pub fn accept(&self) -> TransportResult<Option<UnixTransport>> {
        let guard = self.lock();
        let listener = guard
            .as_ref()
            .ok_or(TransportError::NotOpen("accept on closed listener"))?;

        match listener.accept() {
            Ok((stream, _addr)) => {
                let conn = UnixTransport::from_stream(stream, self.client_timeout)
                    .map_err(TransportError::Io)?;
                Ok(Some(conn))
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "accept failed");
                Err(TransportError::Io(e))
            }
        }
    }

    /// Start listening. Binding already enabled the accept queue, so this
    /// only verifies the listener has not been closed.
    pub fn listen(&self) -> TransportResult<()> {
        if self.is_listening() {
            Ok(())
        } else {
            Err(TransportError::NotOpen("listen on closed listener"))
        }
    }

    /// Register interest in "connection pending" readiness with an
    /// externally owned multiplexer.
    ///
    /// Registration can race a concurrent [`close`](Self::close); that
    /// race is expected and non-fatal, so callers that tolerate it may
    /// ignore the result (`let _ = listener.register(...)`). The failure
    /// is logged either way.
    pub fn register(&self, registry: &Registry, token: Token) -> TransportResult<()> {
        let guard = self.lock();
        let Some(listener) = guard.as_ref() else {
            warn!(path = %self.path.display(), "multiplexer registration raced close");
            return Err(TransportError::NotOpen("register on closed listener"));
        };
        registry
            .register(&mut SourceFd(&listener.as_raw_fd()), token, Interest::READABLE)
            .map_err(TransportError::Io)
    }

    /// Release the OS socket. Idempotent and terminal.
    pub fn close(&self) {
        if self.lock().take().is_some() {
            debug!(path = %self.path.display(), "unix listener closed");
        }
    }

    /// Interrupt a remote accept loop by closing the listener.
    ///
    /// Safe to call from a different thread: at most one more in-flight
    /// accept may complete, then every accept fails with `NotOpen`.
    pub fn interrupt(&self) {
        self.close();
    }

    /// Check whether the listener is still accepting connections.
    pub fn is_listening(&self) -> bool {
        self.lock().is_some()
    }

    /// The path this listener was bound to.
    pub fn local_path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<UnixListener>> {
        // A poisoned lock only means another thread panicked mid-close;
        // the Option inside is still coherent.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ServerTransport for NonblockingUnixListener {
    type Conn = UnixTransport;

    fn listen(&self) -> TransportResult<()> {
        NonblockingUnixListener::listen(self)
    }

    fn accept(&self) -> TransportResult<Option<UnixTransport>> {
        NonblockingUnixListener::accept(self)
    }

    fn close(&self) {
        NonblockingUnixListener::close(self)
    }
}

/// Builder for listeners with non-default accept backlog or client
/// timeout.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use courier_transport::UnixListenerBuilder;
///
/// # fn main() -> courier_transport::TransportResult<()> {
/// let listener = UnixListenerBuilder::new()
///     .backlog(64)
///     .client_timeout(Duration::from_secs(5))
///     .bind("/tmp/courier.sock")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UnixListenerBuilder {
    backlog: i32,
    client_timeout: Option<Duration>,
}

impl Default for UnixListenerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UnixListenerBuilder {
    /// Create a builder with the default backlog and no client timeout.
    pub fn new() -> Self {
        Self {
            backlog: DEFAULT_BACKLOG,
            client_timeout: None,
        }
    }

    /// Set the accept backlog.
    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Set the timeout applied to every accepted connection.
    pub fn client_timeout(mut self, timeout: Duration) -> Self {
        self.client_timeout = Some(timeout);
        self
    }

    /// Bind the listener at `path`.
    pub fn bind(self, path: impl AsRef<Path>) -> TransportResult<NonblockingUnixListener> {
        NonblockingUnixListener::bind_inner(path.as_ref(), self.backlog, self.client_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transport;
    use std::os::unix::net::UnixStream;

    fn bound_listener() -> (NonblockingUnixListener, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listener.sock");
        let listener = NonblockingUnixListener::bind(&path, DEFAULT_BACKLOG).unwrap();
        (listener, dir)
    }

    #[test]
    fn test_accept_without_pending_connection_is_none() {
        let (listener, _dir) = bound_listener();
        assert!(listener.accept().unwrap().is_none());
    }

    #[test]
    fn test_accept_delivers_each_connection_once() {
        let (listener, _dir) = bound_listener();
        let _client = UnixStream::connect(listener.local_path()).unwrap();

        assert!(listener.accept().unwrap().is_some());
        // No duplicate delivery.
        assert!(listener.accept().unwrap().is_none());
    }

    #[test]
    fn test_accepted_connection_carries_traffic() {
        let (listener, _dir) = bound_listener();
        let mut client = UnixStream::connect(listener.local_path()).unwrap();

        let mut conn = listener.accept().unwrap().unwrap();
        std::io::Write::write_all(&mut client, b"hello").unwrap();

        let mut buf = [0u8; 16];
        let n = conn.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn test_accept_after_close_is_not_open() {
        let (listener, _dir) = bound_listener();
        listener.close();
        assert!(listener.accept().unwrap_err().is_not_open());
        assert!(!listener.is_listening());

        // Idempotent.
        listener.close();
        assert!(listener.accept().unwrap_err().is_not_open());
    }

    #[test]
    fn test_interrupt_closes_from_another_thread() {
        let (listener, _dir) = bound_listener();
        let listener = std::sync::Arc::new(listener);

        let remote = std::sync::Arc::clone(&listener);
        std::thread::spawn(move || remote.interrupt())
            .join()
            .unwrap();

        assert!(!listener.is_listening());
        assert!(listener.accept().unwrap_err().is_not_open());
    }

    #[test]
    fn test_bind_failure_is_setup_error() {
        let err = NonblockingUnixListener::bind("/nonexistent/dir/courier.sock", 8).unwrap_err();
        assert!(err.is_setup());
    }

    #[test]
    fn test_bind_address_in_use_is_setup_error() {
        let (listener, _dir) = bound_listener();
        let err =
            NonblockingUnixListener::bind(listener.local_path(), DEFAULT_BACKLOG).unwrap_err();
        assert!(err.is_setup());
    }

    #[test]
    fn test_listen_is_noop_while_open() {
        let (listener, _dir) = bound_listener();
        listener.listen().unwrap();
        listener.close();
        assert!(listener.listen().unwrap_err().is_not_open());
    }

    #[test]
    fn test_register_after_close_is_ignorable() {
        let (listener, _dir) = bound_listener();
        let poll = mio::Poll::new().unwrap();
        listener.close();

        // The documented race: callers may drop this result on the floor.
        let result = listener.register(poll.registry(), Token(0));
        assert!(result.unwrap_err().is_not_open());
    }

    #[test]
    fn test_registered_listener_wakes_poll_on_connection() {
        let (listener, _dir) = bound_listener();
        let mut poll = mio::Poll::new().unwrap();
        let mut events = mio::Events::with_capacity(4);
        const ACCEPT: Token = Token(7);

        listener.register(poll.registry(), ACCEPT).unwrap();
        let _client = UnixStream::connect(listener.local_path()).unwrap();

        poll.poll(&mut events, Some(Duration::from_secs(5))).unwrap();
        let woke = events.iter().any(|e| e.token() == ACCEPT);
        assert!(woke, "expected accept readiness event");
        assert!(listener.accept().unwrap().is_some());
    }

    #[test]
    fn test_builder_applies_client_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeout.sock");
        let listener = UnixListenerBuilder::new()
            .backlog(16)
            .client_timeout(Duration::from_millis(250))
            .bind(&path)
            .unwrap();

        let _client = UnixStream::connect(&path).unwrap();
        let conn = listener.accept().unwrap().unwrap();
        assert!(conn.is_open());
    }
}
