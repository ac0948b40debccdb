//! Core traits for Courier transports.
//!
//! These traits define the seam between the transport primitives and the
//! protocol layers above them. Upper layers read and write bytes through
//! [`Transport`] without caring whether the other end is an in-memory
//! buffer or a live socket; server runtimes drive [`ServerTransport`]
//! from a readiness loop they own.

use super::error::TransportResult;

/// Byte-level transport contract.
///
/// Every operation returns immediately. "Nothing available right now" is
/// signaled through a zero result, never by blocking and never as an
/// error, so a readiness-driven caller can poll without special cases.
///
/// # Requirements
///
/// - `read` MUST NOT block; a return of `Ok(0)` means no bytes were
///   available (or the source is exhausted), and callers distinguish the
///   two through transport-specific state, not through errors.
/// - `write` MUST NOT block; it returns the number of bytes accepted,
///   which may be less than `buf.len()` (zero for a socket whose send
///   buffer is full).
pub trait Transport {
    /// Check whether the transport is open for traffic.
    fn is_open(&self) -> bool;

    /// Read up to `buf.len()` bytes into `buf`, returning the count.
    fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize>;

    /// Write up to `buf.len()` bytes from `buf`, returning the count
    /// accepted.
    fn write(&mut self, buf: &[u8]) -> TransportResult<usize>;

    /// Flush any buffered outgoing bytes. Default is a no-op.
    fn flush(&mut self) -> TransportResult<()> {
        Ok(())
    }

    /// Release the transport's resources. Idempotent.
    fn close(&mut self);
}

/// Listening-endpoint contract.
///
/// Implementations never block in `accept`; a pending-connection check
/// that comes up empty returns `Ok(None)`. The caller owns the readiness
/// loop that decides when calling `accept` is worthwhile.
pub trait ServerTransport {
    /// The per-connection transport produced by a successful accept.
    type Conn: Transport;

    /// Start listening. For endpoints that already listen at bind time
    /// this is a state check only.
    fn listen(&self) -> TransportResult<()>;

    /// Attempt to accept one pending connection without blocking.
    ///
    /// Returns `Ok(None)` when no connection is pending. Each returned
    /// connection is independently owned; the listener keeps no reference
    /// to it.
    fn accept(&self) -> TransportResult<Option<Self::Conn>>;

    /// Stop listening and release the endpoint. Idempotent.
    fn close(&self);
}
