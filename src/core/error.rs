//! Error types for Courier transports.
//!
//! The taxonomy is deliberately small: setup failures are fatal to the
//! instance that raised them, `NotOpen` is a caller bug surfaced
//! immediately, and I/O failures are passed through for the event loop to
//! decide on. No operation in this crate retries internally.

use std::io;

use thiserror::Error;

/// Errors raised by transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Bind or construction failure. The transport never became usable;
    /// recovering requires building a new instance.
    #[error("transport setup failed: {message}")]
    Setup {
        /// What was being set up (includes the endpoint, when known).
        message: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Operation attempted on an unbound or closed transport. This is a
    /// caller bug, not a transient condition.
    #[error("transport not open: {0}")]
    NotOpen(&'static str),

    /// OS-level failure during accept/read/write. The transport may remain
    /// usable unless the underlying handle is now invalid.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the connection (end-of-stream on read, broken pipe
    /// on write).
    #[error("connection closed by peer")]
    Closed,
}

impl TransportError {
    /// Build a setup error with context about the failed endpoint.
    pub(crate) fn setup(message: impl Into<String>, source: io::Error) -> Self {
        TransportError::Setup {
            message: message.into(),
            source,
        }
    }

    /// Check if this error came from bind/construction.
    pub fn is_setup(&self) -> bool {
        matches!(self, TransportError::Setup { .. })
    }

    /// Check if this error indicates a caller bug (use after close, use
    /// before bind).
    pub fn is_not_open(&self) -> bool {
        matches!(self, TransportError::NotOpen(_))
    }

    /// Check if this error means the peer went away.
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed)
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
