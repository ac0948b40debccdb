//! # Courier RPC Transport
//!
//! Low-level transport primitives for the Courier RPC framework's I/O
//! layer. The crate provides:
//!
//! - **Memory transport**: a growable byte buffer driven purely as a read
//!   source or purely as a write sink, with automatic capacity growth on
//!   write
//! - **Non-blocking listener**: a Unix-domain listening endpoint whose
//!   `accept` never blocks and which registers "connection pending"
//!   readiness with an externally owned `mio` multiplexer
//! - **Connection transport**: the per-connection, non-blocking byte
//!   channel produced by accept
//!
//! Protocol encoding, request dispatch, and scheduling policy live in the
//! layers above; they consume these primitives through the [`Transport`]
//! and [`ServerTransport`] traits.
//!
//! ## Example Usage
//!
//! ```no_run
//! use courier_transport::{NonblockingUnixListener, Transport, TransportResult};
//! use mio::{Events, Interest, Poll, Token};
//!
//! fn main() -> TransportResult<()> {
//!     const ACCEPT: Token = Token(0);
//!
//!     let listener = NonblockingUnixListener::bind("/tmp/courier.sock", 128)?;
//!     let mut poll = Poll::new().map_err(courier_transport::TransportError::Io)?;
//!     listener.register(poll.registry(), ACCEPT)?;
//!
//!     let mut events = Events::with_capacity(64);
//!     loop {
//!         poll.poll(&mut events, None)
//!             .map_err(courier_transport::TransportError::Io)?;
//!         for event in events.iter() {
//!             if event.token() == ACCEPT {
//!                 // Drain the accept queue; Ok(None) means it is empty.
//!                 while let Some(mut conn) = listener.accept()? {
//!                     let mut buf = [0u8; 4096];
//!                     let n = conn.read(&mut buf)?;
//!                     let _ = &buf[..n];
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

// Core traits and error types
pub mod core;

// Transport primitives
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core traits and error types
    pub use crate::core::*;

    // Transport primitives
    #[cfg(unix)]
    pub use crate::transport::{
        DEFAULT_BACKLOG, MemoryTransport, NonblockingUnixListener, UnixListenerBuilder,
        UnixTransport,
    };
    #[cfg(not(unix))]
    pub use crate::transport::MemoryTransport;
}

// Re-export commonly used items at crate root
pub use crate::core::{ServerTransport, Transport, TransportError, TransportResult};

pub use crate::transport::MemoryTransport;

#[cfg(unix)]
pub use crate::transport::{
    DEFAULT_BACKLOG, NonblockingUnixListener, UnixListenerBuilder, UnixTransport,
};
