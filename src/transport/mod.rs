//! Courier RPC - Transport Layer
//!
//! Low-level transport primitives consumed by the RPC runtime:
//!
//! - **In-memory buffering**: [`MemoryTransport`], a growable
//!   mode-switching byte buffer
//! - **Listening endpoint**: [`NonblockingUnixListener`] with
//!   [`UnixListenerBuilder`] for non-default backlog/timeouts
//! - **Per-connection I/O**: [`UnixTransport`], produced by accept
//!
//! # Architecture
//!
//! The transport layer sits below protocol framing and dispatch. The
//! runtime owns a readiness multiplexer (`mio::Poll`); this layer only
//! registers interest with it and answers non-blocking calls.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Protocol framing / dispatch      │
//! ├─────────────────────────────────────────┤
//! │          Transport Layer                │  ← This module
//! │   memory buffers, listener, streams     │
//! ├─────────────────────────────────────────┤
//! │   OS sockets + readiness multiplexer    │
//! └─────────────────────────────────────────┘
//! ```

mod memory;

#[cfg(unix)]
mod listener;
#[cfg(unix)]
mod stream;

pub use memory::MemoryTransport;

#[cfg(unix)]
pub use listener::{DEFAULT_BACKLOG, NonblockingUnixListener, UnixListenerBuilder};
#[cfg(unix)]
pub use stream::UnixTransport;
