//! Core error types and transport traits.
//!
//! Everything here is transport-family agnostic: the same contracts cover
//! in-memory buffers and OS sockets.

mod error;
mod traits;

pub use error::{TransportError, TransportResult};
pub use traits::{ServerTransport, Transport};
