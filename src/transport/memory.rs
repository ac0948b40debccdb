//! Growable in-memory transport.
//!
//! A single byte buffer driven purely as a read source or purely as a
//! write sink, never both at once. Server loops use it to assemble a whole
//! message in place before parsing, then flip it around to stage the
//! response bytes.
//!
//! The direction flips implicitly: the first `read` after a reset (or
//! after a write phase) rewinds the cursor to the base offset and enters
//! read mode, and symmetrically for `write`. Interleaving reads and writes
//! without an intervening [`reset`](MemoryTransport::reset) is a caller
//! contract violation and yields unspecified cursor positions.

use crate::core::{Transport, TransportResult};

/// Traffic direction currently active on the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// No read or write has happened since the last reset.
    Unset,
    /// Buffer is being drained.
    Reading,
    /// Buffer is being filled.
    Writing,
}

/// A transport backed by a growable byte buffer.
///
/// # Example
///
/// ```
/// use courier_transport::MemoryTransport;
///
/// let mut mem = MemoryTransport::new();
/// mem.write(&[1, 2, 3]);
/// mem.write(&[4, 5]);
///
/// let mut out = [0u8; 8];
/// let n = mem.read(&mut out);
/// assert_eq!(&out[..n], &[1, 2, 3, 4, 5]);
/// assert_eq!(mem.read(&mut out), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    /// Backing storage. Replaced wholesale on reset and on growth.
    storage: Vec<u8>,
    /// Current read/write offset into `storage`.
    cursor: usize,
    /// Exclusive upper bound of valid data (reads) or pre-allocated tail
    /// capacity (writes).
    limit: usize,
    /// Offset established at the last reset; a mode switch rewinds here.
    base: usize,
    mode: Mode,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Unset
    }
}

impl MemoryTransport {
    /// Create an empty transport (zero-capacity storage).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport over an existing buffer, readable/writable over
    /// its full range.
    pub fn with_buffer(buf: Vec<u8>) -> Self {
        let mut mem = Self::new();
        mem.reset(buf);
        mem
    }

    /// Replace the backing storage, taking ownership of `buf` without
    /// copying. Equivalent to `reset_range(buf, 0, buf.len())`.
    pub fn reset(&mut self, buf: Vec<u8>) {
        let len = buf.len();
        self.reset_range(buf, 0, len);
    }

    /// Replace the backing storage with a sub-range of `buf`, without
    /// copying. Subsequent reads and writes start at `offset`; reads see
    /// `len` bytes.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `offset + len` exceeds `buf.len()`.
    pub fn reset_range(&mut self, buf: Vec<u8>, offset: usize, len: usize) {
        debug_assert!(
            offset + len <= buf.len(),
            "reset range out of bounds: {}+{} > {}",
            offset,
            len,
            buf.len()
        );
        self.storage = buf;
        self.base = offset;
        self.cursor = offset;
        self.limit = offset + len;
        self.mode = Mode::Unset;
    }

    /// Drop the backing storage entirely.
    pub fn clear(&mut self) {
        self.reset(Vec::new());
    }

    /// Copy up to `dst.len()` bytes into `dst`, returning the count.
    ///
    /// The first read in a new mode rewinds the cursor to the base offset.
    /// Returns 0 once the readable region is exhausted; exhaustion is not
    /// an error and there is no end-of-stream signal beyond the zero
    /// result together with [`bytes_remaining`](Self::bytes_remaining).
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        if self.mode != Mode::Reading {
            self.cursor = self.base;
            self.mode = Mode::Reading;
        }

        let amt = dst.len().min(self.bytes_remaining());
        if amt > 0 {
            dst[..amt].copy_from_slice(&self.storage[self.cursor..self.cursor + amt]);
            self.consume(amt);
        }
        amt
    }

    /// Copy all of `src` into the buffer, growing storage if the remaining
    /// tail capacity is smaller than `src.len()`.
    ///
    /// The first write in a new mode rewinds the cursor to the base offset.
    pub fn write(&mut self, src: &[u8]) {
        if self.mode != Mode::Writing {
            self.cursor = self.base;
            self.mode = Mode::Writing;
        }

        if src.len() > self.bytes_remaining() {
            self.grow(src.len());
        }
        self.storage[self.cursor..self.cursor + src.len()].copy_from_slice(src);
        self.consume(src.len());
    }

    /// Bytes between the cursor and the limit.
    ///
    /// During reads this is how much unread data remains; during writes it
    /// is how much pre-allocated tail capacity is left before the next
    /// write triggers growth.
    pub fn bytes_remaining(&self) -> usize {
        self.limit - self.cursor
    }

    /// Advance the cursor by `len` without copying. Used by callers that
    /// consume data in place through [`buffer`](Self::buffer).
    pub fn consume(&mut self, len: usize) {
        debug_assert!(len <= self.bytes_remaining(), "consume past limit");
        self.cursor += len;
    }

    /// The backing storage, for zero-copy consumers.
    ///
    /// The returned slice is invalidated by the next `reset` or by any
    /// write that triggers growth, since growth reallocates storage.
    pub fn buffer(&self) -> &[u8] {
        &self.storage
    }

    /// Current cursor offset into [`buffer`](Self::buffer).
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Check whether the buffer is currently in its write phase.
    pub fn is_writing(&self) -> bool {
        self.mode == Mode::Writing
    }

    /// Reallocate storage to hold exactly the bytes written since the last
    /// reset plus `additional` more, preserving the live region at offset 0.
    ///
    /// Growth is intentionally not amortized: each call allocates exactly
    /// the capacity the current write needs. Short-lived per-message
    /// buffers stay tight; callers with many small writes should batch
    /// them.
    fn grow(&mut self, additional: usize) {
        let written = self.cursor - self.base;
        let mut next = vec![0u8; written + additional];
        next[..written].copy_from_slice(&self.storage[self.base..self.cursor]);

        // Implicit reset: the live region now starts at offset 0.
        self.storage = next;
        self.base = 0;
        self.cursor = written;
        self.limit = self.storage.len();
    }
}

impl Transport for MemoryTransport {
    fn is_open(&self) -> bool {
        true
    }

    fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        Ok(MemoryTransport::read(self, buf))
    }

    fn write(&mut self, buf: &[u8]) -> TransportResult<usize> {
        MemoryTransport::write(self, buf);
        Ok(buf.len())
    }

    fn close(&mut self) {}
}
