//! Append-only byte buffer with doubling reserve and absolute-offset patching.
//!
//! Capacity starts at a small default and doubles until a requested reservation fits,
//! values are appended at a write cursor, and
//! previously-written spans can be overwritten in place by absolute offset. This is how
//! the length and CRC fields of a frame get filled in after the payload they describe has
//! already been written.

use bytes::BytesMut;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct GrowingBuffer {
    inner: BytesMut,
}

impl Default for GrowingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GrowingBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: BytesMut::with_capacity(capacity),
        }
    }

    /// Ensures at least `additional` more bytes can be appended without the backing
    /// storage being replaced by a non-doubling allocation. Capacity doubles, possibly
    /// more than once, until the reservation fits.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.inner.len() + additional;
        let mut capacity = self.inner.capacity().max(1);
        while capacity < needed {
            capacity *= 2;
        }
        if capacity > self.inner.capacity() {
            self.inner.reserve(capacity - self.inner.len());
        }
    }

    /// Current write-cursor position: the number of bytes appended so far.
    pub fn position(&self) -> usize {
        self.inner.len()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.inner.extend_from_slice(bytes);
    }

    /// Overwrites `bytes.len()` bytes starting at the absolute offset `offset`, which
    /// must already have been written (`offset + bytes.len() <= self.position()`).
    ///
    /// Used to back-patch length and CRC fields once the data they cover has been
    /// serialized.
    pub fn patch(&mut self, offset: usize, bytes: &[u8]) {
        assert!(
            offset + bytes.len() <= self.inner.len(),
            "patch out of bounds: offset={offset} len={} buffer_len={}",
            bytes.len(),
            self.inner.len()
        );
        self.inner[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.inner.into()
    }
}

impl std::io::Write for GrowingBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
