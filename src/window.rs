//! Byte-window primitives (C1): a read-only view over a contiguous,
//! reference-counted byte region with independent position/limit cursors.
//!
//! # Layout
//!
//! A window never copies the bytes it views. `slice` and `duplicate` both
//! bump the `Arc` refcount on the shared backing buffer; `slice` additionally
//! narrows the window's own origin/capacity, while `duplicate` keeps the
//! same bounds but hands back an independent cursor. This is the mechanism
//! the single-threaded cursor (`reader::cursor`) relies on to reuse one
//! window per value file without allocating on every `get`.
//!
//! # Endianness
//!
//! `get_i32_be` reads big-endian, used for V1 payload offsets and the V2
//! meta block. `get_i32_native` reads in the platform's native byte order,
//! used only for the V2 header file — this is a non-portable format detail
//! inherited from the source and is documented, not fixed, here.

use std::sync::Arc;

/// Anything a [`ByteWindow`] can be backed by: an in-memory buffer built by
/// a writer, or a `memmap2::Mmap` owned by a [`FileMapper`](crate::mapper::FileMapper).
/// Keeping this as a trait (rather than hard-coding `Arc<[u8]>`) is what
/// makes mapped files genuinely zero-copy — wrapping a `Mmap` in an `Arc`
/// never touches its bytes.
pub trait Backing: Send + Sync {
    fn bytes(&self) -> &[u8];
}

impl Backing for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }
}

impl Backing for memmap2::Mmap {
    fn bytes(&self) -> &[u8] {
        self
    }
}

/// A read-only view over `base[origin .. origin + capacity]`, with an
/// independent `position`/`limit` cursor pair relative to `origin`.
///
/// `0 <= position <= limit <= capacity` is maintained by every mutator.
#[derive(Clone)]
pub struct ByteWindow {
    base: Arc<dyn Backing>,
    origin: usize,
    capacity: usize,
    position: usize,
    limit: usize,
}

impl ByteWindow {
    /// Wrap an entire shared buffer as a window spanning it in full.
    pub fn new(base: Arc<dyn Backing>) -> Self {
        let capacity = base.bytes().len();
        ByteWindow {
            base,
            origin: 0,
            capacity,
            position: 0,
            limit: capacity,
        }
    }

    /// Convenience for the common in-memory case (writer output buffers,
    /// test fixtures): wraps an owned `Vec<u8>` with no extra allocation.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        ByteWindow::new(Arc::new(bytes))
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn set_position(&mut self, position: usize) {
        assert!(position <= self.limit, "position {position} beyond limit {}", self.limit);
        self.position = position;
    }

    pub fn set_limit(&mut self, limit: usize) {
        assert!(limit <= self.capacity, "limit {limit} beyond capacity {}", self.capacity);
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
    }

    /// An independent cursor over the same bytes and the same current
    /// bounds. O(1): only bumps the backing `Arc`'s refcount.
    pub fn duplicate(&self) -> ByteWindow {
        self.clone()
    }

    /// A fresh window over `self[start..end]` (relative to `self`'s origin),
    /// with its own position (0) and limit (`end - start`).
    pub fn slice(&self, start: usize, end: usize) -> ByteWindow {
        assert!(start <= end && end <= self.capacity, "slice {start}..{end} out of capacity {}", self.capacity);
        ByteWindow {
            base: Arc::clone(&self.base),
            origin: self.origin + start,
            capacity: end - start,
            position: 0,
            limit: end - start,
        }
    }

    /// Absolute byte read, big-endian, at offset `at` (relative to this
    /// window's origin). Used for V1 offsets and the V2 meta block.
    pub fn get_i32_be(&self, at: usize) -> i32 {
        let bytes = self.abs_bytes(at, 4);
        i32::from_be_bytes(bytes.try_into().unwrap())
    }

    /// Absolute byte read, native byte order, at offset `at`. Used only for
    /// the V2 header file — see module docs on portability.
    pub fn get_i32_native(&self, at: usize) -> i32 {
        let bytes = self.abs_bytes(at, 4);
        i32::from_ne_bytes(bytes.try_into().unwrap())
    }

    pub fn get_u8(&self, at: usize) -> u8 {
        self.abs_bytes(at, 1)[0]
    }

    /// The bytes from `position` to `limit`, without consuming the cursor.
    pub fn as_slice(&self) -> &[u8] {
        &self.base.bytes()[self.origin + self.position..self.origin + self.limit]
    }

    fn abs_bytes(&self, at: usize, len: usize) -> &[u8] {
        assert!(at + len <= self.capacity, "read {at}..{} out of capacity {}", at + len, self.capacity);
        &self.base.bytes()[self.origin + at..self.origin + at + len]
    }
}

/// UTF-8 lexicographic comparator.
///
/// Unsigned byte-wise comparison of two valid UTF-8 byte sequences yields
/// exactly the ordering of their decoded code-point sequences — this is a
/// documented guarantee of the UTF-8 encoding (continuation bytes never
/// collide with leading bytes of a lower code point). We rely on that
/// guarantee rather than decoding: `a.cmp(b)` on the raw bytes is used
/// directly, with the equivalence checked in `tests::utf8_order_matches_str_order`.
pub fn utf8_compare(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_duplicate_share_bytes_without_copy() {
        let w = ByteWindow::from_vec(vec![1u8, 2, 3, 4, 5, 6, 7, 8]);
        let s = w.slice(2, 6);
        assert_eq!(s.as_slice(), &[3, 4, 5, 6]);
        let mut d = s.duplicate();
        d.set_position(1);
        assert_eq!(d.as_slice(), &[4, 5, 6]);
        // original slice cursor is untouched
        assert_eq!(s.as_slice(), &[3, 4, 5, 6]);
    }

    #[test]
    fn be_and_native_reads() {
        let w = ByteWindow::from_vec(vec![0x00, 0x00, 0x01, 0x00]);
        assert_eq!(w.get_i32_be(0), 256);
    }

    #[test]
    fn utf8_order_matches_str_order() {
        let words = ["apple", "banana", "banan", "b", "cherry", "", "ba"];
        let mut by_bytes = words.to_vec();
        by_bytes.sort_by(|a, b| utf8_compare(a.as_bytes(), b.as_bytes()));
        let mut by_str = words.to_vec();
        by_str.sort();
        assert_eq!(by_bytes, by_str);
    }
}
