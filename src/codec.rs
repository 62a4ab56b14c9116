//! Payload codec (C2) — the `ObjectStrategy` role.
//!
//! An `ObjectStrategy` encodes a payload to bytes, decodes a byte window
//! back to a payload, and — if the payload type is comparable — defines the
//! total order the writer uses to detect sortedness and the reader uses for
//! binary search. `NULL` is represented as `Option::None` at every layer
//! above the codec; the codec itself never sees `NULL` (the length-marker
//! convention in `header`/`reader`/`writer` handles that before the codec
//! is invoked).

use std::cmp::Ordering;
use std::io::{self, Write};

use crate::error::Result;
use crate::window::{utf8_compare, ByteWindow};

/// Encode/decode/compare a payload type, plus two capability flags the
/// reader and writer use to pick fast paths without runtime type identity:
///
/// - `can_compare`: false means this strategy defines no total order; the
///   writer leaves `reverseLookupAllowed = false` unconditionally and
///   `index_of` always fails with `ReverseLookupUnsupported`.
/// - `is_byte_identity`: true only for [`BytesStrategy`]; lets a reader's
///   single-threaded cursor compare raw byte windows in `index_of` without
///   materializing a decoded value (§4.6).
pub trait ObjectStrategy: Send + Sync {
    /// The decoded payload type. Implementations that return a window-backed
    /// zero-copy view (like [`BytesStrategy`]) document the lifetime that
    /// view is valid for — here, the lifetime of the backing mmap, which
    /// outlives every reader built from it.
    type Value: Clone;

    /// Write `value`'s encoding to `sink`. The caller has already written the
    /// 4-byte length marker (`0` for non-null, `-1` for `NULL` with no call
    /// to `encode` at all).
    fn encode(&self, value: &Self::Value, sink: &mut dyn Write) -> io::Result<()>;

    /// Decode a non-null payload from `window`, whose `position..limit` span
    /// is exactly the payload's bytes (the caller has already sliced it to
    /// the `nBytes` named in the container header).
    ///
    /// Returns `Err(DictionaryError::CorruptData)` rather than panicking when
    /// the bytes don't decode to a valid payload — this is the one codec
    /// operation a corrupted on-disk block can fail at (notably
    /// [`crate::compression::CompressedStrategy`]'s decompression step), so
    /// unlike `encode`/`compare` it returns a `Result` instead of assuming
    /// the input is well-formed.
    fn decode(&self, window: &ByteWindow) -> Result<Self::Value>;

    /// Whether `compare` defines a meaningful total order for this payload
    /// type. Defaults to `true`; a non-comparable strategy should override
    /// this to `false` and may panic in `compare` (it will never be called
    /// because the writer checks this flag before sorting and the reader
    /// checks it before `index_of`).
    fn can_compare(&self) -> bool {
        true
    }

    /// Total order over non-null payloads, consistent with "nulls-first":
    /// callers treat `NULL` as strictly less than every `Some(value)` without
    /// calling into this method for the `NULL` side of a comparison.
    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Ordering;

    /// True only for the identity byte-slice codec (§4.6).
    fn is_byte_identity(&self) -> bool {
        false
    }
}

/// Zero-copy byte-slice codec: `decode` returns a window sharing the mapped
/// buffer's bytes (an `Arc` bump, no copy). Comparator is the UTF-8
/// lexicographic comparator (§4.1), applied to the raw bytes regardless of
/// whether they are valid UTF-8 — this is the "ingested string binary
/// search" fast path named in §4.6.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesStrategy;

impl ObjectStrategy for BytesStrategy {
    type Value = ByteWindow;

    fn encode(&self, value: &ByteWindow, sink: &mut dyn Write) -> io::Result<()> {
        sink.write_all(value.as_slice())
    }

    fn decode(&self, window: &ByteWindow) -> Result<ByteWindow> {
        Ok(window.duplicate())
    }

    fn compare(&self, a: &ByteWindow, b: &ByteWindow) -> Ordering {
        utf8_compare(a.as_slice(), b.as_slice())
    }

    fn is_byte_identity(&self) -> bool {
        true
    }
}

/// Decoded UTF-8 string codec. Owns its output, so unlike [`BytesStrategy`]
/// it has no lifetime tie to the backing mmap.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Strategy;

impl ObjectStrategy for Utf8Strategy {
    type Value = String;

    fn encode(&self, value: &String, sink: &mut dyn Write) -> io::Result<()> {
        sink.write_all(value.as_bytes())
    }

    fn decode(&self, window: &ByteWindow) -> Result<String> {
        Ok(String::from_utf8_lossy(window.as_slice()).into_owned())
    }

    fn compare(&self, a: &String, b: &String) -> Ordering {
        // `String`'s `Ord` is byte-wise on the UTF-8 representation, which is
        // exactly the comparator defined in §4.1.
        a.cmp(b)
    }
}
