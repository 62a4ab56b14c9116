//! Compression adapter (C9): wraps any `ObjectStrategy` so each payload is
//! stored as an independently-decompressible block. See `SPEC_FULL.md`
//! §4.9.
//!
//! The source's "scoped buffer with a release hook that runs on every exit
//! path" becomes, in Rust, a value with a `Drop` impl: decompression
//! allocates a fresh buffer up front (decompressed bytes never live in the
//! mmap, so this can never be zero-copy), and there is no separate release
//! call to forget — the buffer is freed when `DecompressedPayload` goes out
//! of scope, whether the caller consumes it, drops it early, or unwinds
//! through it on panic.

use std::cmp::Ordering;
use std::io::{self, Write};
use std::sync::Arc;

use crate::codec::ObjectStrategy;
use crate::error::{DictionaryError, Result};
use crate::window::ByteWindow;

/// A decompressed payload, owning its own backing buffer. Derefs to `[u8]`;
/// wrap an inner strategy's `decode` over this to recover the inner value.
#[derive(Clone)]
pub struct DecompressedPayload {
    bytes: Arc<Vec<u8>>,
}

impl DecompressedPayload {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// View these bytes as a `ByteWindow`, for handing to an inner
    /// strategy's `decode` without an extra copy.
    pub fn as_window(&self) -> ByteWindow {
        ByteWindow::from_vec((*self.bytes).clone())
    }
}

/// Wraps `Inner` so that every encoded payload is zstd-compressed on write
/// and transparently decompressed on read. `Inner::Value` must itself be
/// decodable from a plain (uncompressed) `ByteWindow` — this adapter only
/// changes what's on disk, not the decoded type.
pub struct CompressedStrategy<Inner: ObjectStrategy> {
    inner: Inner,
    level: i32,
}

impl<Inner: ObjectStrategy> CompressedStrategy<Inner> {
    /// `level` is the zstd compression level (1-22; higher is slower and
    /// smaller). 3 is zstd's own default and a reasonable choice absent a
    /// caller preference.
    pub fn new(inner: Inner, level: i32) -> Self {
        CompressedStrategy { inner, level }
    }
}

impl<Inner: ObjectStrategy> ObjectStrategy for CompressedStrategy<Inner> {
    type Value = Inner::Value;

    fn encode(&self, value: &Self::Value, sink: &mut dyn Write) -> io::Result<()> {
        let mut plain = Vec::new();
        self.inner.encode(value, &mut plain)?;
        let compressed = zstd::stream::encode_all(&plain[..], self.level)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        sink.write_all(&compressed)
    }

    fn decode(&self, window: &ByteWindow) -> Result<Self::Value> {
        let decompressed = zstd::stream::decode_all(window.as_slice()).map_err(|e| {
            tracing::warn!(error = %e, "corrupt compressed payload block");
            DictionaryError::CorruptData(format!("corrupt compressed payload block: {e}"))
        })?;
        let payload = DecompressedPayload { bytes: Arc::new(decompressed) };
        self.inner.decode(&payload.as_window())
    }

    fn can_compare(&self) -> bool {
        self.inner.can_compare()
    }

    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Ordering {
        self.inner.compare(a, b)
    }

    fn is_byte_identity(&self) -> bool {
        // Compressed bytes never equal the inner strategy's own byte
        // representation, so the cursor's identity fast path never applies
        // here even if `Inner` is byte-identity.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Utf8Strategy;

    #[test]
    fn round_trips_a_compressed_string() {
        let strategy = CompressedStrategy::new(Utf8Strategy, 3);
        let value = "hello compressed world".repeat(8);
        let mut out = Vec::new();
        strategy.encode(&value, &mut out).unwrap();
        assert!(out.len() < value.len(), "repeated text should compress smaller");

        let window = ByteWindow::from_vec(out);
        let decoded = strategy.decode(&window).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn truncated_compressed_block_is_corrupt_data_not_a_panic() {
        let strategy = CompressedStrategy::new(Utf8Strategy, 3);
        let window = ByteWindow::from_vec(vec![0x28, 0xb5, 0x2f, 0xfd, 0x00]); // zstd magic, truncated
        let err = strategy.decode(&window).unwrap_err();
        assert!(matches!(err, crate::error::DictionaryError::CorruptData(_)));
    }

    #[test]
    fn comparison_and_capability_pass_through_to_inner_strategy() {
        let strategy = CompressedStrategy::new(Utf8Strategy, 3);
        assert!(strategy.can_compare());
        assert_eq!(strategy.compare(&"a".to_string(), &"b".to_string()), Ordering::Less);
        assert!(!strategy.is_byte_identity());
    }
}
