//! Readers: the V1 single-buffer reader (C4), the V2 multi-file reader (C5),
//! and the single-threaded cursor accelerator (C6), unified behind one
//! `IndexedDictionary` trait so callers don't re-branch on version the way
//! the source's class hierarchy did (§9, first re-architecture note).

pub mod cursor;
pub mod v1;
pub mod v2;

use std::cmp::Ordering;

use crate::codec::ObjectStrategy;
use crate::error::{DictionaryError, Result};

pub use cursor::SingleThreadedCursor;
pub use v1::V1Reader;
pub use v2::V2Reader;

/// Behavior shared by both container versions: positional access, reverse
/// lookup, and the sortedness flag. `NULL` is `None`.
pub trait IndexedDictionary<S: ObjectStrategy> {
    fn size(&self) -> i32;
    fn get(&self, index: i32) -> Result<Option<S::Value>>;
    fn is_sorted(&self) -> bool;

    /// Binary search for `value`. Requires `is_sorted()`; see
    /// `DictionaryError::ReverseLookupUnsupported` otherwise.
    fn index_of(&self, strategy: &S, value: &Option<S::Value>) -> Result<i32>;
}

/// A dictionary built from either container version, dispatched through one
/// handle. The "version flag branching every method" pattern from the
/// source becomes this one small enum instead of an inheritance hierarchy.
pub enum Dictionary<S: ObjectStrategy, M> {
    V1(V1Reader<S>),
    V2(V2Reader<S, M>),
}

impl<S: ObjectStrategy, M: crate::mapper::FileMapper> Dictionary<S, M> {
    pub fn size(&self) -> i32 {
        match self {
            Dictionary::V1(r) => r.size(),
            Dictionary::V2(r) => r.size(),
        }
    }

    pub fn get(&self, index: i32) -> Result<Option<S::Value>> {
        match self {
            Dictionary::V1(r) => r.get(index),
            Dictionary::V2(r) => r.get(index),
        }
    }

    pub fn is_sorted(&self) -> bool {
        match self {
            Dictionary::V1(r) => r.is_sorted(),
            Dictionary::V2(r) => r.is_sorted(),
        }
    }

    pub fn index_of(&self, strategy: &S, value: &Option<S::Value>) -> Result<i32> {
        match self {
            Dictionary::V1(r) => r.index_of(strategy, value),
            Dictionary::V2(r) => r.index_of(strategy, value),
        }
    }
}

/// Compares two nullable payloads with nulls-first semantics: `None` is
/// strictly less than any `Some`, and the codec's comparator is only
/// consulted when both sides are non-null.
pub(crate) fn compare_nullable<V>(
    a: &Option<V>,
    b: &Option<V>,
    cmp: impl Fn(&V, &V) -> Ordering,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => cmp(a, b),
    }
}

/// Widen a raw offset-table entry to `i64` and add the 4-byte length-marker
/// width, the way every `get(i)` needs to in order to find the *next*
/// entry's start. A corrupted entry near `i32::MAX` would overflow this add
/// as plain `i32` arithmetic; widening first means the overflow can only
/// ever happen here, deliberately, where it's turned into `CorruptData`
/// instead of panicking (§7: "payload length exceeds buffer").
pub(crate) fn offset_plus_marker_width(raw_offset: i32) -> Result<i64> {
    (raw_offset as i64).checked_add(4).ok_or_else(|| {
        DictionaryError::CorruptData(format!(
            "offset table entry {raw_offset} overflows when computing the next start"
        ))
    })
}

/// Textbook binary search over `get_fn(0..n)`, returning the Arrays.binarySearch
/// convention: the index on a hit, `-(insertion_point + 1)` on a miss.
///
/// `lo`/`hi` are tracked as `i64` specifically so that `lo + hi` can never
/// overflow even when `n` approaches `i32::MAX` — the Rust equivalent of the
/// source's `(lo + hi) >>> 1` logical-shift trick, without needing unsigned
/// arithmetic games (§8, "very large element count" boundary behavior).
pub(crate) fn binary_search<V>(
    n: i32,
    reverse_lookup_allowed: bool,
    mut get_fn: impl FnMut(i32) -> Result<Option<V>>,
    target: &Option<V>,
    cmp: impl Fn(&V, &V) -> Ordering,
) -> Result<i32> {
    if !reverse_lookup_allowed {
        return Err(DictionaryError::ReverseLookupUnsupported);
    }

    let mut lo: i64 = 0;
    let mut hi: i64 = n as i64 - 1;

    while lo <= hi {
        let mid = (lo + hi) / 2;
        let current = get_fn(mid as i32)?;
        match compare_nullable(&current, target, &cmp) {
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid - 1,
            Ordering::Equal => return Ok(mid as i32),
        }
    }

    Ok(-(lo as i32) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_search_on_empty_returns_negative_one() {
        let result = binary_search::<i32>(0, true, |_| Ok(None), &Some(5), |a, b| a.cmp(b));
        assert_eq!(result.unwrap(), -1);
    }

    #[test]
    fn binary_search_reverse_lookup_unsupported() {
        let result = binary_search::<i32>(3, false, |i| Ok(Some(i)), &Some(1), |a, b| a.cmp(b));
        assert!(matches!(result, Err(DictionaryError::ReverseLookupUnsupported)));
    }

    #[test]
    fn binary_search_no_overflow_near_i32_max() {
        // n close to i32::MAX; get_fn is a pure arithmetic function so no
        // real allocation is needed to exercise the (lo+hi) arithmetic.
        let n = i32::MAX - 1;
        let target = (n / 2) as i64;
        let result = binary_search::<i64>(
            n,
            true,
            |i| Ok(Some(i as i64)),
            &Some(target),
            |a, b| a.cmp(b),
        );
        assert_eq!(result.unwrap() as i64, target);
    }
}
