//! V1 reader (C4): single mapped buffer, positional access plus binary
//! search. See `SPEC_FULL.md` §4.4.

use std::io::Write;

use crate::codec::ObjectStrategy;
use crate::error::{DictionaryError, Result};
use crate::header::{self, V1Meta, VERSION_V1};
use crate::window::ByteWindow;

use super::{binary_search, offset_plus_marker_width, IndexedDictionary};

/// A V1 dictionary: one mapped buffer split into a `headerOffsets` table and
/// a payload region immediately following it.
pub struct V1Reader<S: ObjectStrategy> {
    strategy: S,
    header_offsets: ByteWindow,
    payload: ByteWindow,
    n: i32,
    reverse_lookup_allowed: bool,
    num_bytes_used: i32,
}

impl<S: ObjectStrategy> V1Reader<S> {
    /// Build a reader from the dictionary's full on-disk bytes (version byte
    /// included), as produced by [`crate::writer::v1::V1Writer::finish`] or
    /// mapped directly from a file.
    pub fn open(window: ByteWindow, strategy: S) -> Result<Self> {
        let version = window.get_u8(0);
        header::read_version(&[version][..])?;
        if version != VERSION_V1 {
            return Err(DictionaryError::CorruptData(format!(
                "expected V1 container (version {VERSION_V1:#04x}), found {version:#04x}"
            )));
        }
        let meta_bytes = window.slice(1, 10);
        let meta = V1Meta::read(meta_bytes.as_slice())?;

        let n = meta.num_elements;
        let offsets_len = 4usize
            .checked_mul(n as usize)
            .ok_or_else(|| DictionaryError::CorruptData("offsets table length overflow".into()))?;
        if meta.num_bytes_used < 0 || (meta.num_bytes_used as usize) < offsets_len {
            return Err(DictionaryError::CorruptData(format!(
                "numBytesUsed {} smaller than offsets table {offsets_len}",
                meta.num_bytes_used
            )));
        }
        let region_end = 10usize
            .checked_add(meta.num_bytes_used as usize)
            .ok_or_else(|| DictionaryError::CorruptData("numBytesUsed overflow".into()))?;
        if region_end > window.capacity() {
            return Err(DictionaryError::CorruptData(format!(
                "numBytesUsed {} extends past buffer capacity {}",
                meta.num_bytes_used,
                window.capacity()
            )));
        }

        let header_offsets = window.slice(10, 10 + offsets_len);
        let payload = window.slice(10 + offsets_len, region_end);

        Ok(V1Reader {
            strategy,
            header_offsets,
            payload,
            n,
            reverse_lookup_allowed: meta.reverse_lookup_allowed,
            num_bytes_used: meta.num_bytes_used,
        })
    }

    fn check_bounds(&self, index: i32) -> Result<()> {
        if index < 0 || index >= self.n {
            return Err(DictionaryError::OutOfRangeIndex { index: index as i64, size: self.n });
        }
        Ok(())
    }

    /// Total serialized size, version byte included — `write_to` writes
    /// exactly this many bytes.
    pub fn serialized_size(&self) -> i32 {
        10 + self.num_bytes_used
    }

    /// Re-serialize this dictionary. V1 only — the V2 reader has no
    /// equivalent (`DictionaryError::UnsupportedSerialization`); rebuilding a
    /// V2 blob requires the V2 writer.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<()> {
        let meta = V1Meta {
            reverse_lookup_allowed: self.reverse_lookup_allowed,
            num_bytes_used: self.num_bytes_used,
            num_elements: self.n,
        };
        meta.write(&mut sink)?;
        sink.write_all(self.header_offsets.as_slice())?;
        sink.write_all(self.payload.as_slice())?;
        Ok(())
    }
}

impl<S: ObjectStrategy> IndexedDictionary<S> for V1Reader<S> {
    fn size(&self) -> i32 {
        self.n
    }

    fn get(&self, index: i32) -> Result<Option<S::Value>> {
        self.check_bounds(index)?;
        let idx = index as usize;

        let start: i64 = if idx == 0 {
            4
        } else {
            offset_plus_marker_width(self.header_offsets.get_i32_be((idx - 1) * 4))?
        };
        let end: i64 = self.header_offsets.get_i32_be(idx * 4) as i64;

        if start < 0 || end < start {
            tracing::warn!(index, start, end, "offset table not monotonic");
            return Err(DictionaryError::CorruptData(format!(
                "offset table not monotonic at index {index}: start={start} end={end}"
            )));
        }
        let (start, end) = (start as usize, end as usize);
        if end > self.payload.capacity() {
            tracing::warn!(index, end, capacity = self.payload.capacity(), "payload end exceeds buffer");
            return Err(DictionaryError::CorruptData(format!(
                "payload end {end} exceeds buffer capacity {}",
                self.payload.capacity()
            )));
        }

        let marker = self.payload.get_i32_be(start - 4);
        if end - start == 0 && marker == -1 {
            return Ok(None);
        }

        let value_window = self.payload.slice(start, end);
        Ok(Some(self.strategy.decode(&value_window)?))
    }

    fn is_sorted(&self) -> bool {
        self.reverse_lookup_allowed
    }

    fn index_of(&self, strategy: &S, value: &Option<S::Value>) -> Result<i32> {
        binary_search(
            self.n,
            self.reverse_lookup_allowed,
            |i| self.get(i),
            value,
            |a, b| strategy.compare(a, b),
        )
    }
}
