//! V2 reader (C5): a meta block, a native-endian offset table ("header
//! file"), and N value files resolved lazily through a [`FileMapper`]. See
//! `SPEC_FULL.md` §4.5.
//!
//! Element `i` lives in value file `i >> exp`, at the position recorded for
//! global index `i` in the header file — the header file covers every
//! element, not just the ones in its own value file, so `get` never has to
//! special-case which file an index belongs to before consulting it.

use std::io::Write;

use crate::codec::ObjectStrategy;
use crate::error::{DictionaryError, Result};
use crate::header::V2Meta;
use crate::mapper::{header_name, meta_name, value_name, FileMapper};
use crate::window::ByteWindow;

use super::{binary_search, offset_plus_marker_width, IndexedDictionary};

pub struct V2Reader<S: ObjectStrategy, M> {
    strategy: S,
    mapper: M,
    meta: V2Meta,
    header: ByteWindow,
}

impl<S: ObjectStrategy, M: FileMapper> V2Reader<S, M> {
    /// Open a V2 dictionary for `column_name` through `mapper`. Only the
    /// meta block and the header file are mapped eagerly; value files are
    /// resolved on first access and cached by the mapper itself.
    pub fn open(mapper: M, strategy: S, column_name: &str) -> Result<Self> {
        let meta_window = mapper.map(&meta_name(column_name))?;
        let meta = V2Meta::read(meta_window.as_slice())?;
        if meta.column_name != column_name {
            return Err(DictionaryError::CorruptData(format!(
                "V2 meta column name {:?} does not match requested {column_name:?}",
                meta.column_name
            )));
        }

        let header = mapper.map(&header_name(column_name))?;
        let expected_header_len = meta.num_elements as usize * 4;
        if header.capacity() < expected_header_len {
            return Err(DictionaryError::CorruptData(format!(
                "header file too short: expected at least {expected_header_len} bytes, got {}",
                header.capacity()
            )));
        }

        Ok(V2Reader { strategy, mapper, meta, header })
    }

    fn check_bounds(&self, index: i32) -> Result<()> {
        if index < 0 || index >= self.meta.num_elements {
            return Err(DictionaryError::OutOfRangeIndex {
                index: index as i64,
                size: self.meta.num_elements,
            });
        }
        Ok(())
    }

    fn value_file(&self, file_num: i64) -> Result<ByteWindow> {
        self.mapper.map(&value_name(&self.meta.column_name, file_num as usize))
    }

    /// V2 has no `write_to` counterpart: a multi-file dictionary cannot be
    /// serialized through a single `Write` sink, it must be rebuilt with
    /// [`crate::writer::v2::V2Writer`].
    pub fn write_to<W: Write>(&self, _sink: W) -> Result<()> {
        Err(DictionaryError::UnsupportedSerialization)
    }
}

impl<S: ObjectStrategy, M: FileMapper> IndexedDictionary<S> for V2Reader<S, M> {
    fn size(&self) -> i32 {
        self.meta.num_elements
    }

    fn get(&self, index: i32) -> Result<Option<S::Value>> {
        self.check_bounds(index)?;
        let i = index as i64;
        let mask = self.meta.entries_per_file() - 1;
        let file_num = i >> self.meta.exp;
        let rel = i & mask;

        let end: i64 = self.header.get_i32_native((i as usize) * 4) as i64;
        let start: i64 = if rel == 0 {
            4
        } else {
            offset_plus_marker_width(self.header.get_i32_native(((i - 1) as usize) * 4))?
        };
        if start < 0 || end < start {
            tracing::warn!(index, file_num, start, end, "header file not monotonic");
            return Err(DictionaryError::CorruptData(format!(
                "header file not monotonic within value file {file_num} at index {index}: start={start} end={end}"
            )));
        }
        let (start, end) = (start as usize, end as usize);

        let value_window = self.value_file(file_num)?;
        if end > value_window.capacity() {
            tracing::warn!(
                index,
                file_num,
                end,
                capacity = value_window.capacity(),
                "payload end exceeds value file capacity"
            );
            return Err(DictionaryError::CorruptData(format!(
                "payload end {end} exceeds value file {file_num} capacity {}",
                value_window.capacity()
            )));
        }

        let marker = value_window.get_i32_be(start - 4);
        if end - start == 0 && marker == -1 {
            return Ok(None);
        }

        let payload = value_window.slice(start, end);
        Ok(Some(self.strategy.decode(&payload)?))
    }

    fn is_sorted(&self) -> bool {
        self.meta.reverse_lookup_allowed
    }

    fn index_of(&self, strategy: &S, value: &Option<S::Value>) -> Result<i32> {
        binary_search(
            self.meta.num_elements,
            self.meta.reverse_lookup_allowed,
            |i| self.get(i),
            value,
            |a, b| strategy.compare(a, b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Utf8Strategy;
    use crate::mapper::DirFileMapper;
    use crate::writer::v2::{V2Writer, V2WriterOptions};

    fn build(dir: &std::path::Path, values: &[Option<&str>], target_page_size: usize) {
        let mut writer = V2Writer::new(
            Utf8Strategy,
            dir,
            "col",
            V2WriterOptions { target_page_size, ..Default::default() },
        );
        for v in values {
            writer.write(v.map(|s| s.to_string())).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn multi_file_layout_with_exp_one_over_five_elements() {
        let dir = tempfile::tempdir().unwrap();
        // Each encoded element is 5 bytes (4-byte marker + 1 char); a
        // 9-byte page fits one element, so the first rotation trigger
        // fires at raw_count=1, giving exp=1 (2 entries per value file).
        build(dir.path(), &[Some("a"), Some("b"), Some("c"), Some("d"), Some("e")], 9);

        assert!(dir.path().join("col_value_0").exists());
        assert!(dir.path().join("col_value_1").exists());
        assert!(dir.path().join("col_value_2").exists());
        assert!(!dir.path().join("col_value_3").exists());

        let mapper = DirFileMapper::new(dir.path());
        let reader = V2Reader::open(mapper, Utf8Strategy, "col").unwrap();
        assert_eq!(reader.size(), 5);
        for (i, expected) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            assert_eq!(reader.get(i as i32).unwrap(), Some(expected.to_string()));
        }
        assert!(reader.is_sorted());
        assert_eq!(reader.index_of(&Utf8Strategy, &Some("c".to_string())).unwrap(), 2);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        build(dir.path(), &[Some("only")], 4);
        let mapper = DirFileMapper::new(dir.path());
        let reader = V2Reader::open(mapper, Utf8Strategy, "col").unwrap();
        assert!(matches!(
            reader.get(5).unwrap_err(),
            DictionaryError::OutOfRangeIndex { index: 5, size: 1 }
        ));
    }

    #[test]
    fn write_to_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        build(dir.path(), &[Some("a")], 4);
        let mapper = DirFileMapper::new(dir.path());
        let reader = V2Reader::open(mapper, Utf8Strategy, "col").unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            reader.write_to(&mut out).unwrap_err(),
            DictionaryError::UnsupportedSerialization
        ));
    }
}
