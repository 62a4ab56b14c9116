//! Single-threaded cursor accelerator (C6): a `!Send` companion to
//! [`super::v2::V2Reader`] that keeps its own unsynchronized cache of
//! mapped value-file windows, for callers doing many sequential `get`/
//! `index_of` calls on one thread and who would otherwise pay the
//! `DirFileMapper` cache's mutex on every access. See `SPEC_FULL.md` §4.6.
//!
//! Not thread-safe: the file-window cache is a plain `RefCell`. Build one
//! cursor per thread.
//!
//! For [`ObjectStrategy::is_byte_identity`] strategies (only [`crate::codec::BytesStrategy`]),
//! `decode` is already a zero-cost `ByteWindow::duplicate` — there is no
//! separate "skip decoding" code path to add here; the generic path below
//! already pays no allocation cost for that case.

use std::cell::{Cell, RefCell};

use crate::codec::ObjectStrategy;
use crate::error::{DictionaryError, Result};
use crate::header::V2Meta;
use crate::mapper::{header_name, meta_name, value_name, FileMapper};
use crate::window::ByteWindow;

use super::{binary_search, offset_plus_marker_width};

pub struct SingleThreadedCursor<S: ObjectStrategy, M> {
    strategy: S,
    mapper: M,
    meta: V2Meta,
    header: ByteWindow,
    files: RefCell<Vec<Option<ByteWindow>>>,
    last_value_size: Cell<usize>,
}

impl<S: ObjectStrategy, M: FileMapper> SingleThreadedCursor<S, M> {
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
        let num_files = meta.num_files() as usize;

        Ok(SingleThreadedCursor {
            strategy,
            mapper,
            meta,
            header,
            files: RefCell::new(vec![None; num_files]),
            last_value_size: Cell::new(0),
        })
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

    /// The cached window for value file `file_num`, mapping and caching it
    /// on first use. Unlike `V2Reader`, this cache is never behind a lock:
    /// the whole point of this type is single-threaded reuse.
    fn value_file(&self, file_num: i64) -> Result<ByteWindow> {
        let idx = file_num as usize;
        if let Some(w) = self.files.borrow().get(idx).and_then(|o| o.as_ref()) {
            tracing::trace!(file_num, "cursor value-file cache hit");
            return Ok(w.duplicate());
        }
        tracing::debug!(file_num, "cursor value-file cache miss, mapping");
        let window = self.mapper.map(&value_name(&self.meta.column_name, idx))?;
        self.files.borrow_mut()[idx] = Some(window.duplicate());
        Ok(window)
    }

    /// Byte length of the payload returned by the most recent `get` call
    /// that found a non-null value. Exposed because a caller that already
    /// read `get`'s result has no other way to recover this without
    /// re-slicing the window itself.
    pub fn get_last_value_size(&self) -> usize {
        self.last_value_size.get()
    }

    pub fn size(&self) -> i32 {
        self.meta.num_elements
    }

    pub fn get(&self, index: i32) -> Result<Option<S::Value>> {
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
            self.last_value_size.set(0);
            return Ok(None);
        }

        self.last_value_size.set(end - start);
        let payload = value_window.slice(start, end);
        Ok(Some(self.strategy.decode(&payload)?))
    }

    pub fn is_sorted(&self) -> bool {
        self.meta.reverse_lookup_allowed
    }

    pub fn index_of(&self, strategy: &S, value: &Option<S::Value>) -> Result<i32> {
        binary_search(
            self.meta.num_elements,
            self.meta.reverse_lookup_allowed,
            |i| self.get(i),
            value,
            |a, b| strategy.compare(a, b),
        )
    }
}
