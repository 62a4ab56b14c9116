//! External collaborators: the file mapper and writable sink roles (§1, §6).
//!
//! Neither role is specified by the dictionary itself — they are the seams
//! the surrounding database plugs storage into. This module supplies the
//! traits plus one concrete, `memmap2`-backed implementation of each so the
//! crate is directly usable outside of an embedding database (A2 of
//! `SPEC_FULL.md`).

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;

use crate::error::{DictionaryError, Result};
use crate::window::ByteWindow;

/// Given a logical name, returns a read-only byte window whose limit equals
/// its capacity (conceptually: the whole mapped file).
pub trait FileMapper: Send + Sync {
    fn map(&self, name: &str) -> Result<ByteWindow>;
}

/// An append-only byte channel for serialization. Any `std::io::Write`
/// implementor qualifies; this trait exists only to give the role a name
/// matching §1, the same way the teacher format names `Codec` as a role
/// while accepting any `Write + Seek` for its generic writers.
pub trait WritableSink: Write {}
impl<T: Write> WritableSink for T {}

/// Maps file names to `mmap`'d, read-only windows rooted at a directory.
///
/// Mappings are cached for the mapper's lifetime: V2's header file and every
/// value file are each mapped exactly once, and `duplicate()`/`slice()` on
/// the resulting [`ByteWindow`] never re-touch the filesystem.
pub struct DirFileMapper {
    root: PathBuf,
    cache: std::sync::Mutex<HashMap<String, ByteWindow>>,
}

impl DirFileMapper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirFileMapper {
            root: root.into(),
            cache: std::sync::Mutex::new(HashMap::new()),
        }
    }
}

impl FileMapper for DirFileMapper {
    fn map(&self, name: &str) -> Result<ByteWindow> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(w) = cache.get(name) {
            return Ok(w.duplicate());
        }

        let path = self.root.join(name);
        let file = File::open(&path).map_err(|e| DictionaryError::FileMappingFailure {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        // SAFETY: the mapped file is treated as immutable for the lifetime of
        // the mapper; callers must not mutate it concurrently from outside
        // this process, matching the read-only-backing-store contract of
        // every reader built on top of a `FileMapper`.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| DictionaryError::FileMappingFailure {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        // `ByteWindow` holds the `Mmap` itself behind the `Arc` — no bytes
        // are copied out of the mapped region.
        let window = ByteWindow::new(Arc::new(mmap));
        cache.insert(name.to_string(), window.duplicate());
        Ok(window)
    }
}

impl DirFileMapper {
    /// Path the V2 meta block would live at for `column_name`, for writers
    /// that create the file directly rather than going through `map`.
    pub fn meta_path(root: &Path, column_name: &str) -> PathBuf {
        root.join(meta_name(column_name))
    }

    /// Path a V2 header file would live at for `column_name`.
    pub fn header_path(root: &Path, column_name: &str) -> PathBuf {
        root.join(header_name(column_name))
    }

    /// Path a V2 value file `k` would live at for `column_name`.
    pub fn value_path(root: &Path, column_name: &str, k: usize) -> PathBuf {
        root.join(value_name(column_name, k))
    }
}

/// Logical name of the V2 meta block for `column_name` — the name a
/// [`FileMapper::map`] call and a [`DirFileMapper::meta_path`] call must
/// agree on.
pub fn meta_name(column_name: &str) -> String {
    format!("{column_name}_meta")
}

/// Logical name of the V2 header (offset table) file for `column_name`.
pub fn header_name(column_name: &str) -> String {
    format!("{column_name}_header")
}

/// Logical name of V2 value file `k` for `column_name`.
pub fn value_name(column_name: &str, k: usize) -> String {
    format!("{column_name}_value_{k}")
}

/// Open (creating if necessary) a file for append-only sequential writing —
/// the default [`WritableSink`] collaborator.
pub fn create_sink(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn maps_a_file_and_caches_the_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col_value_0");
        create_sink(&path).unwrap().write_all(b"hello").unwrap();

        let mapper = DirFileMapper::new(dir.path());
        let a = mapper.map("col_value_0").unwrap();
        let b = mapper.map("col_value_0").unwrap();
        assert_eq!(a.as_slice(), b"hello");
        assert_eq!(b.as_slice(), b"hello");
    }

    #[test]
    fn missing_file_is_a_mapping_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mapper = DirFileMapper::new(dir.path());
        let err = mapper.map("does_not_exist").unwrap_err();
        assert!(matches!(err, DictionaryError::FileMappingFailure { .. }));
    }

    #[test]
    fn name_helpers_match_path_helpers() {
        let root = Path::new("/tmp/example");
        assert_eq!(DirFileMapper::meta_path(root, "col"), root.join(meta_name("col")));
        assert_eq!(DirFileMapper::header_path(root, "col"), root.join(header_name("col")));
        assert_eq!(DirFileMapper::value_path(root, "col", 3), root.join(value_name("col", 3)));
    }
}
