//! Error kinds shared by every reader, writer, and collaborator trait.
//!
//! Every failure is terminal for the operation that raised it: the reader or
//! writer is left in its pre-call state, there is no retry, and there is no
//! partial mutation to unwind.

use thiserror::Error;

/// Reserved container version byte. Used elsewhere by the wider format
/// family for an encoded-string dictionary; this crate MUST reject it.
pub const RESERVED_VERSION: u8 = 0x00;

#[derive(Error, Debug)]
pub enum DictionaryError {
    /// `i < 0` or `i >= n`.
    #[error("index {index} out of range for dictionary of size {size}")]
    OutOfRangeIndex { index: i64, size: i32 },

    /// First container byte is not a known version, or is the reserved `0x00`.
    #[error("unknown container version byte {0:#04x}")]
    UnknownVersion(u8),

    /// A V2 container was detected but no [`FileMapper`](crate::mapper::FileMapper) was supplied.
    #[error("V2 dictionary requires a file mapper but none was provided")]
    MissingFileMapper,

    /// The file mapper failed to resolve a named file.
    #[error("file mapper failed to map {name:?}: {reason}")]
    FileMappingFailure { name: String, reason: String },

    /// `index_of` was called on a dictionary that was not written in
    /// strictly ascending order.
    #[error("reverse lookup is not supported: dictionary was not written in strictly ascending order")]
    ReverseLookupUnsupported,

    /// `write_to` / `serialized_size` was called on a reader that cannot be
    /// re-serialized (the V2 reader; rebuild with the V2 writer instead).
    #[error("this dictionary cannot be serialized directly; rebuild it with the matching writer")]
    UnsupportedSerialization,

    /// Offset monotonicity violated, bag-size arithmetic inconsistent with
    /// the element count, or a payload length exceeds the backing buffer.
    #[error("corrupt dictionary data: {0}")]
    CorruptData(String),

    /// A lower-level I/O failure from the sink, mapper, or underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DictionaryError>;
