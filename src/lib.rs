//! # flatdict — indexed flat-file dictionary
//!
//! Format guarantees:
//! - V1 is a single mapped buffer: version byte, meta block, offset table,
//!   payload region, all big-endian
//! - V2 splits one column across a meta block, a native-endian offset file,
//!   and N value files, addressed by `index >> exp` / `index & mask`
//! - `NULL` is a dedicated length-marker word (`-1`), distinct from a
//!   zero-length non-null payload (marker `0`)
//! - Binary search requires strictly-ascending input; any tie or descent
//!   permanently disables it for that dictionary (`reverseLookupAllowed`)
//! - Every read is zero-copy: a payload handed back from `get` is a window
//!   over the mapped bytes, never a fresh allocation, except where the
//!   codec itself decodes into an owned type (e.g. `Utf8Strategy`)

pub mod codec;
pub mod compression;
pub mod error;
pub mod header;
pub mod mapper;
pub mod reader;
pub mod window;
pub mod writer;

pub use codec::{BytesStrategy, ObjectStrategy, Utf8Strategy};
pub use compression::CompressedStrategy;
pub use error::{DictionaryError, Result};
pub use header::{V1Meta, V2Meta, VERSION_V1, VERSION_V2};
pub use mapper::{create_sink, DirFileMapper, FileMapper, WritableSink};
pub use reader::{Dictionary, IndexedDictionary, SingleThreadedCursor, V1Reader, V2Reader};
pub use window::{utf8_compare, ByteWindow};
pub use writer::v1::{V1Writer, V1WriterOptions};
pub use writer::v2::{V2Writer, V2WriterOptions};
