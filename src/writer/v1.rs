//! V1 writer (C7): streams values into two growable buffers (offsets,
//! payload) and finalizes them into one V1 blob. See `SPEC_FULL.md` §4.7.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::codec::ObjectStrategy;
use crate::error::Result;
use crate::header::V1Meta;
use crate::window::ByteWindow;

use super::SortTracker;

/// Configuration marker for [`V1Writer::new`]. V1 has no tunables — no page
/// size, no rotation, no codec label — so this carries no fields; it exists
/// only so the writer family has a `*WriterOptions` type for every version,
/// matching [`crate::writer::v2::V2WriterOptions`] for V2. `V1Writer::new`
/// does not take one: there is nothing for a caller to set.
#[derive(Debug, Default, Clone, Copy)]
pub struct V1WriterOptions;

pub struct V1Writer<S: ObjectStrategy> {
    strategy: S,
    sort: SortTracker<S::Value>,
    header_out: Vec<u8>,
    values_out: Vec<u8>,
    prev_end: i64,
    count: i32,
}

impl<S: ObjectStrategy> V1Writer<S> {
    pub fn new(strategy: S) -> Self {
        V1Writer {
            strategy,
            sort: SortTracker::new(),
            header_out: Vec::new(),
            values_out: Vec::new(),
            prev_end: 0,
            count: 0,
        }
    }

    /// Append one value (`None` for `NULL`). Values must be supplied exactly
    /// once, in the final order they should appear at.
    pub fn write(&mut self, value: Option<S::Value>) -> Result<()> {
        self.sort.observe(&self.strategy, &value);

        let before = self.values_out.len();
        match &value {
            None => {
                self.values_out.write_i32::<BigEndian>(-1)?;
            }
            Some(v) => {
                self.values_out.write_i32::<BigEndian>(0)?;
                self.strategy.encode(v, &mut self.values_out as &mut dyn Write)?;
            }
        }
        let value_len = (self.values_out.len() - before - 4) as i64;
        let end = self.prev_end + 4 + value_len;
        self.header_out.write_i32::<BigEndian>(end as i32)?;

        self.prev_end = end;
        self.count += 1;
        Ok(())
    }

    /// Finalize into an in-memory window, ready to be handed to
    /// [`crate::reader::v1::V1Reader::open`].
    pub fn finish(self) -> Result<ByteWindow> {
        let mut buf = Vec::with_capacity(10 + self.header_out.len() + self.values_out.len());
        self.meta().write(&mut buf)?;
        buf.extend_from_slice(&self.header_out);
        buf.extend_from_slice(&self.values_out);
        Ok(ByteWindow::from_vec(buf))
    }

    /// Finalize directly to a sink, without an intermediate `ByteWindow`.
    pub fn write_to<W: Write>(self, mut sink: W) -> Result<()> {
        self.meta().write(&mut sink)?;
        sink.write_all(&self.header_out)?;
        sink.write_all(&self.values_out)?;
        Ok(())
    }

    fn meta(&self) -> V1Meta {
        V1Meta {
            reverse_lookup_allowed: self.sort.allow_reverse_lookup(),
            num_bytes_used: (self.header_out.len() + self.values_out.len()) as i32,
            num_elements: self.count,
        }
    }
}
