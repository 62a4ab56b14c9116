//! Container header (C3): version byte, reverse-lookup flag, element count,
//! and (V2 only) the bag-size exponent and column name.
//!
//! See `SPEC_FULL.md` §4.3 for the exact byte layout. Both headers are
//! big-endian; the V2 *header file* (the offset table, not this meta block)
//! is native-endian and is handled in `reader::v2` / `writer::v2`, not here.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{DictionaryError, Result, RESERVED_VERSION};

pub const VERSION_V1: u8 = 0x01;
pub const VERSION_V2: u8 = 0x02;

/// V1 meta block: version + flag + `numBytesUsed` + `numElements`, 10 bytes
/// total (the version byte itself is read separately by the caller so it can
/// dispatch to V1 vs V2 before committing to either parser — matching the
/// "version byte read externally" contract of §4.4).
#[derive(Debug, Clone, Copy)]
pub struct V1Meta {
    pub reverse_lookup_allowed: bool,
    pub num_bytes_used: i32,
    pub num_elements: i32,
}

impl V1Meta {
    /// Read the 9 bytes following the version byte (flag + numBytesUsed +
    /// numElements). The version byte must already have been consumed and
    /// validated by the caller.
    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let reverse_lookup_allowed = r.read_u8()? != 0;
        let num_bytes_used = r.read_i32::<BigEndian>()?;
        let num_elements = r.read_i32::<BigEndian>()?;
        if num_elements < 0 {
            return Err(DictionaryError::CorruptData(format!(
                "V1 numElements must be non-negative, got {num_elements}"
            )));
        }
        Ok(V1Meta { reverse_lookup_allowed, num_bytes_used, num_elements })
    }

    /// Write the version byte followed by the rest of the V1 meta block.
    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_u8(VERSION_V1)?;
        w.write_u8(self.reverse_lookup_allowed as u8)?;
        w.write_i32::<BigEndian>(self.num_bytes_used)?;
        w.write_i32::<BigEndian>(self.num_elements)?;
        Ok(())
    }
}

/// V2 meta block: version + flag + exp + numElements + columnName.
#[derive(Debug, Clone)]
pub struct V2Meta {
    pub reverse_lookup_allowed: bool,
    pub exp: i32,
    pub num_elements: i32,
    pub column_name: String,
}

impl V2Meta {
    /// Read the bytes following the version byte.
    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let reverse_lookup_allowed = r.read_u8()? != 0;
        let exp = r.read_i32::<BigEndian>()?;
        let num_elements = r.read_i32::<BigEndian>()?;
        if !(1..=30).contains(&exp) {
            return Err(DictionaryError::CorruptData(format!(
                "V2 exp must be in 1..=30, got {exp}"
            )));
        }
        if num_elements < 0 {
            return Err(DictionaryError::CorruptData(format!(
                "V2 numElements must be non-negative, got {num_elements}"
            )));
        }
        let name_len = r.read_i32::<BigEndian>()?;
        if name_len < 0 {
            return Err(DictionaryError::CorruptData(format!(
                "V2 columnNameLength must be non-negative, got {name_len}"
            )));
        }
        let mut name_bytes = vec![0u8; name_len as usize];
        r.read_exact(&mut name_bytes)?;
        let column_name = String::from_utf8(name_bytes).map_err(|e| {
            DictionaryError::CorruptData(format!("V2 columnName is not valid UTF-8: {e}"))
        })?;
        Ok(V2Meta { reverse_lookup_allowed, exp, num_elements, column_name })
    }

    /// Write the version byte followed by the rest of the V2 meta block.
    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_u8(VERSION_V2)?;
        w.write_u8(self.reverse_lookup_allowed as u8)?;
        w.write_i32::<BigEndian>(self.exp)?;
        w.write_i32::<BigEndian>(self.num_elements)?;
        let name_bytes = self.column_name.as_bytes();
        w.write_i32::<BigEndian>(name_bytes.len() as i32)?;
        w.write_all(name_bytes)?;
        Ok(())
    }

    /// Number of elements addressable per value file: `2^exp`.
    #[inline]
    pub fn entries_per_file(&self) -> i64 {
        1i64 << self.exp
    }

    /// Number of value files: `ceil(n / 2^exp)`.
    #[inline]
    pub fn num_files(&self) -> i64 {
        if self.num_elements == 0 {
            return 0;
        }
        let per_file = self.entries_per_file();
        (self.num_elements as i64 + per_file - 1) / per_file
    }
}

/// Read and dispatch the leading version byte, rejecting the reserved
/// `0x00` and anything not `V1`/`V2`.
pub fn read_version<R: Read>(mut r: R) -> Result<u8> {
    let version = r.read_u8()?;
    match version {
        VERSION_V1 | VERSION_V2 => Ok(version),
        RESERVED_VERSION => Err(DictionaryError::UnknownVersion(version)),
        other => Err(DictionaryError::UnknownVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_meta_round_trips() {
        let meta = V1Meta { reverse_lookup_allowed: true, num_bytes_used: 123, num_elements: 7 };
        let mut buf = Vec::new();
        meta.write(&mut buf).unwrap();
        assert_eq!(buf[0], VERSION_V1);
        let version = read_version(&buf[..1]).unwrap();
        assert_eq!(version, VERSION_V1);
        let parsed = V1Meta::read(&buf[1..]).unwrap();
        assert_eq!(parsed.num_bytes_used, 123);
        assert_eq!(parsed.num_elements, 7);
        assert!(parsed.reverse_lookup_allowed);
    }

    #[test]
    fn v2_meta_round_trips_with_column_name() {
        let meta = V2Meta {
            reverse_lookup_allowed: false,
            exp: 4,
            num_elements: 1000,
            column_name: "my_column".to_string(),
        };
        let mut buf = Vec::new();
        meta.write(&mut buf).unwrap();
        let version = read_version(&buf[..1]).unwrap();
        assert_eq!(version, VERSION_V2);
        let parsed = V2Meta::read(&buf[1..]).unwrap();
        assert_eq!(parsed.column_name, "my_column");
        assert_eq!(parsed.num_files(), 63); // ceil(1000/16)
    }

    #[test]
    fn reserved_version_rejected() {
        let buf = [RESERVED_VERSION];
        let err = read_version(&buf[..]).unwrap_err();
        assert!(matches!(err, DictionaryError::UnknownVersion(0x00)));
    }

    #[test]
    fn unknown_version_rejected() {
        let buf = [0x7F];
        let err = read_version(&buf[..]).unwrap_err();
        assert!(matches!(err, DictionaryError::UnknownVersion(0x7F)));
    }
}
