//! Segment file format primitives
//!
//! Header magic, varint length prefixes and the checksum trailer.

use std::io::{self, Read};

use crate::error::{Result, SegmentError};

/// Magic bytes at the start of every segment file
pub const MAGIC: &[u8; 8] = b"RAFTSEG1";

/// Header size: the magic only
pub const HEADER_SIZE: u64 = MAGIC.len() as u64;

/// Longest valid varint encoding of a u64
const MAX_VARINT_LEN: usize = 10;

/// Append the varint encoding of `value` to `buf`
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read one varint.
///
/// Returns `Ok(None)` on a clean end of input before the first byte.
pub fn read_varint<R: Read>(reader: &mut R) -> Result<Option<u64>> {
    let mut out: u64 = 0;
    let mut shift: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        let mut b = [0u8; 1];
        match reader.read_exact(&mut b) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && i == 0 => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(SegmentError::Corruption(format!(
                    "Truncated varint after {} bytes",
                    i
                )))
            }
            Err(e) => return Err(e.into()),
        }
        out |= ((b[0] & 0x7F) as u64) << shift;
        if b[0] & 0x80 == 0 {
            return Ok(Some(out));
        }
        shift += 7;
    }
    Err(SegmentError::Corruption("Varint too long".to_string()))
}

/// Checksum stored in the 4-byte trailer of an entry
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
