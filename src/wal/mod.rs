//! Segment File Module
//!
//! Sequential reading and writing of one write-ahead log segment file.
//!
//! ## Responsibilities
//! - Append encoded entries in log order
//! - CRC32 trailers for corruption detection
//! - Sequential, bounded parsing for reconstruction and cache loads
//! - Corruption-policy-aware full-file scans
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │ Header: Magic "RAFTSEG1" (8)                    │
//! ├─────────────────────────────────────────────────┤
//! │ Entry 1                                         │
//! │ ┌──────────────┬──────────────────┬───────────┐ │
//! │ │ Len (varint) │ Entry (bincode)  │ CRC (4)   │ │
//! │ └──────────────┴──────────────────┴───────────┘ │
//! ├─────────────────────────────────────────────────┤
//! │ Entry 2 ...                                     │
//! ├─────────────────────────────────────────────────┤
//! │ Zero padding (optional, Len = 0 onwards)        │
//! └─────────────────────────────────────────────────┘
//! ```

mod format;
mod reader;
mod recovery;
mod writer;

pub use format::{checksum, read_varint, write_varint, HEADER_SIZE, MAGIC};
pub use reader::SegmentReader;
pub use recovery::read_segment_file;
pub use writer::SegmentWriter;
