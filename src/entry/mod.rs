//! Entry Module
//!
//! Log entries as held in memory.
//!
//! ## Responsibilities
//! - Entry identity (`TermIndex`) and payload-free headers
//! - Shared, reference-counted entry handles for zero-copy reuse
//! - On-disk size accounting for cache and offset bookkeeping
//!
//! ## On-disk Size
//! ```text
//! ┌──────────────┬──────────────────────┬─────────────┐
//! │ Len (varint) │  Entry (bincode)     │  CRC32 (4)  │
//! └──────────────┴──────────────────────┴─────────────┘
//! ```

mod log_entry;
mod reference;

pub use log_entry::{EntryKind, LogEntry, LogEntryHeader, TermIndex};
pub use reference::ReferenceCounted;

/// A retained reference to a shared log entry
pub type EntryRef = ReferenceCounted<LogEntry>;

/// Size of the checksum trailer that follows every entry on disk
pub const CHECKSUM_SIZE: u64 = 4;

/// Why an entry size is being computed
///
/// The modes that describe entries coming from or going straight to the
/// segment file require that the entry carries no state machine data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    /// Populating the cache from a segment file scan
    LoadSegmentFile,
    /// Dropping an entry from the cache
    RemoveCache,
    /// Checking whether a segment file is full
    CheckSegmentFileFull,
    /// Appending an entry whose state machine data is cached elsewhere
    WriteCacheWithStateMachineCache,
    /// Appending an entry that may still carry state machine data
    WriteCacheWithoutStateMachineCache,
}

/// Number of bytes the varint encoding of `value` occupies
pub fn varint_len(value: u64) -> u64 {
    let bits = 64 - (value | 1).leading_zeros() as u64;
    bits.div_ceil(7)
}

/// On-disk size of `entry`: length prefix + serialized bytes + checksum.
///
/// # Panics
///
/// Panics if `op` requires an entry without state machine data and `entry`
/// carries some.
pub fn entry_size(entry: &LogEntry, op: CacheOp) -> u64 {
    match op {
        CacheOp::CheckSegmentFileFull
        | CacheOp::LoadSegmentFile
        | CacheOp::WriteCacheWithStateMachineCache => {
            assert!(
                !entry.has_state_machine_data(),
                "Unexpected entry with state machine data: op={:?}, entry={}",
                op,
                entry.term_index()
            );
        }
        CacheOp::WriteCacheWithoutStateMachineCache | CacheOp::RemoveCache => {}
    }
    let serialized = entry.serialized_size();
    serialized + varint_len(serialized) + CHECKSUM_SIZE
}
