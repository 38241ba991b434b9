//! Log entry definitions
//!
//! Defines the decoded form of one consensus log entry and its
//! payload-free header.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Fixed-width part of a serialized entry:
/// term (8) + index (8) + kind tag (4) + payload length (8) + option tag (1)
const FIXED_SERIALIZED_SIZE: u64 = 8 + 8 + 4 + 8 + 1;

/// Unique identity of a log entry: the term it was created in and its index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermIndex {
    pub term: u64,
    pub index: u64,
}

impl TermIndex {
    pub fn new(term: u64, index: u64) -> Self {
        Self { term, index }
    }
}

impl fmt::Display for TermIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(t:{}, i:{})", self.term, self.index)
    }
}

/// What an entry carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A state machine operation
    Normal,

    /// A cluster membership change
    Configuration,

    /// Commit metadata
    Metadata,
}

/// A single decoded log entry
///
/// `state_machine_data` is the out-of-band payload a state machine may attach
/// to an entry. It never reaches the segment file, so entries read back from
/// disk never carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub term: u64,
    pub index: u64,
    pub kind: EntryKind,
    pub payload: Bytes,
    pub state_machine_data: Option<Bytes>,
}

impl LogEntry {
    /// Create an entry without state machine data
    pub fn new(term: u64, index: u64, kind: EntryKind, payload: impl Into<Bytes>) -> Self {
        Self {
            term,
            index,
            kind,
            payload: payload.into(),
            state_machine_data: None,
        }
    }

    /// Attach out-of-band state machine data
    pub fn with_state_machine_data(mut self, data: impl Into<Bytes>) -> Self {
        self.state_machine_data = Some(data.into());
        self
    }

    pub fn term_index(&self) -> TermIndex {
        TermIndex::new(self.term, self.index)
    }

    pub fn has_state_machine_data(&self) -> bool {
        self.state_machine_data.is_some()
    }

    /// Copy of this entry with the state machine data dropped.
    /// Payload buffers are shared, not copied.
    pub fn without_state_machine_data(&self) -> Self {
        Self {
            state_machine_data: None,
            ..self.clone()
        }
    }

    /// Exact length of this entry's bincode encoding.
    ///
    /// bincode's default layout is fixed-width: u64 fields take 8 bytes, a
    /// unit enum variant takes a 4-byte tag, byte buffers take an 8-byte
    /// length prefix and an `Option` takes a 1-byte tag.
    pub fn serialized_size(&self) -> u64 {
        let sm = self
            .state_machine_data
            .as_ref()
            .map(|d| 8 + d.len() as u64)
            .unwrap_or(0);
        FIXED_SERIALIZED_SIZE + self.payload.len() as u64 + sm
    }

    /// Encode to bincode bytes
    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode bytes
    pub fn decode(bytes: &[u8]) -> crate::Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Decoded entry metadata without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntryHeader {
    pub term_index: TermIndex,
    pub kind: EntryKind,
    pub serialized_size: u64,
}

impl LogEntryHeader {
    pub fn of(entry: &LogEntry) -> Self {
        Self {
            term_index: entry.term_index(),
            kind: entry.kind,
            serialized_size: entry.serialized_size(),
        }
    }

    pub fn index(&self) -> u64 {
        self.term_index.index
    }

    pub fn term(&self) -> u64 {
        self.term_index.term
    }
}
