//! Segment index
//!
//! Ordered map from log index to the record locating that entry in the
//! segment file.

use std::collections::BTreeMap;

use crate::entry::{LogEntry, LogEntryHeader, TermIndex};

/// Where an entry starts in the segment file, plus its header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    /// Starting offset in the file
    offset: u64,
    header: LogEntryHeader,
}

impl LogRecord {
    pub fn new(offset: u64, entry: &LogEntry) -> Self {
        Self {
            offset,
            header: LogEntryHeader::of(entry),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn header(&self) -> &LogEntryHeader {
        &self.header
    }

    pub fn term_index(&self) -> TermIndex {
        self.header.term_index
    }

    pub fn index(&self) -> u64 {
        self.header.term_index.index
    }
}

/// Contiguous run of records `[start_index, last]`
///
/// Mutations are serialized by the owning segment's lock.
#[derive(Debug)]
pub struct SegmentIndex {
    start_index: u64,
    records: BTreeMap<u64, LogRecord>,
}

impl SegmentIndex {
    pub fn new(start_index: u64) -> Self {
        Self {
            start_index,
            records: BTreeMap::new(),
        }
    }

    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&LogRecord> {
        self.records.values().next()
    }

    pub fn last(&self) -> Option<&LogRecord> {
        self.records.values().next_back()
    }

    pub fn get(&self, index: u64) -> Option<&LogRecord> {
        self.records.get(&index)
    }

    /// Append a record; returns its index.
    ///
    /// # Panics
    ///
    /// Panics unless the record's index is `start_index` (empty index) or
    /// one past the current last index.
    pub fn append(&mut self, record: LogRecord) -> u64 {
        let index = record.index();
        match self.last() {
            None => assert!(
                index == self.start_index,
                "Gap between start index {} and the entry to append {}",
                self.start_index,
                index
            ),
            Some(last) => assert!(
                index == last.index() + 1,
                "Gap between last entry {} and the entry to append {}",
                last.index(),
                index
            ),
        }
        let previous = self.records.insert(index, record);
        assert!(previous.is_none(), "Duplicate record for index {}", index);
        index
    }

    /// Remove and return the last record.
    ///
    /// # Panics
    ///
    /// Panics if the index is empty.
    pub fn remove_last(&mut self) -> LogRecord {
        match self.records.pop_last() {
            Some((_, record)) => record,
            None => panic!("remove_last on an empty segment index"),
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.values()
    }
}
