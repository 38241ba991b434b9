//! Log segment
//!
//! The in-memory side of one segment file: its index, its entry cache and
//! the bookkeeping that keeps the two consistent with the bytes on disk.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};

use crate::entry::{entry_size, CacheOp, EntryRef, TermIndex};
use crate::error::{Result, SegmentError};
use crate::storage::SegmentStartEnd;
use crate::wal::HEADER_SIZE;

use super::{EntryContentCache, EntrySink, LogRecord, SegmentContext, SegmentEntryLoader, SegmentIndex};

/// Mutable state, guarded as one unit so readers never see a half-applied
/// append or truncation
pub(super) struct SegmentState {
    pub(super) is_open: bool,
    /// One past the end index
    pub(super) next_index: u64,
    /// Offset the next entry will be written at
    pub(super) total_file_size: u64,
    pub(super) index: SegmentIndex,
}

/// In-memory representation of one segment file
///
/// ## Concurrency:
/// - The owning log is expected to guard segments with its own read-write
///   lock; the locks here keep a segment consistent on their own as well
/// - `state`: RwLock over index, end index, open flag and file size
/// - `cache`: its own Mutex, so lookups never wait on `state`
/// - `load_lock`: at most one file scan at a time; also held by truncate and
///   clear so they never interleave with a scan
pub struct Segment {
    /// First index, inclusive (immutable)
    start_index: u64,
    pub(super) state: RwLock<SegmentState>,
    pub(super) cache: EntryContentCache,
    loader: SegmentEntryLoader,
    load_lock: Mutex<()>,
    context: SegmentContext,
}

impl Segment {
    /// Create an empty open segment for the active writer
    pub fn new_open_segment(context: SegmentContext, start_index: u64) -> Self {
        Self::with_state(context, true, start_index, start_index)
    }

    /// Create a closed segment covering `[start_index, end_index]` with no
    /// records yet
    ///
    /// # Panics
    ///
    /// Panics if `end_index < start_index`.
    pub fn new_closed_segment(context: SegmentContext, start_index: u64, end_index: u64) -> Self {
        assert!(
            end_index >= start_index,
            "Closed segment end {} is before its start {}",
            end_index,
            start_index
        );
        Self::with_state(context, false, start_index, end_index + 1)
    }

    /// Create an empty segment shaped like `start_end`
    pub fn new_segment(context: SegmentContext, start_end: SegmentStartEnd) -> Self {
        if start_end.is_open {
            Self::new_open_segment(context, start_end.start_index)
        } else {
            Self::new_closed_segment(context, start_end.start_index, start_end.end_index)
        }
    }

    fn with_state(context: SegmentContext, is_open: bool, start_index: u64, next_index: u64) -> Self {
        Self {
            start_index,
            state: RwLock::new(SegmentState {
                is_open,
                next_index,
                total_file_size: HEADER_SIZE,
                index: SegmentIndex::new(start_index),
            }),
            cache: EntryContentCache::new(),
            loader: SegmentEntryLoader::new(context.clone()),
            load_lock: Mutex::new(()),
            context,
        }
    }

    // =========================================================================
    // Appends
    // =========================================================================

    /// Append an entry to this open segment, keeping it in the cache.
    ///
    /// Only offsets and sizes are tracked here; the bytes are written to the
    /// file by the caller, in the same order.
    ///
    /// # Panics
    ///
    /// Panics if the segment is closed or the entry does not directly follow
    /// the current end index.
    pub fn append_to_open_segment(&self, op: CacheOp, entry: &EntryRef) {
        self.append_to_open_segment_with(op, entry, None);
    }

    /// Like [`append_to_open_segment`](Self::append_to_open_segment), also
    /// forwarding the entry to `sink`
    pub fn append_to_open_segment_with(
        &self,
        op: CacheOp,
        entry: &EntryRef,
        sink: Option<&mut dyn EntrySink>,
    ) {
        assert!(self.is_open(), "The log segment {} is not open for append", self);
        self.append(op, entry, true, sink);
    }

    pub(super) fn append(
        &self,
        op: CacheOp,
        entry: &EntryRef,
        keep_entry_in_cache: bool,
        sink: Option<&mut dyn EntrySink>,
    ) {
        let mut state = self.state.write();
        let record = LogRecord::new(state.total_file_size, entry);
        let index = state.index.append(record);
        if keep_entry_in_cache {
            self.cache.put(record.term_index(), entry, op);
        }
        state.total_file_size += entry_size(entry, op);
        state.next_index = index + 1;

        if let Some(sink) = sink {
            sink.accept(entry);
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cached entry for `term_index`; never touches the file
    pub fn get_entry_from_cache(&self, term_index: &TermIndex) -> Option<EntryRef> {
        self.cache.get(term_index)
    }

    /// Cached entry for `term_index`, loading the whole segment file into the
    /// cache on a miss.
    ///
    /// Concurrent callers are serialized; a caller that waited for another's
    /// scan finds the entry already cached.
    pub fn load_cache(&self, term_index: TermIndex) -> Result<EntryRef> {
        let _load_guard = self.load_lock.lock();

        if let Some(entry) = self.cache.get(&term_index) {
            return Ok(entry);
        }
        if !self.contains_index(term_index.index) {
            return Err(SegmentError::LogEntryRead {
                term_index,
                reason: format!("index is outside segment {}", self),
            });
        }

        self.loader
            .load(term_index, self.start_end(), &self.cache)
            .map_err(|e| match e {
                e @ SegmentError::LogEntryRead { .. } => e,
                other => SegmentError::LogEntryRead {
                    term_index,
                    reason: format!("failed to load segment {}: {}", self, other),
                },
            })
    }

    pub fn log_record(&self, index: u64) -> Option<LogRecord> {
        self.state.read().index.get(index).copied()
    }

    /// All records in ascending index order
    pub fn log_records(&self) -> Vec<LogRecord> {
        self.state.read().index.iter().copied().collect()
    }

    pub fn last_term_index(&self) -> Option<TermIndex> {
        self.state.read().index.last().map(LogRecord::term_index)
    }

    // =========================================================================
    // Truncation & Lifecycle
    // =========================================================================

    /// Remove the records from `from_index` (inclusive) to the end and close
    /// the segment.
    ///
    /// Records are removed last to first, releasing their cache entries and
    /// rewinding the file size to where the first removed entry started.
    ///
    /// # Panics
    ///
    /// Panics if `from_index` is outside `[start_index, end_index]`.
    pub fn truncate(&self, from_index: u64) {
        let _load_guard = self.load_lock.lock();
        let mut state = self.state.write();
        assert!(
            from_index >= self.start_index && from_index < state.next_index,
            "Truncate index {} is outside segment [{}, {})",
            from_index,
            self.start_index,
            state.next_index
        );

        for index in (from_index..state.next_index).rev() {
            let removed = state.index.remove_last();
            assert_eq!(index, removed.index(), "removedIndex");
            self.cache.remove(&removed.term_index());
            state.total_file_size = removed.offset();
        }
        state.is_open = false;
        state.next_index = from_index;

        tracing::debug!(
            segment = %self.start_index,
            from_index,
            total_file_size = state.total_file_size,
            "Truncated segment"
        );
    }

    /// Seal the segment boundary
    ///
    /// # Panics
    ///
    /// Panics if the segment is not open.
    pub fn close(&self) {
        let mut state = self.state.write();
        assert!(state.is_open, "Closing segment {} which is not open", self.start_index);
        state.is_open = false;
    }

    /// Drop all records and permanently close the cache
    pub fn clear(&self) {
        let _load_guard = self.load_lock.lock();
        let mut state = self.state.write();
        state.index.clear();
        self.cache.close();
        state.next_index = self.start_index;
    }

    /// Drop cached entries; records stay and entries reload on demand
    pub fn evict_cache(&self) {
        self.cache.evict();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    /// Last index, inclusive; `None` while the segment holds nothing
    pub fn end_index(&self) -> Option<u64> {
        let next = self.state.read().next_index;
        (next > self.start_index).then(|| next - 1)
    }

    pub fn is_open(&self) -> bool {
        self.state.read().is_open
    }

    pub fn num_entries(&self) -> u64 {
        self.state.read().next_index - self.start_index
    }

    pub fn has_entries(&self) -> bool {
        self.num_entries() > 0
    }

    /// Whether `start_index <= index <= end_index`
    pub fn contains_index(&self, index: u64) -> bool {
        index >= self.start_index && index < self.state.read().next_index
    }

    /// Position of this segment relative to `index`: `Less` if the segment
    /// ends before it, `Greater` if it starts after it, `Equal` if it
    /// contains it
    pub fn compare_to_index(&self, index: u64) -> Ordering {
        if self.contains_index(index) {
            Ordering::Equal
        } else if self.state.read().next_index <= index {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// Whether entry content is cheap to get: always for an open segment,
    /// otherwise only while something is cached
    pub fn has_cache(&self) -> bool {
        self.is_open() || self.cache.size() > 0
    }

    /// Offset the next entry will be written at
    pub fn total_file_size(&self) -> u64 {
        self.state.read().total_file_size
    }

    /// Bytes held by the entry cache
    pub fn total_cache_size(&self) -> u64 {
        self.cache.size()
    }

    /// Number of cached entries
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Number of full file scans performed for cache misses
    pub fn loading_times(&self) -> u64 {
        self.loader.loading_times()
    }

    pub fn start_end(&self) -> SegmentStartEnd {
        let state = self.state.read();
        if state.is_open {
            SegmentStartEnd::open(self.start_index)
        } else {
            SegmentStartEnd::closed(self.start_index, state.next_index.saturating_sub(1))
        }
    }

    /// Path of the file backing this segment in its current state
    pub fn file_path(&self) -> PathBuf {
        self.context.storage.segment_file(&self.start_end())
    }

    pub fn context(&self) -> &SegmentContext {
        &self.context
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        if state.is_open {
            write!(f, "log_inprogress_{}", self.start_index)
        } else {
            write!(f, "log-{}_{}", self.start_index, state.next_index as i128 - 1)
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Segment")
            .field("start_index", &self.start_index)
            .field("next_index", &state.next_index)
            .field("is_open", &state.is_open)
            .field("records", &state.index.len())
            .field("total_file_size", &state.total_file_size)
            .field("cache_size", &self.cache.size())
            .finish()
    }
}
