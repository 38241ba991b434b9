//! Segment entry loader
//!
//! Serves a cache miss by scanning the whole segment file once. Every entry
//! passed on the way is put into the content cache, so one scan warms the
//! segment for later point lookups.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::entry::{CacheOp, EntryRef, TermIndex};
use crate::error::{Result, SegmentError};
use crate::storage::SegmentStartEnd;
use crate::wal::read_segment_file;

use super::{EntryContentCache, SegmentContext};

/// Loads entries of one segment from its file
pub struct SegmentEntryLoader {
    context: SegmentContext,
    /// Number of full scans performed
    loading_times: AtomicU64,
}

impl SegmentEntryLoader {
    pub fn new(context: SegmentContext) -> Self {
        Self {
            context,
            loading_times: AtomicU64::new(0),
        }
    }

    /// Scan the file backing `start_end`, filling `cache`, and return the
    /// entry identified by `key`.
    ///
    /// The scan never goes past the segment's end index, even if the file
    /// still holds entries pending truncation. Callers must not run two
    /// loads of the same segment concurrently.
    pub fn load(
        &self,
        key: TermIndex,
        start_end: SegmentStartEnd,
        cache: &EntryContentCache,
    ) -> Result<EntryRef> {
        let file = self.context.storage.segment_file(&start_end);
        let policy = self.context.storage.corruption_policy();

        let mut found: Option<EntryRef> = None;
        let scanned = read_segment_file(
            &file,
            start_end,
            self.context.max_entry_size,
            policy,
            self.context.metrics.as_ref(),
            |entry| {
                let term_index = entry.term_index();
                cache.put(term_index, &entry, CacheOp::LoadSegmentFile);
                if term_index == key {
                    found = Some(entry);
                }
            },
        );

        self.loading_times.fetch_add(1, Ordering::Relaxed);
        self.context.metrics.on_segment_load();

        let count = scanned?;
        tracing::debug!(
            segment = %start_end,
            entries = count,
            target = %key,
            hit = found.is_some(),
            "Loaded segment file into cache"
        );

        found.ok_or_else(|| SegmentError::LogEntryRead {
            term_index: key,
            reason: format!("entry not found in {} ({} entries scanned)", file.display(), count),
        })
    }

    /// Number of full scans performed so far
    pub fn loading_times(&self) -> u64 {
        self.loading_times.load(Ordering::Relaxed)
    }
}
