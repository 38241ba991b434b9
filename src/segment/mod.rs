//! Segment Module
//!
//! In-memory representation of one log segment file.
//!
//! ## Responsibilities
//! - Index every entry's file offset (`SegmentIndex`)
//! - Cache decoded entries, evictable independently of the index
//!   (`EntryContentCache`)
//! - Reload the whole file into the cache on a miss (`SegmentEntryLoader`)
//! - Appends, truncation, lifecycle and reconstruction from disk (`Segment`)
//!
//! ## Lifecycle
//! ```text
//!   new_open_segment ──► Open ──close()/truncate()──► Closed
//!   load_segment / new_closed_segment ───────────────► Closed
//!   Open | Closed ──clear()──► Cleared (no records, cache unusable)
//! ```

mod cache;
mod index;
mod load;
mod loader;
mod log_segment;
mod sink;

use std::borrow::Borrow;
use std::sync::Arc;

use crate::metrics::{NoopMetrics, SegmentMetrics};
use crate::storage::{SegmentDirectory, SegmentStorage};

pub use cache::EntryContentCache;
pub use index::{LogRecord, SegmentIndex};
pub use loader::SegmentEntryLoader;
pub use log_segment::Segment;
pub use sink::{ChannelSink, EntrySink};

/// Default largest serialized entry accepted by the reader (32 MB)
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 32 * 1024 * 1024;

/// Collaborators a segment needs, handed over at construction
#[derive(Clone)]
pub struct SegmentContext {
    /// Resolves segment files and the corruption policy
    pub storage: Arc<dyn SegmentStorage>,
    /// Receives load statistics
    pub metrics: Arc<dyn SegmentMetrics>,
    /// Largest serialized entry the reader accepts
    pub max_entry_size: u64,
}

impl SegmentContext {
    pub fn new(storage: Arc<dyn SegmentStorage>) -> Self {
        Self {
            storage,
            metrics: Arc::new(NoopMetrics),
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }

    /// Context backed by a segment directory, taking the entry size limit
    /// from its config
    pub fn from_directory(directory: SegmentDirectory) -> Self {
        let max_entry_size = directory.config().max_entry_size;
        Self::new(Arc::new(directory)).with_max_entry_size(max_entry_size)
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn SegmentMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_max_entry_size(mut self, size: u64) -> Self {
        self.max_entry_size = size;
        self
    }
}

/// Position of the segment containing `index` in `segments`, which must be
/// sorted by start index and non-overlapping
pub fn find_segment<S: Borrow<Segment>>(segments: &[S], index: u64) -> Option<usize> {
    segments
        .binary_search_by(|segment| segment.borrow().compare_to_index(index))
        .ok()
}
