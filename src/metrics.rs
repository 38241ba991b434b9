//! Metrics collaborator
//!
//! Purely observational hooks. Segments receive a handle through their
//! [`SegmentContext`](crate::segment::SegmentContext); nothing here changes
//! behavior.

use std::sync::atomic::{AtomicU64, Ordering};

/// Receives segment read statistics
pub trait SegmentMetrics: Send + Sync {
    /// A full segment scan was performed to serve a cache miss
    fn on_segment_load(&self) {}

    /// `count` entries were parsed from a segment file
    fn on_entries_read(&self, _count: u64) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl SegmentMetrics for NoopMetrics {}

/// Keeps running totals in atomic counters
#[derive(Debug, Default)]
pub struct CountingMetrics {
    segment_loads: AtomicU64,
    entries_read: AtomicU64,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment_loads(&self) -> u64 {
        self.segment_loads.load(Ordering::Relaxed)
    }

    pub fn entries_read(&self) -> u64 {
        self.entries_read.load(Ordering::Relaxed)
    }
}

impl SegmentMetrics for CountingMetrics {
    fn on_segment_load(&self) {
        self.segment_loads.fetch_add(1, Ordering::Relaxed);
    }

    fn on_entries_read(&self, count: u64) {
        self.entries_read.fetch_add(count, Ordering::Relaxed);
    }
}
