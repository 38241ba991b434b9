//! Shared helpers for segment tests

#![allow(dead_code)]

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use logsegment::metrics::CountingMetrics;
use logsegment::wal::SegmentWriter;
use logsegment::{
    CorruptionPolicy, EntryKind, EntryRef, LogEntry, SegmentConfig, SegmentContext,
    SegmentDirectory, SegmentStartEnd, SyncStrategy,
};
use tempfile::TempDir;

/// Scratch directory, a context over it, and the metrics it reports to
pub fn setup(policy: CorruptionPolicy) -> (TempDir, SegmentContext, Arc<CountingMetrics>) {
    let temp_dir = TempDir::new().unwrap();
    let config = SegmentConfig::builder()
        .data_dir(temp_dir.path())
        .corruption_policy(policy)
        .sync_strategy(SyncStrategy::EveryWrite) // Sync every write for test reliability
        .build();
    let metrics = Arc::new(CountingMetrics::new());
    let context = SegmentContext::from_directory(SegmentDirectory::open(config).unwrap())
        .with_metrics(metrics.clone());
    (temp_dir, context, metrics)
}

pub fn entry(term: u64, index: u64) -> LogEntry {
    LogEntry::new(term, index, EntryKind::Normal, format!("payload-{}", index))
}

pub fn entry_ref(term: u64, index: u64) -> EntryRef {
    EntryRef::wrap(entry(term, index))
}

pub fn segment_path(dir: &Path, start_end: SegmentStartEnd) -> PathBuf {
    start_end.file_in(dir)
}

/// Write entries with the segment writer; returns the final file position
pub fn write_segment(path: &Path, entries: impl IntoIterator<Item = LogEntry>) -> u64 {
    let mut writer = SegmentWriter::open(path, SyncStrategy::EveryWrite).unwrap();
    for entry in entries {
        writer.write_entry(&entry).unwrap();
    }
    writer.sync().unwrap();
    writer.position()
}

/// Entries `start..=end`, all in `term`
pub fn entries(term: u64, start: u64, end: u64) -> Vec<LogEntry> {
    (start..=end).map(|i| entry(term, i)).collect()
}

/// Cut `bytes` off the end of a file (simulates a torn write)
pub fn chop(path: &Path, bytes: u64) {
    let file = OpenOptions::new().write(true).open(path).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len - bytes).unwrap();
}

pub fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}
