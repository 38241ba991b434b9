//! Segment reconstruction
//!
//! Rebuilds a segment from an existing file on startup and reconciles the
//! file with what could actually be read.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use crate::entry::CacheOp;
use crate::error::{Result, SegmentError};
use crate::storage::SegmentStartEnd;
use crate::wal::read_segment_file;

use super::{EntrySink, Segment, SegmentContext};

impl Segment {
    /// Reconstruct the segment stored in `file`.
    ///
    /// Entries are cached when the segment is open or `keep_entry_in_cache`
    /// is set, and forwarded to `sink` in order. Malformed data is handled
    /// per the storage's corruption policy.
    ///
    /// Afterwards:
    /// 1. No entries read: the file is deleted and `None` is returned
    /// 2. File longer than the entries read: the excess is truncated
    /// 3. Start, count and end must agree with the records, unless a
    ///    tolerated corruption shortened the segment
    pub fn load_segment(
        context: SegmentContext,
        file: &Path,
        start_end: SegmentStartEnd,
        keep_entry_in_cache: bool,
        mut sink: Option<&mut dyn EntrySink>,
    ) -> Result<Option<Segment>> {
        let segment = Segment::new_segment(context.clone(), start_end);
        let policy = context.storage.corruption_policy();
        let is_open = start_end.is_open;
        let keep = keep_entry_in_cache || is_open;

        let entry_count = read_segment_file(
            file,
            start_end,
            context.max_entry_size,
            policy,
            context.metrics.as_ref(),
            |entry| {
                let sink = sink.as_mut().map(|s| &mut **s as &mut dyn EntrySink);
                segment.append(CacheOp::LoadSegmentFile, &entry, keep, sink);
            },
        )? as u64;
        tracing::info!(
            "Successfully read {} entries from segment file {}",
            entry_count,
            file.display()
        );

        let start = start_end.start_index;
        let end = if is_open {
            segment.end_index()
        } else {
            Some(start_end.end_index)
        };
        let expected_entry_count = end.map_or(0, |end| end + 1 - start);
        let corrupted = entry_count != expected_entry_count;
        if corrupted {
            tracing::warn!(
                "Segment file is corrupted: expected to have {} entries but only {} entries read successfully",
                expected_entry_count,
                entry_count
            );
        }

        if entry_count == 0 {
            match fs::remove_file(file) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            tracing::info!(
                segment = %start_end,
                path = %file.display(),
                "Deleted segment file since entry count is zero"
            );
            return Ok(None);
        }

        let file_len = fs::metadata(file)?.len();
        let total_file_size = segment.total_file_size();
        if file_len > total_file_size {
            OpenOptions::new().write(true).open(file)?.set_len(total_file_size)?;
            tracing::debug!(
                path = %file.display(),
                from = file_len,
                to = total_file_size,
                "Truncated segment file padding"
            );
        }

        segment
            .assert_segment(start, entry_count, corrupted, end)
            .map_err(|reason| {
                SegmentError::InconsistentSegment(format!(
                    "Failed to read segment file {}: {}",
                    file.display(),
                    reason
                ))
            })?;
        Ok(Some(segment))
    }

    fn assert_segment(
        &self,
        expected_start: u64,
        expected_entry_count: u64,
        corrupted: bool,
        expected_end: Option<u64>,
    ) -> std::result::Result<(), String> {
        fn same<T: PartialEq + std::fmt::Debug>(expected: T, actual: T, what: &str) -> std::result::Result<(), String> {
            if expected == actual {
                Ok(())
            } else {
                Err(format!("{}: expected {:?} but was {:?}", what, expected, actual))
            }
        }

        let state = self.state.read();
        same(expected_start, self.start_index(), "Segment start index")?;
        same(expected_entry_count, state.index.len() as u64, "Number of records")?;

        let expected_last_index = expected_start + expected_entry_count - 1;
        same(expected_last_index + 1, state.next_index, "Segment end index + 1")?;

        if let Some(last) = state.index.last() {
            same(expected_last_index, last.index(), "Index at the last record")?;
            let first = state
                .index
                .first()
                .ok_or_else(|| "Missing first record".to_string())?;
            same(expected_start, first.index(), "Index at the first record")?;
        }
        if !corrupted {
            same(expected_end, Some(expected_last_index), "End/last index")?;
        }
        Ok(())
    }
}
