//! Segment file scan
//!
//! Reads a whole segment file under a corruption policy.

use std::path::Path;

use crate::config::CorruptionPolicy;
use crate::entry::EntryRef;
use crate::error::{Result, SegmentError};
use crate::metrics::SegmentMetrics;
use crate::storage::SegmentStartEnd;

use super::SegmentReader;

/// Scan a segment file from the start, handing each entry to `consumer`.
///
/// The first entry must sit at the segment start and consecutive entries
/// must have consecutive indices. On any read error,
/// [`CorruptionPolicy::Exception`] propagates it while
/// [`CorruptionPolicy::WarnAndReturn`] logs and stops, keeping what was
/// already consumed.
///
/// Returns the number of entries consumed.
pub fn read_segment_file<F>(
    path: &Path,
    start_end: SegmentStartEnd,
    max_entry_size: u64,
    policy: CorruptionPolicy,
    metrics: &dyn SegmentMetrics,
    mut consumer: F,
) -> Result<usize>
where
    F: FnMut(EntryRef),
{
    let mut count = 0usize;
    let scan = scan_entries(path, start_end, max_entry_size, &mut count, &mut consumer);

    metrics.on_entries_read(count as u64);

    match (scan, policy) {
        (Ok(()), _) => Ok(count),
        (Err(e), CorruptionPolicy::Exception) => Err(e),
        (Err(e), CorruptionPolicy::WarnAndReturn) => {
            tracing::warn!(
                path = %path.display(),
                segment = %start_end,
                error = %e,
                "Failed to read segment file: only {} entries read successfully",
                count
            );
            Ok(count)
        }
    }
}

fn scan_entries<F>(
    path: &Path,
    start_end: SegmentStartEnd,
    max_entry_size: u64,
    count: &mut usize,
    consumer: &mut F,
) -> Result<()>
where
    F: FnMut(EntryRef),
{
    let mut reader = SegmentReader::open(path, start_end, max_entry_size)?;
    let mut prev: Option<u64> = None;
    while let Some(next) = reader.next_entry()? {
        match prev {
            None if next.index != start_end.start_index => {
                return Err(SegmentError::Corruption(format!(
                    "First entry {} does not match the segment start {} in {}",
                    next.index,
                    start_end.start_index,
                    path.display()
                )));
            }
            Some(prev) if next.index != prev + 1 => {
                return Err(SegmentError::Corruption(format!(
                    "Gap between entry {} and entry {} in {}",
                    prev,
                    next.index,
                    path.display()
                )));
            }
            _ => {}
        }
        prev = Some(next.index);
        consumer(EntryRef::wrap(next));
        *count += 1;
    }
    Ok(())
}
