//! Tests for Segment
//!
//! These tests verify:
//! - Appends track offsets, sizes and the cache
//! - Truncation rewinds records, cache and file size
//! - close/clear/evict lifecycle
//! - Ordering against indices and segment lookup
//! - Entry sinks see entries in log order

mod common;

use std::cmp::Ordering;

use common::{entry_ref, setup};
use crossbeam::channel;
use logsegment::segment::ChannelSink;
use logsegment::wal::HEADER_SIZE;
use logsegment::{
    entry_size, find_segment, CacheOp, CorruptionPolicy, EntryKind, EntryRef, LogEntry, Segment,
    TermIndex,
};

fn open_with(context: logsegment::SegmentContext, start: u64, end: u64) -> (Segment, Vec<EntryRef>) {
    let segment = Segment::new_open_segment(context, start);
    let entries: Vec<EntryRef> = (start..=end).map(|i| entry_ref(1, i)).collect();
    for entry in &entries {
        segment.append_to_open_segment(CacheOp::WriteCacheWithStateMachineCache, entry);
    }
    (segment, entries)
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_new_open_segment_is_empty() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 5);

    assert!(segment.is_open());
    assert_eq!(segment.start_index(), 5);
    assert_eq!(segment.end_index(), None);
    assert_eq!(segment.num_entries(), 0);
    assert!(!segment.has_entries());
    assert_eq!(segment.total_file_size(), HEADER_SIZE);
    assert_eq!(segment.total_cache_size(), 0);
    assert!(segment.last_term_index().is_none());
    assert!(segment.has_cache());
}

#[test]
fn test_open_segment_at_zero_has_no_end() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 0);

    assert_eq!(segment.end_index(), None);
    assert!(!segment.contains_index(0));
    assert_eq!(segment.to_string(), "log_inprogress_0");
}

#[test]
fn test_new_closed_segment() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_closed_segment(context, 1, 3);

    assert!(!segment.is_open());
    assert_eq!(segment.end_index(), Some(3));
    assert_eq!(segment.num_entries(), 3);
    assert!(segment.contains_index(1));
    assert!(segment.contains_index(3));
    assert!(!segment.contains_index(4));
    assert_eq!(segment.to_string(), "log-1_3");
    assert!(!segment.has_cache());
}

#[test]
#[should_panic(expected = "is before its start")]
fn test_closed_segment_end_before_start_panics() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    Segment::new_closed_segment(context, 5, 4);
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_append_tracks_offsets_and_sizes() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, entries) = open_with(context, 5, 7);

    assert_eq!(segment.start_index(), 5);
    assert_eq!(segment.end_index(), Some(7));
    assert_eq!(segment.num_entries(), 3);

    let mut offset = HEADER_SIZE;
    for (record, entry) in segment.log_records().iter().zip(&entries) {
        assert_eq!(record.offset(), offset);
        assert_eq!(record.term_index(), entry.term_index());
        offset += entry_size(entry, CacheOp::LoadSegmentFile);
    }
    assert_eq!(segment.total_file_size(), offset);
    assert_eq!(segment.total_cache_size(), offset - HEADER_SIZE);
    assert_eq!(segment.last_term_index(), Some(TermIndex::new(1, 7)));
}

#[test]
fn test_append_caches_shared_entry() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, entries) = open_with(context, 1, 3);

    for entry in &entries {
        // Caller + cache
        assert_eq!(entry.ref_count(), 2);
        let cached = segment.get_entry_from_cache(&entry.term_index()).unwrap();
        assert!(EntryRef::ptr_eq(entry, &cached));
    }
    assert_eq!(segment.cached_entries(), 3);
}

#[test]
fn test_append_keeps_state_machine_data_for_lenient_op() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 1);
    let entry = EntryRef::wrap(
        LogEntry::new(1, 1, EntryKind::Normal, "op").with_state_machine_data(vec![9u8; 64]),
    );

    segment.append_to_open_segment(CacheOp::WriteCacheWithoutStateMachineCache, &entry);

    assert_eq!(segment.end_index(), Some(1));
    assert_eq!(
        segment.total_file_size(),
        HEADER_SIZE + entry_size(&entry, CacheOp::WriteCacheWithoutStateMachineCache)
    );
}

#[test]
#[should_panic(expected = "is not open for append")]
fn test_append_to_closed_segment_panics() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, _entries) = open_with(context, 1, 2);
    segment.close();

    segment.append_to_open_segment(CacheOp::WriteCacheWithStateMachineCache, &entry_ref(1, 3));
}

#[test]
#[should_panic(expected = "Gap between last entry")]
fn test_append_with_gap_panics() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, _entries) = open_with(context, 1, 2);

    segment.append_to_open_segment(CacheOp::WriteCacheWithStateMachineCache, &entry_ref(1, 4));
}

#[test]
#[should_panic(expected = "Gap between start index")]
fn test_first_append_must_match_start() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 10);

    segment.append_to_open_segment(CacheOp::WriteCacheWithStateMachineCache, &entry_ref(1, 11));
}

#[test]
#[should_panic(expected = "Unexpected entry with state machine data")]
fn test_append_rejects_state_machine_data_for_cached_op() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 1);
    let entry = EntryRef::wrap(
        LogEntry::new(1, 1, EntryKind::Normal, "op").with_state_machine_data("blob"),
    );

    segment.append_to_open_segment(CacheOp::WriteCacheWithStateMachineCache, &entry);
}

// =============================================================================
// Truncate Tests
// =============================================================================

#[test]
fn test_truncate_middle() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, entries) = open_with(context, 5, 7);
    let offset_of_6 = segment.log_record(6).unwrap().offset();

    segment.truncate(6);

    assert!(!segment.is_open());
    assert_eq!(segment.end_index(), Some(5));
    assert_eq!(segment.num_entries(), 1);
    assert_eq!(segment.total_file_size(), offset_of_6);
    assert!(segment.log_record(6).is_none());
    assert!(segment.log_record(7).is_none());

    // Cache references of removed entries are released
    assert_eq!(entries[0].ref_count(), 2);
    assert_eq!(entries[1].ref_count(), 1);
    assert_eq!(entries[2].ref_count(), 1);
    assert_eq!(
        segment.total_cache_size(),
        entry_size(&entries[0], CacheOp::LoadSegmentFile)
    );
    assert_eq!(segment.to_string(), "log-5_5");
}

#[test]
fn test_truncate_everything() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, entries) = open_with(context, 5, 7);

    segment.truncate(5);

    assert!(!segment.is_open());
    assert_eq!(segment.end_index(), None);
    assert_eq!(segment.num_entries(), 0);
    assert_eq!(segment.total_file_size(), HEADER_SIZE);
    assert_eq!(segment.total_cache_size(), 0);
    assert!(entries.iter().all(|e| e.ref_count() == 1));
    assert_eq!(segment.to_string(), "log-5_4");
}

#[test]
fn test_truncate_last_entry() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, _entries) = open_with(context, 1, 3);

    segment.truncate(3);

    assert_eq!(segment.end_index(), Some(2));
    assert_eq!(segment.last_term_index(), Some(TermIndex::new(1, 2)));
}

#[test]
#[should_panic(expected = "Truncate index 8 is outside segment")]
fn test_truncate_past_end_panics() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, _entries) = open_with(context, 5, 7);
    segment.truncate(8);
}

#[test]
#[should_panic(expected = "Truncate index 4 is outside segment")]
fn test_truncate_before_start_panics() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, _entries) = open_with(context, 5, 7);
    segment.truncate(4);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_close_keeps_records() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, _entries) = open_with(context, 1, 3);

    segment.close();

    assert!(!segment.is_open());
    assert_eq!(segment.end_index(), Some(3));
    assert_eq!(segment.log_records().len(), 3);
    assert_eq!(segment.to_string(), "log-1_3");
}

#[test]
#[should_panic(expected = "which is not open")]
fn test_close_twice_panics() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, _entries) = open_with(context, 1, 3);
    segment.close();
    segment.close();
}

#[test]
fn test_clear_releases_everything() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, entries) = open_with(context, 1, 3);

    segment.clear();

    assert_eq!(segment.num_entries(), 0);
    assert_eq!(segment.end_index(), None);
    assert!(segment.log_records().is_empty());
    assert_eq!(segment.total_cache_size(), 0);
    assert!(entries.iter().all(|e| e.ref_count() == 1));
    assert!(segment.get_entry_from_cache(&TermIndex::new(1, 1)).is_none());
}

#[test]
fn test_evict_cache_keeps_records() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, entries) = open_with(context, 1, 3);
    segment.close();
    assert!(segment.has_cache());

    segment.evict_cache();

    assert_eq!(segment.total_cache_size(), 0);
    assert_eq!(segment.cached_entries(), 0);
    assert_eq!(segment.log_records().len(), 3);
    assert!(segment.get_entry_from_cache(&entries[0].term_index()).is_none());
    assert!(entries.iter().all(|e| e.ref_count() == 1));
    assert!(!segment.has_cache());
}

#[test]
fn test_open_segment_always_has_cache() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (segment, _entries) = open_with(context, 1, 3);

    segment.evict_cache();

    assert!(segment.has_cache());
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_compare_to_index() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_closed_segment(context, 10, 19);

    assert_eq!(segment.compare_to_index(9), Ordering::Greater);
    assert_eq!(segment.compare_to_index(10), Ordering::Equal);
    assert_eq!(segment.compare_to_index(19), Ordering::Equal);
    assert_eq!(segment.compare_to_index(20), Ordering::Less);
}

#[test]
fn test_empty_segment_compares_by_start() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 10);

    assert_eq!(segment.compare_to_index(9), Ordering::Greater);
    assert_eq!(segment.compare_to_index(10), Ordering::Less);
}

#[test]
fn test_find_segment() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let (open, _entries) = open_with(context.clone(), 20, 22);
    let segments = vec![
        Segment::new_closed_segment(context.clone(), 0, 9),
        Segment::new_closed_segment(context, 10, 19),
        open,
    ];

    assert_eq!(find_segment(&segments, 0), Some(0));
    assert_eq!(find_segment(&segments, 9), Some(0));
    assert_eq!(find_segment(&segments, 10), Some(1));
    assert_eq!(find_segment(&segments, 21), Some(2));
    assert_eq!(find_segment(&segments, 23), None);
}

// =============================================================================
// Sink Tests
// =============================================================================

#[test]
fn test_closure_sink_sees_appends_in_order() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 1);
    let mut seen = Vec::new();

    {
        let mut sink = |e: &LogEntry| seen.push(e.index);
        for i in 1..=4 {
            segment.append_to_open_segment_with(
                CacheOp::WriteCacheWithStateMachineCache,
                &entry_ref(1, i),
                Some(&mut sink),
            );
        }
    }

    assert_eq!(seen, vec![1, 2, 3, 4]);
}

#[test]
fn test_channel_sink() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 1);
    let (tx, rx) = channel::unbounded();
    let mut sink = ChannelSink::new(tx);

    for i in 1..=3 {
        segment.append_to_open_segment_with(
            CacheOp::WriteCacheWithStateMachineCache,
            &entry_ref(2, i),
            Some(&mut sink),
        );
    }
    drop(sink);

    let received: Vec<TermIndex> = rx.iter().map(|e| e.term_index()).collect();
    assert_eq!(
        received,
        vec![TermIndex::new(2, 1), TermIndex::new(2, 2), TermIndex::new(2, 3)]
    );
}

#[test]
fn test_channel_sink_disconnected_does_not_panic() {
    let (_dir, context, _) = setup(CorruptionPolicy::Exception);
    let segment = Segment::new_open_segment(context, 1);
    let (tx, rx) = channel::unbounded();
    drop(rx);
    let mut sink = ChannelSink::new(tx);

    segment.append_to_open_segment_with(
        CacheOp::WriteCacheWithStateMachineCache,
        &entry_ref(1, 1),
        Some(&mut sink),
    );

    assert_eq!(segment.end_index(), Some(1));
}
