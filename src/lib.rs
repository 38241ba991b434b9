//! # logsegment
//!
//! In-memory core of one segment of a replicated write-ahead log:
//! - Durable-offset index of every entry in the segment
//! - Independently evictable cache of decoded, reference-counted entries
//! - Appends, point lookups and range truncation
//! - Reconstruction from disk with configurable corruption tolerance
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Log manager (external)                     │
//! │        picks the segment, writes and flushes bytes          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Segment                              │
//! │          append / lookup / truncate / close / clear         │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//!  ┌────────────┐      ┌────────────────┐     ┌────────────────┐
//!  │SegmentIndex│      │ EntryContent   │◄────│ SegmentEntry   │
//!  │ (offsets)  │      │ Cache (Mutex)  │     │ Loader (scan)  │
//!  └────────────┘      └────────────────┘     └───────┬────────┘
//!                                                     │
//!                                             ┌───────▼────────┐
//!                                             │ Segment file   │
//!                                             │ (wal reader)   │
//!                                             └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod metrics;

pub mod entry;
pub mod wal;
pub mod storage;
pub mod segment;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{CorruptionPolicy, SegmentConfig, SyncStrategy};
pub use entry::{entry_size, CacheOp, EntryKind, EntryRef, LogEntry, ReferenceCounted, TermIndex};
pub use error::{Result, SegmentError};
pub use segment::{find_segment, Segment, SegmentContext};
pub use storage::{SegmentDirectory, SegmentStartEnd, SegmentStorage};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of logsegment
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
