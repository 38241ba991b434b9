//! Storage Module
//!
//! Where segment files live and how they are read.
//!
//! ## Responsibilities
//! - Map a segment's `(start, end, open)` to its file path
//! - Provide the configured corruption policy
//! - Discover existing segment files on startup
//!
//! ## File Naming
//! ```text
//! {data_dir}/
//!   ├── log_0-99             closed segment [0, 99]
//!   ├── log_100-180          closed segment [100, 180]
//!   └── log_inprogress_181   open segment starting at 181
//! ```

mod directory;
mod start_end;

use std::path::PathBuf;

use crate::config::CorruptionPolicy;

pub use directory::SegmentDirectory;
pub use start_end::SegmentStartEnd;

/// Resolves segment files and the policy for reading them
pub trait SegmentStorage: Send + Sync {
    /// Path of the file backing the described segment
    fn segment_file(&self, start_end: &SegmentStartEnd) -> PathBuf;

    /// Policy applied when a segment file is malformed
    fn corruption_policy(&self) -> CorruptionPolicy;
}
