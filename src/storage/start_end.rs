//! Segment start/end descriptor
//!
//! Identifies a segment file by its index range and open state.

use std::fmt;
use std::path::{Path, PathBuf};

/// Index range and open state of a segment, as encoded in its file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentStartEnd {
    /// First index, inclusive
    pub start_index: u64,
    /// Last index, inclusive. Ignored for open segments.
    pub end_index: u64,
    pub is_open: bool,
}

impl SegmentStartEnd {
    const OPEN_PREFIX: &'static str = "log_inprogress_";
    const CLOSED_PREFIX: &'static str = "log_";

    pub fn open(start_index: u64) -> Self {
        Self {
            start_index,
            end_index: start_index,
            is_open: true,
        }
    }

    pub fn closed(start_index: u64, end_index: u64) -> Self {
        Self {
            start_index,
            end_index,
            is_open: false,
        }
    }

    pub fn new(start_index: u64, end_index: u64, is_open: bool) -> Self {
        Self {
            start_index,
            end_index,
            is_open,
        }
    }

    /// File name for this segment
    /// open → "log_inprogress_5", closed → "log_5-9"
    pub fn file_name(&self) -> String {
        if self.is_open {
            format!("{}{}", Self::OPEN_PREFIX, self.start_index)
        } else {
            format!("{}{}-{}", Self::CLOSED_PREFIX, self.start_index, self.end_index)
        }
    }

    /// Path of this segment's file inside `dir`
    pub fn file_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// Parse a segment file name
    /// "log_inprogress_5" → open(5), "log_5-9" → closed(5, 9)
    pub fn parse(file_name: &str) -> Option<Self> {
        if let Some(start) = file_name.strip_prefix(Self::OPEN_PREFIX) {
            return start.parse().ok().map(Self::open);
        }
        let range = file_name.strip_prefix(Self::CLOSED_PREFIX)?;
        let (start, end) = range.split_once('-')?;
        let start: u64 = start.parse().ok()?;
        let end: u64 = end.parse().ok()?;
        (end >= start).then(|| Self::closed(start, end))
    }

    /// Parse the file name component of `path`
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::parse(&path.file_name()?.to_string_lossy())
    }
}

impl fmt::Display for SegmentStartEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
