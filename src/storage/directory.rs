//! Segment Directory
//!
//! Config-backed segment storage rooted at one directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CorruptionPolicy, SegmentConfig};
use crate::error::Result;

use super::{SegmentStartEnd, SegmentStorage};

/// Segment files living side by side in `config.data_dir`
#[derive(Debug, Clone)]
pub struct SegmentDirectory {
    config: SegmentConfig,
}

impl SegmentDirectory {
    /// Open the directory, creating it if needed
    pub fn open(config: SegmentConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Discover existing segment files, ordered by start index
    pub fn list_segments(&self) -> Result<Vec<(SegmentStartEnd, PathBuf)>> {
        let mut segments = Vec::new();
        for entry in fs::read_dir(&self.config.data_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(start_end) = SegmentStartEnd::from_path(&path) {
                segments.push((start_end, path));
            }
        }
        segments.sort_by_key(|(start_end, _)| start_end.start_index);
        Ok(segments)
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }
}

impl SegmentStorage for SegmentDirectory {
    fn segment_file(&self, start_end: &SegmentStartEnd) -> PathBuf {
        start_end.file_in(&self.config.data_dir)
    }

    fn corruption_policy(&self) -> CorruptionPolicy {
        self.config.corruption_policy
    }
}
