//! Configuration for logsegment
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SegmentError;
use crate::segment::DEFAULT_MAX_ENTRY_SIZE;

/// Main configuration for segment storage
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the segment files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── log_<start>-<end>      (closed segments)
    ///     └── log_inprogress_<start> (the open segment)
    pub data_dir: PathBuf,

    /// What to do when a segment file turns out to be malformed
    pub corruption_policy: CorruptionPolicy,

    /// Largest serialized entry the reader accepts (in bytes)
    pub max_entry_size: u64,

    // -------------------------------------------------------------------------
    // Writer Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often the segment writer fsyncs
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Keep entries of reconstructed closed segments in the content cache.
    /// Open segments are always cached.
    pub keep_entry_in_cache: bool,
}

/// Behavior when reading a segment file hits malformed data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptionPolicy {
    /// Propagate the error; reconstruction fails
    #[default]
    Exception,

    /// Log a warning and keep the valid prefix read so far
    WarnAndReturn,
}

impl fmt::Display for CorruptionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptionPolicy::Exception => write!(f, "exception"),
            CorruptionPolicy::WarnAndReturn => write!(f, "warn_and_return"),
        }
    }
}

impl FromStr for CorruptionPolicy {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exception" | "strict" => Ok(CorruptionPolicy::Exception),
            "warn_and_return" | "tolerant" => Ok(CorruptionPolicy::WarnAndReturn),
            other => Err(SegmentError::Config(format!(
                "Unknown corruption policy: {}",
                other
            ))),
        }
    }
}

/// Segment writer sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./logsegment_data"),
            corruption_policy: CorruptionPolicy::Exception,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            keep_entry_in_cache: false,
        }
    }
}

impl SegmentConfig {
    /// Create a new config builder
    pub fn builder() -> SegmentConfigBuilder {
        SegmentConfigBuilder::default()
    }
}

/// Builder for SegmentConfig
#[derive(Default)]
pub struct SegmentConfigBuilder {
    config: SegmentConfig,
}

impl SegmentConfigBuilder {
    /// Set the directory holding segment files
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the corruption policy
    pub fn corruption_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.config.corruption_policy = policy;
        self
    }

    /// Set the maximum serialized entry size (in bytes)
    pub fn max_entry_size(mut self, size: u64) -> Self {
        self.config.max_entry_size = size;
        self
    }

    /// Set the writer sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Keep entries of closed segments cached after reconstruction
    pub fn keep_entry_in_cache(mut self, keep: bool) -> Self {
        self.config.keep_entry_in_cache = keep;
        self
    }

    pub fn build(self) -> SegmentConfig {
        self.config
    }
}
