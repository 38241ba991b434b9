//! Error types for logsegment
//!
//! Recoverable failures are reported through [`SegmentError`]. Invariant
//! violations (non-contiguous appends, out-of-range truncation, appending to
//! a closed segment) are bugs or undetected corruption and panic instead.

use thiserror::Error;

use crate::entry::TermIndex;

/// Result type alias using SegmentError
pub type Result<T> = std::result::Result<T, SegmentError>;

/// Unified error type for segment operations
#[derive(Debug, Error)]
pub enum SegmentError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Segment File Errors
    // -------------------------------------------------------------------------
    #[error("Segment corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Read Path Errors
    // -------------------------------------------------------------------------
    /// An on-demand load could not produce the requested entry.
    #[error("Failed to read log entry {term_index}: {reason}")]
    LogEntryRead { term_index: TermIndex, reason: String },

    // -------------------------------------------------------------------------
    // Reconstruction Errors
    // -------------------------------------------------------------------------
    #[error("Inconsistent segment: {0}")]
    InconsistentSegment(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for SegmentError {
    fn from(e: bincode::Error) -> Self {
        SegmentError::Serialization(e.to_string())
    }
}
