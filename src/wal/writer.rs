//! Segment Writer
//!
//! Appends encoded entries to a segment file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::entry::LogEntry;
use crate::error::{Result, SegmentError};

use super::format::{checksum, write_varint, HEADER_SIZE, MAGIC};

/// Writes entries to a segment file
pub struct SegmentWriter {
    /// Buffered writer over the segment file
    writer: BufWriter<File>,
    /// File path, for logging
    path: PathBuf,
    /// Offset the next entry is written at
    position: u64,
    /// When to fsync
    sync_strategy: SyncStrategy,
    /// Entries written since the last fsync
    unsynced: usize,
}

impl SegmentWriter {
    /// Open or create a segment file.
    ///
    /// A new (or empty) file gets the header; an existing file is appended
    /// to at its current end.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        let position = if len == 0 {
            file.write_all(MAGIC)?;
            HEADER_SIZE
        } else if len < HEADER_SIZE {
            return Err(SegmentError::Corruption(format!(
                "Segment file {} is shorter than its header ({} bytes)",
                path.display(),
                len
            )));
        } else {
            file.seek(SeekFrom::End(0))?
        };

        tracing::debug!(path = %path.display(), position, "Opened segment writer");

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            position,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append an entry, returning the number of bytes written.
    ///
    /// State machine data never reaches the file.
    pub fn write_entry(&mut self, entry: &LogEntry) -> Result<u64> {
        let data = if entry.has_state_machine_data() {
            entry.without_state_machine_data().encode()?
        } else {
            entry.encode()?
        };

        let mut buf = Vec::with_capacity(data.len() + 14);
        write_varint(&mut buf, data.len() as u64);
        buf.extend_from_slice(&data);
        buf.extend_from_slice(&checksum(&data).to_le_bytes());

        self.writer.write_all(&buf)?;
        self.position += buf.len() as u64;
        self.unsynced += 1;

        match self.sync_strategy {
            SyncStrategy::EveryWrite => self.sync()?,
            SyncStrategy::EveryNEntries { count } if self.unsynced >= count => self.sync()?,
            SyncStrategy::EveryNEntries { .. } => {}
        }

        Ok(buf.len() as u64)
    }

    /// Flush buffered bytes to the OS
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and fsync
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Offset the next entry will be written at
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SegmentWriter {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to flush segment writer");
        }
    }
}
