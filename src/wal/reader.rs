//! Segment Reader
//!
//! Parses entries sequentially from one segment file.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::entry::{varint_len, LogEntry, CHECKSUM_SIZE};
use crate::error::{Result, SegmentError};
use crate::storage::SegmentStartEnd;

use super::format::{checksum, read_varint, HEADER_SIZE, MAGIC};

/// Reads entries from a segment file, bounded by the segment's start/end
pub struct SegmentReader {
    /// Buffered file handle
    reader: BufReader<File>,
    /// File path, for error messages
    path: PathBuf,
    /// Index range the file is expected to hold
    start_end: SegmentStartEnd,
    /// Largest accepted serialized entry
    max_entry_size: u64,
    /// Offset just past the last verified entry
    position: u64,
    /// Set once the end of valid data is reached
    done: bool,
}

impl SegmentReader {
    /// Open a segment file and verify its header.
    ///
    /// A file shorter than the header, or with an all-zero header, holds no
    /// entries. Any other header that is not [`MAGIC`] is corruption.
    pub fn open(path: &Path, start_end: SegmentStartEnd, max_entry_size: u64) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut done = false;
        if file_len < HEADER_SIZE {
            done = true;
        } else {
            let mut header = [0u8; HEADER_SIZE as usize];
            reader.read_exact(&mut header)?;
            if header.iter().all(|&b| b == 0) {
                done = true;
            } else if &header != MAGIC {
                return Err(SegmentError::Corruption(format!(
                    "Invalid segment header in {}: {:?}",
                    path.display(),
                    header
                )));
            }
        }

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            start_end,
            max_entry_size,
            position: HEADER_SIZE,
            done,
        })
    }

    /// Read the next entry.
    ///
    /// Returns `Ok(None)` at the end of valid data: end of file, the start of
    /// zero padding, or (for closed segments) the first entry past the
    /// segment's end index.
    pub fn next_entry(&mut self) -> Result<Option<LogEntry>> {
        if self.done {
            return Ok(None);
        }

        let len = match read_varint(&mut self.reader)? {
            Some(len) => len,
            None => {
                self.done = true;
                return Ok(None);
            }
        };

        if len == 0 {
            self.done = true;
            self.verify_padding()?;
            return Ok(None);
        }

        if len > self.max_entry_size {
            return Err(SegmentError::Corruption(format!(
                "Entry at offset {} of {} is {} bytes, exceeding the maximum {}",
                self.position,
                self.path.display(),
                len,
                self.max_entry_size
            )));
        }

        let mut data = vec![0u8; len as usize];
        self.read_fully(&mut data, "entry")?;
        let mut trailer = [0u8; CHECKSUM_SIZE as usize];
        self.read_fully(&mut trailer, "checksum")?;

        let expected = u32::from_le_bytes(trailer);
        let actual = checksum(&data);
        if expected != actual {
            return Err(SegmentError::Corruption(format!(
                "Checksum mismatch at offset {} of {}: expected {:#010x}, got {:#010x}",
                self.position,
                self.path.display(),
                expected,
                actual
            )));
        }

        let entry = LogEntry::decode(&data)?;
        let index = entry.index;
        if index < self.start_end.start_index {
            return Err(SegmentError::Corruption(format!(
                "Entry index {} is before the segment start {} in {}",
                index,
                self.start_end.start_index,
                self.path.display()
            )));
        }
        // The file may hold entries that are pending truncation.
        if !self.start_end.is_open && index > self.start_end.end_index {
            self.done = true;
            return Ok(None);
        }

        self.position += varint_len(len) + len + CHECKSUM_SIZE;
        Ok(Some(entry))
    }

    /// Offset just past the last entry returned
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_fully(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                SegmentError::Corruption(format!(
                    "Truncated {} at offset {} of {}",
                    what,
                    self.position,
                    self.path.display()
                ))
            } else {
                SegmentError::Io(e)
            }
        })
    }

    /// Everything after a zero length prefix must be zero
    fn verify_padding(&mut self) -> Result<()> {
        let mut chunk = [0u8; 4096];
        loop {
            let n = self.reader.read(&mut chunk)?;
            if n == 0 {
                return Ok(());
            }
            if chunk[..n].iter().any(|&b| b != 0) {
                return Err(SegmentError::Corruption(format!(
                    "Non-zero bytes in padding after offset {} of {}",
                    self.position,
                    self.path.display()
                )));
            }
        }
    }
}

impl Iterator for SegmentReader {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.next_entry();
        if next.is_err() {
            self.done = true;
        }
        next.transpose()
    }
}
