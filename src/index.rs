use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use log::{info, warn};

use crate::types::{LogError, Ordinal};

/// In-memory offset table for one log file: the byte offset of every record
/// start discovered so far, plus the end of known-complete data.
///
/// Only line boundaries are scanned; record contents are never decoded here.
/// Blank lines advance `end_offset` but are not assigned an ordinal.
#[derive(Debug)]
pub(crate) struct LogIndex {
    offsets: Vec<u64>,
    end_offset: u64,
}

impl LogIndex {
    /// Open `path` (creating it empty if missing) and seed the index with a
    /// single boundary scan. A trailing non-terminated fragment is a partial
    /// write from a crashed appender; it is discarded by truncating the file
    /// back to the last complete record boundary.
    pub(crate) fn open_or_create(path: &Path) -> Result<Self, LogError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| LogError::Io(format!("failed to open log file '{}': {e}", path.display())))?;

        let file_len = file
            .metadata()
            .map_err(|e| LogError::Io(format!("failed to stat log file '{}': {e}", path.display())))?
            .len();

        let mut index = LogIndex {
            offsets: Vec::new(),
            end_offset: 0,
        };
        index.extend(&mut file)?;

        if index.end_offset < file_len {
            warn!(
                "log file '{}' ends in a partial record, truncating {} trailing byte(s)",
                path.display(),
                file_len - index.end_offset
            );
            file.set_len(index.end_offset).map_err(|e| {
                LogError::Io(format!(
                    "failed to truncate partial record in '{}': {e}",
                    path.display()
                ))
            })?;
        }

        info!(
            "opened log '{}' with {} record(s), {} byte(s)",
            path.display(),
            index.count(),
            index.end_offset
        );
        Ok(index)
    }

    /// Scan `file` forward from `end_offset`, registering every complete
    /// non-blank line found. A trailing fragment without a terminator is left
    /// alone: it may be an append in progress by another process, and will be
    /// picked up once its newline lands.
    ///
    /// Returns the number of records added.
    pub(crate) fn extend(&mut self, file: &mut File) -> Result<u64, LogError> {
        file.seek(SeekFrom::Start(self.end_offset))
            .map_err(|e| LogError::Io(format!("failed to seek log file: {e}")))?;

        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut pos = self.end_offset;
        let mut added = 0;

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| LogError::Io(format!("failed to scan log file: {e}")))?;
            if n == 0 {
                break;
            }
            if buf.last() != Some(&b'\n') {
                // incomplete trailing line
                break;
            }
            if !buf[..n - 1].iter().all(|b| b.is_ascii_whitespace()) {
                self.offsets.push(pos);
                added += 1;
            }
            pos += n as u64;
        }

        self.end_offset = pos;
        Ok(added)
    }

    /// Register one record the writer just persisted, starting at byte
    /// `start` and spanning `len` bytes including its terminator. A no-op if
    /// a concurrent [`extend`](Self::extend) already registered that region.
    ///
    /// Returns the ordinal of the last known record, which is the one just
    /// written as long as this process holds the only appender.
    pub(crate) fn append_at(&mut self, start: u64, len: u64) -> Ordinal {
        if self.end_offset <= start {
            debug_assert_eq!(self.end_offset, start);
            self.offsets.push(start);
            self.end_offset = start + len;
        }
        self.offsets.len() as u64 - 1
    }

    pub(crate) fn record_offset_of(&self, ordinal: Ordinal) -> Option<u64> {
        self.offsets.get(ordinal as usize).copied()
    }

    pub(crate) fn count(&self) -> u64 {
        self.offsets.len() as u64
    }

    pub(crate) fn end_offset(&self) -> u64 {
        self.end_offset
    }
}
