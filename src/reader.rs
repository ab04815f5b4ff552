use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::codec;
use crate::index::LogIndex;
use crate::notifier::OrdinalWatcher;
use crate::store::LogLocalFile;
use crate::types::{LogError, LogReader, Ordinal};

#[async_trait::async_trait]
impl<T> LogReader<T> for LogLocalFile
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn stream_from(
        &self,
        start: Ordinal,
    ) -> Result<Box<dyn Iterator<Item = Result<T, LogError>> + Send>, LogError> {
        // A fresh stream always reflects current on-disk state, including
        // records appended by another process since the last scan.
        self.refresh().await?;

        let (count, offset) = {
            let index = self.index.read().await;
            (index.count(), index.record_offset_of(start))
        };

        let Some(offset) = offset else {
            // start at or past the end: an empty, finite stream
            return Ok(Box::new(std::iter::empty()));
        };

        let file = std::fs::File::open(&self.path).map_err(|e| {
            LogError::Io(format!(
                "failed to open log file '{}' for read: {e}",
                self.path.display()
            ))
        })?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| LogError::Io(format!("failed to seek log file: {e}")))?;

        // The snapshot count bounds the stream; records are contiguous from
        // the start offset, so one sequential pass needs no further lookups.
        let mut remaining = count - start;
        let mut buf = Vec::new();

        let iter = std::iter::from_fn(move || {
            while remaining > 0 {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => return None,
                    Ok(_) => {
                        let line = match std::str::from_utf8(&buf) {
                            Ok(line) => line.trim(),
                            Err(e) => {
                                remaining -= 1;
                                return Some(Err(LogError::Decode(format!(
                                    "record is not valid UTF-8: {e}"
                                ))));
                            }
                        };
                        if line.is_empty() {
                            continue;
                        }
                        remaining -= 1;
                        // A decode failure poisons this record only; the
                        // caller may keep pulling for the next one.
                        return Some(codec::decode(line));
                    }
                    Err(e) => {
                        remaining = 0;
                        return Some(Err(LogError::Io(format!(
                            "failed to read log file: {e}"
                        ))));
                    }
                }
            }
            None
        });
        Ok(Box::new(iter))
    }

    async fn follow_from(&self, start: Ordinal) -> Result<LogFollower<T>, LogError> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            LogError::Io(format!(
                "failed to open log file '{}' for follow: {e}",
                self.path.display()
            ))
        })?;

        Ok(LogFollower {
            index: Arc::clone(&self.index),
            watcher: self.notifier.subscribe(),
            reader: BufReader::new(file),
            next_ordinal: start,
            _record: PhantomData,
        })
    }
}

/// A tailing reader: yields every record from its start ordinal onward and
/// suspends when it catches up with the writer, waking on the next publish.
///
/// Owned and fully independent of the handle's lifetime: drop it to cancel,
/// even mid-suspend. [`next`](Self::next) returns `None` once the log handle
/// is closed.
pub struct LogFollower<T> {
    index: Arc<RwLock<LogIndex>>,
    watcher: OrdinalWatcher,
    reader: BufReader<std::fs::File>,
    next_ordinal: Ordinal,
    _record: PhantomData<fn() -> T>,
}

impl<T> LogFollower<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Pull the next record, suspending until one exists.
    ///
    /// The wake may find the count advanced by more than one record; the
    /// cursor only ever moves one ordinal per pull, so nothing is skipped.
    pub async fn next(&mut self) -> Option<Result<T, LogError>> {
        loop {
            let offset = {
                let index = self.index.read().await;
                index.record_offset_of(self.next_ordinal)
            };
            if let Some(offset) = offset {
                self.next_ordinal += 1;
                return Some(self.read_record_at(offset));
            }

            // Caught up with the known records. Check the file for external
            // growth once before suspending on the notifier.
            let grew = {
                let mut index = self.index.write().await;
                match index.extend(self.reader.get_mut()) {
                    Ok(added) => added,
                    Err(e) => return Some(Err(e)),
                }
            };
            if grew > 0 {
                continue;
            }

            match self.watcher.wait_for(self.next_ordinal).await {
                Ok(_) => continue,
                Err(LogError::Closed) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// The ordinal the next pull will yield.
    pub fn position(&self) -> Ordinal {
        self.next_ordinal
    }

    fn read_record_at(&mut self, offset: u64) -> Result<T, LogError> {
        // Every read seeks first, so routing `extend` through the inner
        // handle cannot leave the buffer inconsistent.
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| LogError::Io(format!("failed to seek log file: {e}")))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| LogError::Io(format!("failed to read record: {e}")))?;
        codec::decode(line.trim())
    }
}
