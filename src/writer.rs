use log::warn;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::codec;
use crate::store::LogLocalFile;
use crate::types::{LogError, LogWriter, Ordinal};

/// The writer's exclusive append handle: a buffered file opened in append
/// mode plus the byte offset the next record will land at.
#[derive(Debug)]
pub(crate) struct LogFile {
    pub(crate) buffer: BufWriter<File>,
    /// End of known data when the handle was created, advanced by every
    /// append. Doubles as the start offset registered with the index.
    pub(crate) offset: u64,
}

impl LogFile {
    pub(crate) async fn open_append(path: &std::path::Path) -> Result<File, LogError> {
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                LogError::Io(format!(
                    "failed to open log file '{}' for append: {e}",
                    path.display()
                ))
            })
    }
}

#[async_trait::async_trait]
impl<T> LogWriter<T> for LogLocalFile
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn append(&self, record: T) -> Result<(Ordinal, T), LogError> {
        // Encode before touching the file: an unrepresentable record must
        // leave the log byte-for-byte untouched.
        let line = codec::encode(&record)?;

        let mut guard = self.write_handle.lock().await;
        if guard.is_none() {
            // First append on this handle. Pick up any external growth first
            // so the cached offset matches the real end of file.
            self.refresh().await?;
            let file = LogFile::open_append(&self.path).await?;
            let offset = self.index.read().await.end_offset();
            *guard = Some(LogFile {
                buffer: BufWriter::new(file),
                offset,
            });
        }
        let handle = guard
            .as_mut()
            .ok_or_else(|| LogError::Io("append handle unavailable".to_string()))?;

        // One buffer for line and terminator so the write is as close to
        // atomic as the filesystem allows.
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');

        let start = handle.offset;

        handle
            .buffer
            .write_all(&payload)
            .await
            .map_err(|e| LogError::Io(format!("failed to append record: {e}")))?;
        handle
            .buffer
            .flush()
            .await
            .map_err(|e| LogError::Io(format!("failed to flush record: {e}")))?;

        // Durability barrier. Nothing is indexed or published until the
        // record is guaranteed to survive a crash; a failure here leaves the
        // index untouched and the trailing bytes to be truncated on reopen.
        handle
            .buffer
            .get_ref()
            .sync_data()
            .await
            .map_err(|e| LogError::Io(format!("failed to sync record: {e}")))?;

        handle.offset += payload.len() as u64;

        // Normalize through the codec: the value returned to the caller is
        // what a fresh read of the just-written line produces, so observed
        // history never diverges from replayed history.
        let normalized: T = codec::decode(&line).map_err(|e| {
            warn!(
                "record at offset {start} is durable but did not re-decode, \
                 it will be indexed on the next open: {e}"
            );
            e
        })?;

        let (ordinal, count) = {
            let mut index = self.index.write().await;
            let ordinal = index.append_at(start, payload.len() as u64);
            (ordinal, index.count())
        };
        self.notifier.publish(count);

        Ok((ordinal, normalized))
    }
}
