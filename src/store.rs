use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::index::LogIndex;
use crate::notifier::{Notifier, OrdinalWatcher};
use crate::types::{LogCommon, LogError};
use crate::writer::LogFile;

/// A single append-only JSON-lines log backed by one local file.
///
/// One handle per path per process: it owns the authoritative offset index,
/// the append cursor, and the notifier that wakes followers. Readers created
/// from the same handle share the index and never re-scan already-known data.
pub struct LogLocalFile {
    pub(crate) path: PathBuf,
    pub(crate) index: Arc<RwLock<LogIndex>>,
    pub(crate) notifier: Notifier,
    pub(crate) write_handle: Mutex<Option<LogFile>>,
}

impl LogLocalFile {
    /// Open the log at `path`, creating it empty if it does not exist.
    ///
    /// Existing content is scanned once for record boundaries; a trailing
    /// partial record left by a crashed appender is truncated away before the
    /// log is exposed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    error!("failed to create log dir '{}': {e}", parent.display());
                    LogError::Io(format!(
                        "failed to create log dir '{}': {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let index = LogIndex::open_or_create(&path)?;
        let notifier = Notifier::new(index.count());

        Ok(Self {
            path,
            index: Arc::new(RwLock::new(index)),
            notifier,
            write_handle: Mutex::new(None),
        })
    }

    /// Extend the shared index with any records another process appended to
    /// the file since the last scan. Wakes followers if growth was found.
    pub(crate) async fn refresh(&self) -> Result<u64, LogError> {
        let mut file = std::fs::File::open(&self.path).map_err(|e| {
            LogError::Io(format!(
                "failed to open log file '{}' for scan: {e}",
                self.path.display()
            ))
        })?;

        let count = {
            let mut index = self.index.write().await;
            let added = index.extend(&mut file)?;
            if added == 0 {
                return Ok(0);
            }
            info!(
                "picked up {added} externally appended record(s) in '{}'",
                self.path.display()
            );
            index.count()
        };
        self.notifier.publish(count);
        Ok(count)
    }

    /// Flush and release the append handle, then resolve every pending
    /// follower subscription with a cancellation. Idempotent.
    pub async fn close(&self) -> Result<(), LogError> {
        let mut guard = self.write_handle.lock().await;
        if let Some(mut handle) = guard.take() {
            handle
                .buffer
                .flush()
                .await
                .map_err(|e| LogError::Io(format!("failed to flush on close: {e}")))?;
            handle
                .buffer
                .get_ref()
                .sync_data()
                .await
                .map_err(|e| LogError::Io(format!("failed to sync on close: {e}")))?;
            info!("closed log '{}'", self.path.display());
        }
        self.notifier.close();
        Ok(())
    }
}

#[async_trait::async_trait]
impl LogCommon for LogLocalFile {
    async fn sync(&self) -> Result<(), LogError> {
        let mut guard = self.write_handle.lock().await;
        if let Some(handle) = guard.as_mut() {
            handle
                .buffer
                .flush()
                .await
                .map_err(|e| LogError::Io(format!("failed to flush log file: {e}")))?;
            handle
                .buffer
                .get_ref()
                .sync_data()
                .await
                .map_err(|e| LogError::Io(format!("failed to sync log file: {e}")))?;
        }
        Ok(())
    }

    async fn count(&self) -> u64 {
        self.index.read().await.count()
    }

    fn subscribe(&self) -> OrdinalWatcher {
        self.notifier.subscribe()
    }
}
