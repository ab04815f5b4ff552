use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::notifier::OrdinalWatcher;
use crate::reader::LogFollower;

/// 0-based sequential position of a record in the log.
pub type Ordinal = u64;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(String),
    #[error("ordinal {0} is not in the log")]
    OrdinalNotFound(Ordinal),
    #[error("log handle closed")]
    Closed,
}

pub trait Log<T>: LogReader<T> + LogWriter<T> + Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
}
impl<T, L> Log<T> for L
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    L: LogReader<T> + LogWriter<T> + Send + Sync,
{
}

#[async_trait::async_trait]
pub trait LogCommon: Send + Sync {
    /// Flush any buffered append and force it to stable storage.
    async fn sync(&self) -> Result<(), LogError>;

    /// Number of records currently known to this handle.
    async fn count(&self) -> u64;

    /// Subscribe to "record count advanced" notifications.
    fn subscribe(&self) -> OrdinalWatcher;
}

#[async_trait::async_trait]
pub trait LogReader<T>: LogCommon + Send + Sync
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Replay records starting at `start` (inclusive). The returned iterator
    /// reflects the on-disk state at call time and is finite; it terminates
    /// at the current end of the log.
    async fn stream_from(
        &self,
        start: Ordinal,
    ) -> Result<Box<dyn Iterator<Item = Result<T, LogError>> + Send>, LogError>;

    /// Read records starting at `start`, then block for new ones as they are
    /// appended (tail semantics). The follower is owned; drop it to cancel.
    async fn follow_from(&self, start: Ordinal) -> Result<LogFollower<T>, LogError>;
}

#[async_trait::async_trait]
pub trait LogWriter<T>: LogCommon + Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Durably append one record. Returns the assigned ordinal together with
    /// the normalized record, i.e. the value a fresh read of the just-written
    /// line produces. The normalized value is authoritative over the input.
    async fn append(&self, record: T) -> Result<(Ordinal, T), LogError>;
}
