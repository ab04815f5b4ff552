//! A file-backed, append-only JSON-lines log.
//!
//! `LogLocalFile` stores records on disk as one JSON value per line in a
//! single flat file. Each record is assigned a monotonically increasing
//! **ordinal** and can be read back via streaming iterators or tailed live.
//!
//! # Features
//!
//! - **Durable** – every append flushes and syncs before it is acknowledged,
//!   indexed, or announced; a crash mid-append is recovered on the next open
//!   by truncating the trailing partial record.
//! - **Indexed** – record boundaries are scanned once at open time and kept
//!   as an in-memory offset table, so readers seek straight to any ordinal
//!   without buffering the log in memory.
//! - **Tailable** – followers block for new records via [`tokio::sync::watch`]
//!   based notifications and wake as soon as the writer publishes.
//! - **Normalizing** – `append` re-decodes the line it just wrote and returns
//!   that value, so in-memory history always matches a fresh read from disk.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use jlog::store::LogLocalFile;
//! use jlog::{LogReader, LogWriter};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Clone, Debug)]
//! struct Event {
//!     user: String,
//!     action: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Open (or create) the log.
//!     let log = LogLocalFile::open("./events.jsonl").await?;
//!
//!     // 2. Append a record – returns the assigned ordinal and the
//!     //    normalized (re-decoded) record.
//!     let event = Event {
//!         user: "alice".into(),
//!         action: "login".into(),
//!     };
//!     let (ordinal, _stored) = log.append(event).await?;
//!     println!("stored as record {ordinal}");
//!
//!     // 3. Replay everything from ordinal 0 (finite).
//!     for record in log.stream_from(0).await? {
//!         let event: Event = record?;
//!         println!("{event:?}");
//!     }
//!
//!     // 4. Or tail the log: yields existing records, then blocks for new
//!     //    ones. Drop the follower (or close the log) to stop.
//!     let mut follower = LogReader::<Event>::follow_from(&log, ordinal).await?;
//!     while let Some(record) = follower.next().await {
//!         println!("live: {:?}", record?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Recovery
//!
//! To resume after a restart, call [`store::LogLocalFile::open`] on the same
//! path. The log scans existing line boundaries (without decoding records),
//! discards any trailing partial write, and continues appending from the last
//! complete record.


mod codec;
mod index;
mod notifier;
mod reader;
pub mod store;
mod types;
mod writer;

pub use notifier::OrdinalWatcher;
pub use reader::LogFollower;
pub use types::*;
