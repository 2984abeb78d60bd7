//! Filesystem storage for guild snapshots.
//!
//! Snapshots are kept one directory per server, one file per capture:
//!
//! ```text
//! <root>/
//! └── <serverId>/
//!     ├── 2024-05-01T12-00-00.json
//!     └── 2024-05-02T08-30-15.json
//! ```
//!
//! File names sort chronologically, so the newest capture is the last entry.
//!
//! # Example
//!
//! ```rust
//! use mirror_storage::SnapshotStore;
//!
//! # async fn example(snapshot: mirror_core::Snapshot) -> mirror_error::MirrorResult<()> {
//! let store = SnapshotStore::new("/tmp/guild_mirror")?;
//! let stored = store.save(&snapshot, 1234, chrono::Utc::now()).await?;
//! let loaded = store.load(stored.path()).await?;
//! assert_eq!(loaded, snapshot);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;

pub use filesystem::{SnapshotStore, StoredSnapshot, attachment_name, timestamp};
pub use mirror_error::{StorageError, StorageErrorKind};
