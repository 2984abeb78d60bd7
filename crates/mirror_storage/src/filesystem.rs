//! Filesystem snapshot store.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use mirror_core::Snapshot;
use mirror_error::{MirrorResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// File-name timestamp for a capture time, e.g. `2024-05-01T12-00-00`.
pub fn timestamp(captured_at: DateTime<Utc>) -> String {
    captured_at.format(TIMESTAMP_FORMAT).to_string()
}

/// Download name for a snapshot upload.
///
/// Spaces and slashes in the server name become underscores.
///
/// ```
/// assert_eq!(
///     mirror_storage::attachment_name("My Server/EU", "2024-05-01T12-00-00"),
///     "My_Server_EU_snapshot_2024-05-01T12-00-00.json"
/// );
/// ```
pub fn attachment_name(server_name: &str, timestamp: &str) -> String {
    format!("{}_snapshot_{}.json", server_name, timestamp)
        .replace(' ', "_")
        .replace('/', "_")
}

/// A snapshot file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct StoredSnapshot {
    /// Full path of the file
    path: PathBuf,
    /// Server the snapshot belongs to
    guild_id: u64,
    /// File-name timestamp
    timestamp: String,
}

/// Snapshot files under one root directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Open a store, creating the root directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        debug!(path = %root.display(), "Opened snapshot store");
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one server's snapshots.
    pub fn guild_dir(&self, guild_id: u64) -> PathBuf {
        self.root.join(guild_id.to_string())
    }

    /// Write a snapshot for `guild_id`, named after `captured_at`.
    ///
    /// Writes go to a temp file first and are renamed into place.
    #[instrument(skip(self, snapshot), fields(root = %self.root.display()))]
    pub async fn save(
        &self,
        snapshot: &Snapshot,
        guild_id: u64,
        captured_at: DateTime<Utc>,
    ) -> MirrorResult<StoredSnapshot> {
        let dir = self.guild_dir(guild_id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;

        let timestamp = timestamp(captured_at);
        let path = dir.join(format!("{}.json", timestamp));
        let bytes = snapshot.to_json()?;

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &bytes).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        info!(path = %path.display(), size = bytes.len(), "Stored snapshot");
        Ok(StoredSnapshot {
            path,
            guild_id,
            timestamp,
        })
    }

    /// Snapshots stored for `guild_id`, oldest first.
    ///
    /// A server with no directory yet has no snapshots.
    #[instrument(skip(self))]
    pub async fn list(&self, guild_id: u64) -> Result<Vec<StoredSnapshot>, StorageError> {
        let dir = self.guild_dir(guild_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    dir.display(),
                    e
                ))));
            }
        };

        let mut stored = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
            let Some(entry) = entry else {
                break;
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            stored.push(StoredSnapshot {
                timestamp: stem.to_string(),
                guild_id,
                path,
            });
        }

        stored.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        debug!(count = stored.len(), "Listed snapshots");
        Ok(stored)
    }

    /// Read and parse a snapshot file.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn load(&self, path: impl AsRef<Path>) -> MirrorResult<Snapshot> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;
        Ok(Snapshot::from_json(&bytes)?)
    }

    /// Most recent snapshot for `guild_id`.
    ///
    /// # Errors
    ///
    /// Returns a not-found storage error when none is stored.
    #[instrument(skip(self))]
    pub async fn latest(&self, guild_id: u64) -> MirrorResult<Snapshot> {
        let newest = self
            .list(guild_id)
            .await?
            .pop()
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(guild_id.to_string())))?;
        self.load(&newest.path).await
    }
}
