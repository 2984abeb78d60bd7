//! Tests for the filesystem snapshot store.

use chrono::{TimeZone, Utc};
use mirror_core::{RoleRecord, Snapshot};
use mirror_error::MirrorErrorKind;
use mirror_storage::{SnapshotStore, StorageErrorKind, attachment_name, timestamp};
use tempfile::TempDir;

fn snapshot(role: &str) -> Snapshot {
    Snapshot::builder()
        .roles(vec![RoleRecord::builder().name(role).build().unwrap()])
        .build()
        .unwrap()
}

#[test]
fn test_timestamp_format() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 4).unwrap();
    assert_eq!(timestamp(at), "2024-05-01T12-03-04");
}

#[test]
fn test_attachment_name_replaces_spaces_and_slashes() {
    assert_eq!(
        attachment_name("Guild Of/Things", "2024-05-01T12-03-04"),
        "Guild_Of_Things_snapshot_2024-05-01T12-03-04.json"
    );
}

#[tokio::test]
async fn test_save_layout_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp_dir.path()).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let stored = store.save(&snapshot("Mod"), 42, at).await.unwrap();

    assert_eq!(
        stored.path(),
        &temp_dir.path().join("42").join("2024-05-01T12-00-00.json")
    );
    assert_eq!(*stored.guild_id(), 42);
    let loaded = store.load(stored.path()).await.unwrap();
    assert_eq!(loaded, snapshot("Mod"));
}

#[tokio::test]
async fn test_list_is_oldest_first_and_latest_is_newest() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp_dir.path()).unwrap();
    let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let older = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    store.save(&snapshot("New"), 7, newer).await.unwrap();
    store.save(&snapshot("Old"), 7, older).await.unwrap();

    let listed = store.list(7).await.unwrap();
    let stamps: Vec<_> = listed.iter().map(|s| s.timestamp().as_str()).collect();
    assert_eq!(stamps, vec!["2024-05-01T00-00-00", "2024-06-01T00-00-00"]);
    assert_eq!(store.latest(7).await.unwrap(), snapshot("New"));
}

#[tokio::test]
async fn test_unknown_guild_has_no_snapshots() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp_dir.path()).unwrap();

    assert!(store.list(99).await.unwrap().is_empty());

    let err = store.latest(99).await.unwrap_err();
    match err.kind() {
        MirrorErrorKind::Storage(e) => {
            assert_eq!(e.kind, StorageErrorKind::NotFound("99".to_string()))
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_malformed_file_is_a_snapshot_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp_dir.path()).unwrap();
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, b"{\"roles\": []}").unwrap();

    let err = store.load(&path).await.unwrap_err();
    assert!(matches!(err.kind(), MirrorErrorKind::Snapshot(e) if e.is_missing_key()));
}
