//! Commands that never touch a live guild.

use std::path::Path;

use guild_mirror::{MemoryGuild, MirrorConfig, MirrorResult, Reconciler, SnapshotStore};
use mirror_reconcile::NO_CHANGES;
use tracing::{info, instrument};

/// Print the plan that would turn `target` into `source`.
#[instrument(skip(config), fields(source = %source.display(), target = %target.display()))]
pub async fn diff(config: &MirrorConfig, source: &Path, target: &Path) -> MirrorResult<()> {
    let store = SnapshotStore::new(&config.storage.root)?;
    let desired = store.load(source).await?;
    let current = MemoryGuild::from_snapshot(&store.load(target).await?).state();

    let reconciler = Reconciler::new(config.reconcile.clone());
    let plan = reconciler.plan(&desired, &current);
    info!(changes = plan.len(), "Computed offline plan");
    if plan.is_empty() {
        println!("{}", NO_CHANGES);
    } else {
        println!("{}", reconciler.preview(&plan));
    }
    Ok(())
}

/// Print stored snapshots for `guild_id`, oldest first.
#[instrument(skip(config))]
pub async fn list(config: &MirrorConfig, guild_id: u64) -> MirrorResult<()> {
    let store = SnapshotStore::new(&config.storage.root)?;
    let stored = store.list(guild_id).await?;
    if stored.is_empty() {
        println!("No snapshots for guild {}", guild_id);
    }
    for snapshot in stored {
        println!("{}  {}", snapshot.timestamp(), snapshot.path().display());
    }
    Ok(())
}
