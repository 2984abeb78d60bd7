//! Commands against a live Discord guild.

use std::path::Path;

use chrono::Utc;
use guild_mirror::{
    ConfirmationGate, ConfirmationOutcome, FixedConfirmation, GuildPlatform, MirrorBot,
    MirrorConfig, MirrorHandler, MirrorResult, Outcome, Reconciler, SerenityGuild,
    SnapshotStore, TerminalConfirmation, capture,
};
use mirror_reconcile::NO_CHANGES;
use mirror_social::{CANCELLED, TIMED_OUT};
use tracing::{info, instrument};

/// Run the bot until it shuts down.
pub async fn run_bot(config: &MirrorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let token = MirrorConfig::token()?;
    let store = SnapshotStore::new(&config.storage.root)?;
    let handler = MirrorHandler::new(config.bot.prefix.clone(), store, config.reconcile.clone());

    let mut bot = MirrorBot::new(token, handler).await?;
    bot.start().await?;
    Ok(())
}

/// Capture `guild_id` into the store.
#[instrument(skip(config))]
pub async fn capture_guild(config: &MirrorConfig, guild_id: u64) -> MirrorResult<()> {
    let platform = SerenityGuild::with_token(MirrorConfig::token()?, guild_id);
    let store = SnapshotStore::new(&config.storage.root)?;

    let state = platform.fetch_state().await?;
    let captured_at = Utc::now();
    let snapshot = capture(&state, captured_at);
    let stored = store.save(&snapshot, state.id, captured_at).await?;

    info!(path = %stored.path().display(), "Snapshot captured");
    println!("Snapshot saved: {}", stored.path().display());
    println!("{}", snapshot.summary());
    Ok(())
}

/// Print the plan for applying `snapshot` to `guild_id`.
#[instrument(skip(config), fields(snapshot = %snapshot.display()))]
pub async fn plan_guild(config: &MirrorConfig, guild_id: u64, snapshot: &Path) -> MirrorResult<()> {
    let platform = SerenityGuild::with_token(MirrorConfig::token()?, guild_id);
    let store = SnapshotStore::new(&config.storage.root)?;
    let desired = store.load(snapshot).await?;
    let target = platform.fetch_state().await?;

    let reconciler = Reconciler::new(config.reconcile.clone());
    let plan = reconciler.plan(&desired, &target);
    if plan.is_empty() {
        println!("{}", NO_CHANGES);
    } else {
        println!("{}", reconciler.preview(&plan));
    }
    Ok(())
}

/// Reconcile `guild_id` with `snapshot`, asking first unless `yes`.
#[instrument(skip(config), fields(snapshot = %snapshot.display()))]
pub async fn apply_guild(
    config: &MirrorConfig,
    guild_id: u64,
    snapshot: &Path,
    yes: bool,
) -> MirrorResult<()> {
    let platform = SerenityGuild::with_token(MirrorConfig::token()?, guild_id);
    let store = SnapshotStore::new(&config.storage.root)?;
    let desired = store.load(snapshot).await?;

    let gate: Box<dyn ConfirmationGate> = if yes {
        Box::new(FixedConfirmation(ConfirmationOutcome::Confirmed))
    } else {
        Box::new(TerminalConfirmation::stdin())
    };

    let reconciler = Reconciler::new(config.reconcile.clone());
    let outcome = reconciler.run(&desired, &platform, gate.as_ref()).await?;
    match outcome {
        Outcome::NoChanges => println!("{}", NO_CHANGES),
        Outcome::Cancelled => println!("{}", CANCELLED),
        Outcome::TimedOut => println!("{}", TIMED_OUT),
        Outcome::Applied(results) => println!("{}", results.render()),
    }
    Ok(())
}
