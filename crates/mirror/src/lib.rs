//! Guild mirror: snapshot a chat guild's structure and reconcile another
//! guild against it.
//!
//! This crate ties the workspace together for the `guild-mirror` binary:
//! layered configuration, terminal confirmation, and re-exports of the
//! building blocks.
//!
//! - [`mirror_core`] - permission codec, snapshot document, live state
//! - [`mirror_reconcile`] - resolver, planner, preview and apply executor
//! - [`mirror_storage`] - snapshot files on disk
//! - `mirror_social` - Discord adapter and bot (feature `discord`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod prompt;

pub use config::{BotConfig, ENV_PREFIX, MirrorConfig, StorageConfig, TOKEN_VAR};
pub use prompt::{TerminalConfirmation, is_yes};

pub use mirror_core::{GuildState, Snapshot, capture};
pub use mirror_error::{MirrorError, MirrorErrorKind, MirrorResult};
pub use mirror_interface::{
    ConfirmationGate, ConfirmationOutcome, FixedConfirmation, GuildPlatform, MemoryGuild,
};
pub use mirror_reconcile::{ApplyResults, ChangePlan, Outcome, ReconcileOptions, Reconciler};
pub use mirror_storage::SnapshotStore;

#[cfg(feature = "discord")]
pub use mirror_social::{MirrorBot, MirrorHandler, SerenityGuild};
