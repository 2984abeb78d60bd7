//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Guild mirror - snapshot a guild's structure and reconcile another guild against it
#[derive(Parser, Debug)]
#[command(name = "guild-mirror")]
#[command(about = "Snapshot a guild's structure and reconcile another guild against it", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the chat bot answering `<prefix>mirror` commands
    #[cfg(feature = "discord")]
    Bot,

    /// Capture a guild and store the snapshot
    #[cfg(feature = "discord")]
    Capture {
        /// Guild (server) id
        #[arg(long)]
        guild: u64,
    },

    /// Show what applying a snapshot to a guild would change
    #[cfg(feature = "discord")]
    Plan {
        /// Target guild (server) id
        #[arg(long)]
        guild: u64,

        /// Snapshot document to apply
        #[arg(long)]
        snapshot: PathBuf,
    },

    /// Preview, confirm and apply a snapshot to a guild
    #[cfg(feature = "discord")]
    Apply {
        /// Target guild (server) id
        #[arg(long)]
        guild: u64,

        /// Snapshot document to apply
        #[arg(long)]
        snapshot: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Plan offline between two snapshot documents
    Diff {
        /// Snapshot document to apply
        source: PathBuf,

        /// Snapshot document standing in for the target guild
        target: PathBuf,
    },

    /// List stored snapshots for a guild
    List {
        /// Guild (server) id
        #[arg(long)]
        guild: u64,
    },
}
