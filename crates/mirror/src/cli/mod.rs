//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the
//! guild-mirror binary.

mod commands;
#[cfg(feature = "discord")]
mod guild;
mod offline;

pub use commands::{Cli, Commands};
#[cfg(feature = "discord")]
pub use guild::{apply_guild, capture_guild, plan_guild, run_bot};
pub use offline::{diff, list};
