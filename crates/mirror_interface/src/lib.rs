//! Trait definitions for guild mirror.
//!
//! This crate provides the seams between the reconciliation engine and the
//! outside world:
//!
//! - [`GuildPlatform`] reads a guild's structure and issues the mutating
//!   calls (role, category and channel CRUD, overwrite replacement).
//! - [`ConfirmationGate`] asks a human to accept or cancel a preview.
//!
//! [`MemoryGuild`] implements [`GuildPlatform`] over an in-memory
//! [`GuildState`](mirror_core::GuildState). It stands in for a live guild
//! when diffing two documents offline and in tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod confirmation;
mod memory;
mod platform;

pub use confirmation::{ConfirmationGate, ConfirmationOutcome, FixedConfirmation};
pub use memory::{FailurePoint, MemoryGuild};
pub use platform::{ChannelEdit, ChannelSpec, GuildPlatform, RoleEdit, RoleSpec};
