//! Chat platform adapters for guild mirror.
//!
//! The `mirror` command group is parsed here independently of any platform
//! ([`MirrorCommand`]), and run results become platform-neutral
//! [`Report`]s. Platform implementations are feature-gated:
//!
//! - `discord` - serenity-backed guild access, reaction confirmation and the
//!   bot event handler
//!
//! # Commands
//!
//! ```text
//! <prefix>mirror snapshot            capture, store and upload a snapshot
//! <prefix>mirror snapshot path       show where snapshots are written
//! <prefix>mirror update_from_json    preview, confirm and apply an attached snapshot
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod report;

#[cfg(feature = "discord")]
mod discord;

pub use command::{
    CANCELLED, COMMAND_GROUP, HELP_TEXT, MISSING_ATTACHMENT, MirrorCommand, NOT_AUTHORIZED,
    NOT_JSON, TIMED_OUT, is_snapshot_attachment,
};
pub use report::{
    CANCEL_EMOJI, CONFIRM_EMOJI, PREVIEW_FOOTER, PREVIEW_TITLE, ReplyTone, Report,
    reaction_answer,
};

#[cfg(feature = "discord")]
pub use discord::{
    AUDIT_LOG_REASON, DiscordError, DiscordErrorKind, DiscordResult, MirrorBot, MirrorHandler,
    ReactionConfirmation, SerenityGuild, channel_type, live_channel, live_kind, live_role,
    native_overwrite, platform_error, serenity_overwrite,
};
