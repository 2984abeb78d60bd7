//! Discord platform integration.
//!
//! - [`SerenityGuild`] implements `GuildPlatform` over the HTTP API.
//! - [`ReactionConfirmation`] asks the invoker to react ✅ or ❌.
//! - [`MirrorHandler`] answers the `mirror` command group.
//! - [`MirrorBot`] owns the gateway client.

mod client;
mod confirmation;
mod conversions;
mod error;
mod guild;
mod handler;

pub use client::MirrorBot;
pub use confirmation::ReactionConfirmation;
pub use conversions::{
    channel_type, live_channel, live_kind, live_role, native_overwrite, serenity_overwrite,
};
pub use error::{DiscordError, DiscordErrorKind, DiscordResult, platform_error};
pub use guild::{AUDIT_LOG_REASON, SerenityGuild};
pub use handler::MirrorHandler;
