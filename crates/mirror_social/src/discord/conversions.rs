//! Conversions between serenity models and live guild state.

use mirror_core::{
    LiveChannel, LiveChannelKind, LiveRole, NativeOverwrite, OverwriteSubject, PermissionPair,
};
use serde::Serialize;
use serenity::model::channel::{
    ChannelType, GuildChannel, PermissionOverwrite, PermissionOverwriteType,
};
use serenity::model::guild::Role;
use serenity::model::id::{RoleId, UserId};
use serenity::model::permissions::Permissions;
use tracing::debug;

/// Map a serenity channel type onto the kinds the engine tracks.
///
/// Announcement channels behave like text channels for mirroring.
pub fn live_kind(kind: ChannelType) -> LiveChannelKind {
    match kind {
        ChannelType::Category => LiveChannelKind::Category,
        ChannelType::Text | ChannelType::News => LiveChannelKind::Text,
        ChannelType::Voice => LiveChannelKind::Voice,
        ChannelType::Forum => LiveChannelKind::Forum,
        ChannelType::Stage => LiveChannelKind::Stage,
        _ => LiveChannelKind::Other,
    }
}

/// Channel type used when creating a channel of `kind`.
pub fn channel_type(kind: LiveChannelKind) -> ChannelType {
    match kind {
        LiveChannelKind::Category => ChannelType::Category,
        LiveChannelKind::Voice => ChannelType::Voice,
        LiveChannelKind::Forum => ChannelType::Forum,
        LiveChannelKind::Stage => ChannelType::Stage,
        LiveChannelKind::Text | LiveChannelKind::Other => ChannelType::Text,
    }
}

/// Read a role.
pub fn live_role(role: &Role) -> LiveRole {
    LiveRole {
        id: role.id.get(),
        name: role.name.clone(),
        position: u32::from(role.position),
        color: role.colour.0,
        hoist: role.hoist,
        mentionable: role.mentionable,
        managed: role.managed,
        permissions: role.permissions.bits(),
    }
}

/// Read a channel or category with its overwrites.
pub fn live_channel(channel: &GuildChannel) -> LiveChannel {
    LiveChannel {
        id: channel.id.get(),
        name: channel.name.clone(),
        kind: live_kind(channel.kind),
        position: u32::from(channel.position),
        parent_id: channel.parent_id.map(|id| id.get()),
        topic: channel.topic.clone(),
        nsfw: channel.nsfw,
        slowmode_delay: channel.rate_limit_per_user.map(u32::from).unwrap_or(0),
        overwrites: channel
            .permission_overwrites
            .iter()
            .filter_map(native_overwrite)
            .collect(),
    }
}

/// Read one overwrite; subject types the engine does not know are skipped.
pub fn native_overwrite(overwrite: &PermissionOverwrite) -> Option<NativeOverwrite> {
    let subject = match overwrite.kind {
        PermissionOverwriteType::Role(id) => OverwriteSubject::Role(id.get()),
        PermissionOverwriteType::Member(id) => OverwriteSubject::Member(id.get()),
        other => {
            debug!(kind = ?other, "Skipping overwrite with unknown subject type");
            return None;
        }
    };
    Some(NativeOverwrite {
        subject,
        permissions: PermissionPair::new(overwrite.allow.bits(), overwrite.deny.bits()),
    })
}

/// Build the serenity form of an overwrite.
pub fn serenity_overwrite(overwrite: &NativeOverwrite) -> PermissionOverwrite {
    let kind = match overwrite.subject {
        OverwriteSubject::Role(id) => PermissionOverwriteType::Role(RoleId::new(id)),
        OverwriteSubject::Member(id) => PermissionOverwriteType::Member(UserId::new(id)),
    };
    PermissionOverwrite {
        allow: Permissions::from_bits_truncate(overwrite.permissions.allow),
        deny: Permissions::from_bits_truncate(overwrite.permissions.deny),
        kind,
    }
}

/// Clamp a display rank to the platform's range.
pub fn position(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// One entry of the bulk role-position request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePositionEntry {
    /// Role snowflake
    pub id: String,
    /// New display rank
    pub position: u16,
}

/// Body for moving several roles in one request.
pub fn role_positions_body(positions: &[(u64, u32)]) -> Vec<RolePositionEntry> {
    positions
        .iter()
        .map(|&(id, rank)| RolePositionEntry {
            id: id.to_string(),
            position: position(rank),
        })
        .collect()
}
