//! Capture a live guild into a snapshot.

use crate::permission::encode;
use crate::{
    CategoryRecord, ChannelKind, ChannelRecord, GuildState, LiveChannel, LiveChannelKind,
    NativeOverwrite, OverwriteSubject, PermissionOverwriteSet, RoleRecord, Snapshot, SnapshotMeta,
    SubjectRef,
};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

/// Walk a guild's roles, categories and channels into a [`Snapshot`].
///
/// Roles are emitted in ascending `(position, id)` order. Member overwrites
/// are left out.
#[instrument(skip(state), fields(guild_id = state.id, guild_name = %state.name))]
pub fn capture(state: &GuildState, captured_at: DateTime<Utc>) -> Snapshot {
    let mut roles: Vec<_> = state.roles.iter().collect();
    roles.sort_by_key(|r| (r.position, r.id));

    let roles = roles
        .into_iter()
        .map(|r| RoleRecord {
            id: r.id,
            name: r.name.clone(),
            position: Some(r.position),
            color: Some(r.color),
            hoist: Some(r.hoist),
            mentionable: Some(r.mentionable),
            managed: r.managed,
            permissions: Some(r.permissions),
        })
        .collect::<Vec<_>>();

    let categories = state
        .categories()
        .map(|c| CategoryRecord {
            id: c.id,
            name: c.name.clone(),
            position: Some(c.position),
            nsfw: c.nsfw,
            overwrites: encode_overwrites(&c.overwrites),
        })
        .collect::<Vec<_>>();

    let channels = state
        .plain_channels()
        .map(capture_channel)
        .collect::<Vec<_>>();

    info!(
        roles = roles.len(),
        categories = categories.len(),
        channels = channels.len(),
        "Captured guild structure"
    );

    Snapshot {
        meta: SnapshotMeta {
            server_id: Some(state.id),
            server_name: Some(state.name.clone()),
            captured_at: Some(captured_at),
            owner_id: Some(state.owner_id),
        },
        roles,
        categories,
        channels,
    }
}

fn capture_channel(channel: &LiveChannel) -> ChannelRecord {
    let kind = match channel.kind {
        LiveChannelKind::Voice => ChannelKind::Voice,
        LiveChannelKind::Forum => ChannelKind::Forum,
        LiveChannelKind::Stage => ChannelKind::Stage,
        LiveChannelKind::Text | LiveChannelKind::Other | LiveChannelKind::Category => {
            ChannelKind::Text
        }
    };

    ChannelRecord {
        id: channel.id,
        name: channel.name.clone(),
        kind,
        position: Some(channel.position),
        parent_id: channel.parent_id,
        overwrites: encode_overwrites(&channel.overwrites),
        nsfw: Some(channel.nsfw),
        slowmode_delay: Some(channel.slowmode_delay),
        topic: channel.topic.clone(),
    }
}

/// Encode role overwrites; member overwrites are dropped.
pub fn encode_overwrites(overwrites: &[NativeOverwrite]) -> PermissionOverwriteSet {
    overwrites
        .iter()
        .filter_map(|ow| match ow.subject {
            OverwriteSubject::Role(id) => Some((SubjectRef::Role(id), encode(ow.permissions))),
            OverwriteSubject::Member(_) => None,
        })
        .collect()
}
