//! Live guild state as read from the hosting platform.
//!
//! These are plain data carriers filled by a platform adapter. They are the
//! "target" side of every diff and the input to [`crate::capture`].

use crate::ChannelKind;
use crate::permission::{ADMINISTRATOR, MANAGE_GUILD, PermissionPair};

/// Name the platform gives the implicit role every member holds.
pub const EVERYONE_ROLE_NAME: &str = "@everyone";

/// Subject of a native overwrite, keyed by target-side id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverwriteSubject {
    /// Role overwrite
    Role(u64),
    /// Member overwrite
    Member(u64),
}

/// A native per-subject permission overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeOverwrite {
    /// Who the overwrite applies to
    pub subject: OverwriteSubject,
    /// Allow/deny bitmasks
    pub permissions: PermissionPair,
}

impl NativeOverwrite {
    /// Role overwrite from raw bitmasks.
    pub fn role(role_id: u64, allow: u64, deny: u64) -> Self {
        Self {
            subject: OverwriteSubject::Role(role_id),
            permissions: PermissionPair::new(allow, deny),
        }
    }
}

/// A role as it currently exists on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRole {
    /// Target-side id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Display rank
    pub position: u32,
    /// Packed RGB color
    pub color: u32,
    /// Shown separately in the member list
    pub hoist: bool,
    /// Anyone may mention it
    pub mentionable: bool,
    /// Owned by the platform or an integration
    pub managed: bool,
    /// Permission bitfield
    pub permissions: u64,
}

/// Kind of a live channel, including categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum LiveChannelKind {
    /// Category container
    Category,
    /// Text channel
    Text,
    /// Voice channel
    Voice,
    /// Forum channel
    Forum,
    /// Stage channel
    Stage,
    /// Anything else the platform reports (threads, directories, ...)
    Other,
}

impl From<ChannelKind> for LiveChannelKind {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => LiveChannelKind::Text,
            ChannelKind::Voice => LiveChannelKind::Voice,
            ChannelKind::Forum => LiveChannelKind::Forum,
            ChannelKind::Stage => LiveChannelKind::Stage,
        }
    }
}

impl LiveChannelKind {
    /// Whether topic, nsfw and slowmode apply to this kind.
    pub fn is_text_like(&self) -> bool {
        matches!(self, LiveChannelKind::Text | LiveChannelKind::Forum)
    }
}

/// A channel or category as it currently exists on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveChannel {
    /// Target-side id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Channel kind
    pub kind: LiveChannelKind,
    /// Display rank
    pub position: u32,
    /// Parent category id
    pub parent_id: Option<u64>,
    /// Topic, where the kind has one
    pub topic: Option<String>,
    /// Age-restricted
    pub nsfw: bool,
    /// Slowmode in seconds
    pub slowmode_delay: u32,
    /// Native overwrites
    pub overwrites: Vec<NativeOverwrite>,
}

impl LiveChannel {
    /// True for category containers.
    pub fn is_category(&self) -> bool {
        self.kind == LiveChannelKind::Category
    }
}

/// Structural state of one guild.
///
/// Roles and channels are kept in enumeration order `(position, id)`; when two
/// entities share a name, the first one in that order is the match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuildState {
    /// Guild id; also the id of the `@everyone` role
    pub id: u64,
    /// Guild name
    pub name: String,
    /// Owner user id
    pub owner_id: u64,
    /// All roles, including `@everyone`
    pub roles: Vec<LiveRole>,
    /// All channels, including categories
    pub channels: Vec<LiveChannel>,
}

impl GuildState {
    /// Sort roles and channels into enumeration order.
    pub fn normalize(&mut self) {
        self.roles.sort_by_key(|r| (r.position, r.id));
        self.channels.sort_by_key(|c| (c.position, c.id));
    }

    /// Role by target id.
    pub fn role(&self, id: u64) -> Option<&LiveRole> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// First role with the given name.
    pub fn role_named(&self, name: &str) -> Option<&LiveRole> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// The implicit `@everyone` role, if present.
    pub fn everyone_role(&self) -> Option<&LiveRole> {
        self.role(self.id)
    }

    /// True for the `@everyone` role, matched by id or by name.
    pub fn is_everyone(&self, role: &LiveRole) -> bool {
        role.id == self.id || role.name == EVERYONE_ROLE_NAME
    }

    /// Channel or category by target id.
    pub fn channel(&self, id: u64) -> Option<&LiveChannel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Categories in enumeration order.
    pub fn categories(&self) -> impl Iterator<Item = &LiveChannel> {
        self.channels.iter().filter(|c| c.is_category())
    }

    /// Non-category channels in enumeration order.
    pub fn plain_channels(&self) -> impl Iterator<Item = &LiveChannel> {
        self.channels.iter().filter(|c| !c.is_category())
    }

    /// First category with the given name.
    pub fn category_named(&self, name: &str) -> Option<&LiveChannel> {
        self.categories().find(|c| c.name == name)
    }

    /// First non-category channel with the given name.
    pub fn channel_named(&self, name: &str) -> Option<&LiveChannel> {
        self.plain_channels().find(|c| c.name == name)
    }

    /// Whether a member may run structural management commands.
    ///
    /// The owner always may; otherwise one of the member's roles (or
    /// `@everyone`) must carry `ADMINISTRATOR` or `MANAGE_GUILD`.
    pub fn member_can_manage(&self, user_id: u64, role_ids: &[u64]) -> bool {
        if user_id == self.owner_id {
            return true;
        }
        self.roles
            .iter()
            .filter(|r| r.id == self.id || role_ids.contains(&r.id))
            .any(|r| r.permissions & (ADMINISTRATOR | MANAGE_GUILD) != 0)
    }
}
