//! The hosting platform seam.

use async_trait::async_trait;
use mirror_core::{GuildState, LiveChannel, LiveChannelKind, LiveRole, NativeOverwrite};
use mirror_error::PlatformResult;

/// Properties of a role to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSpec {
    /// Role name
    pub name: String,
    /// Packed RGB color
    pub color: u32,
    /// Shown separately in the member list
    pub hoist: bool,
    /// Anyone may mention it
    pub mentionable: bool,
    /// Permission bitfield; `None` leaves the platform default
    pub permissions: Option<u64>,
}

/// Role properties to change; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleEdit {
    /// New color
    pub color: Option<u32>,
    /// New hoist flag
    pub hoist: Option<bool>,
    /// New mentionable flag
    pub mentionable: Option<bool>,
    /// New permission bitfield
    pub permissions: Option<u64>,
}

impl RoleEdit {
    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.hoist.is_none()
            && self.mentionable.is_none()
            && self.permissions.is_none()
    }
}

/// Properties of a channel or category to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Channel name
    pub name: String,
    /// Kind; [`LiveChannelKind::Category`] creates a category
    pub kind: LiveChannelKind,
    /// Target-side parent category
    pub parent_id: Option<u64>,
    /// Display rank
    pub position: Option<u32>,
    /// Topic (text-like kinds only)
    pub topic: Option<String>,
    /// Age-restricted
    pub nsfw: Option<bool>,
    /// Slowmode in seconds (text-like kinds only)
    pub slowmode_delay: Option<u32>,
}

impl ChannelSpec {
    /// A bare category.
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LiveChannelKind::Category,
            parent_id: None,
            position: None,
            topic: None,
            nsfw: None,
            slowmode_delay: None,
        }
    }
}

/// Channel properties to change; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelEdit {
    /// New display rank
    pub position: Option<u32>,
    /// New parent; `Some(None)` moves the channel to the top level
    pub parent_id: Option<Option<u64>>,
    /// New topic
    pub topic: Option<String>,
    /// New age restriction
    pub nsfw: Option<bool>,
    /// New slowmode
    pub slowmode_delay: Option<u32>,
}

impl ChannelEdit {
    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.parent_id.is_none()
            && self.topic.is_none()
            && self.nsfw.is_none()
            && self.slowmode_delay.is_none()
    }
}

/// Reads and mutates one guild on a hosting platform.
///
/// Every call is awaited before the next is issued; implementations need not
/// guard against concurrent use by the same reconciliation run.
///
/// # Tracing
///
/// Implementations should instrument each call with the guild id and the
/// entity name or id, and emit an error event with context on failure.
#[async_trait]
pub trait GuildPlatform: Send + Sync {
    /// Id of the guild this handle targets.
    fn guild_id(&self) -> u64;

    /// Read the guild's current roles and channels in enumeration order.
    async fn fetch_state(&self) -> PlatformResult<GuildState>;

    /// Create a role.
    async fn create_role(&self, spec: &RoleSpec) -> PlatformResult<LiveRole>;

    /// Change a role's properties.
    async fn edit_role(&self, role_id: u64, edit: &RoleEdit) -> PlatformResult<LiveRole>;

    /// Move roles to new display ranks.
    async fn set_role_positions(&self, positions: &[(u64, u32)]) -> PlatformResult<()>;

    /// Delete a role.
    async fn delete_role(&self, role_id: u64) -> PlatformResult<()>;

    /// Create a channel or category.
    async fn create_channel(&self, spec: &ChannelSpec) -> PlatformResult<LiveChannel>;

    /// Change a channel's properties.
    async fn edit_channel(&self, channel_id: u64, edit: &ChannelEdit)
    -> PlatformResult<LiveChannel>;

    /// Replace a channel's or category's whole overwrite set.
    async fn set_overwrites(
        &self,
        channel_id: u64,
        overwrites: &[NativeOverwrite],
    ) -> PlatformResult<()>;
}
