//! The change plan produced by the diff planner.
//!
//! Entries are keyed by entity name. Overwrites are carried as
//! [`OverwriteMap`]s keyed by role name, so a plan built before the roles it
//! references exist can still be applied once they do.

use derive_getters::Getters;
use mirror_core::{ChannelKind, PermissionPair};
use std::collections::{BTreeMap, BTreeSet};

/// Desired role overwrites, keyed by role name.
pub type OverwriteMap = BTreeMap<String, PermissionPair>;

/// A role property that differs between snapshot and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RoleField {
    /// Packed RGB color
    Color,
    /// Member-list separation
    Hoist,
    /// Mentionability
    Mentionable,
    /// Permission bitfield
    Permissions,
}

/// A channel property that differs between snapshot and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ChannelField {
    /// Display rank
    Position,
    /// Parent category
    Parent,
    /// Whole overwrite set
    Overwrites,
    /// Topic
    Topic,
    /// Age restriction
    Nsfw,
    /// Slowmode delay
    Slowmode,
}

/// A role to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCreate {
    /// Role name
    pub name: String,
    /// Packed RGB color
    pub color: u32,
    /// Shown separately in the member list
    pub hoist: bool,
    /// Anyone may mention it
    pub mentionable: bool,
    /// Permission bitfield, when it should be applied
    pub permissions: Option<u64>,
}

/// An existing role whose properties drifted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleUpdate {
    /// Target role id
    pub id: u64,
    /// Role name
    pub name: String,
    /// Changed properties
    pub fields: BTreeSet<RoleField>,
    /// Desired color
    pub color: Option<u32>,
    /// Desired hoist flag
    pub hoist: Option<bool>,
    /// Desired mentionable flag
    pub mentionable: Option<bool>,
    /// Desired permission bitfield
    pub permissions: Option<u64>,
}

/// A display rank for a role that exists or is about to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePosition {
    /// Role name
    pub name: String,
    /// Target role id; `None` for a role the plan creates
    pub id: Option<u64>,
    /// Desired rank
    pub position: u32,
}

/// A target role absent from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDeletion {
    /// Target role id
    pub id: u64,
    /// Role name
    pub name: String,
}

/// A category to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCreate {
    /// Category name
    pub name: String,
    /// Display rank
    pub position: Option<u32>,
    /// Age-restricted
    pub nsfw: bool,
    /// Overwrites to set once created
    pub overwrites: OverwriteMap,
}

/// An existing category whose overwrites drifted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteUpdate {
    /// Target category id
    pub id: u64,
    /// Category name
    pub name: String,
    /// Replacement overwrites
    pub overwrites: OverwriteMap,
}

/// A channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCreate {
    /// Channel name
    pub name: String,
    /// Channel kind
    pub kind: ChannelKind,
    /// Parent category name
    pub parent: Option<String>,
    /// Display rank
    pub position: Option<u32>,
    /// Topic (text-like kinds only)
    pub topic: Option<String>,
    /// Age restriction (text-like kinds only)
    pub nsfw: Option<bool>,
    /// Slowmode (text-like kinds only)
    pub slowmode_delay: Option<u32>,
    /// Overwrites to set once created
    pub overwrites: OverwriteMap,
}

/// An existing channel whose properties or overwrites drifted.
///
/// Only the fields named in `fields` carry values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUpdate {
    /// Target channel id
    pub id: u64,
    /// Channel name
    pub name: String,
    /// Changed properties
    pub fields: BTreeSet<ChannelField>,
    /// Desired rank
    pub position: Option<u32>,
    /// Desired parent category name; `Some(None)` means top level
    pub parent: Option<Option<String>>,
    /// Desired topic
    pub topic: Option<String>,
    /// Desired age restriction
    pub nsfw: Option<bool>,
    /// Desired slowmode
    pub slowmode_delay: Option<u32>,
    /// Replacement overwrites
    pub overwrites: Option<OverwriteMap>,
}

impl ChannelUpdate {
    /// True when anything besides the overwrites changed.
    pub fn has_property_changes(&self) -> bool {
        self.fields.iter().any(|f| *f != ChannelField::Overwrites)
    }
}

/// Operations that converge a target toward a snapshot, in apply order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct ChangePlan {
    pub(crate) roles_to_create: Vec<RoleCreate>,
    pub(crate) roles_to_update: Vec<RoleUpdate>,
    pub(crate) role_position_assignments: Vec<RolePosition>,
    pub(crate) roles_to_delete: Vec<RoleDeletion>,
    pub(crate) categories_to_create: Vec<CategoryCreate>,
    pub(crate) category_overwrite_updates: Vec<OverwriteUpdate>,
    pub(crate) channels_to_create: Vec<ChannelCreate>,
    pub(crate) channel_overwrite_updates: Vec<ChannelUpdate>,
}

impl ChangePlan {
    /// True when the target already matches.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of planned entries across all buckets.
    pub fn len(&self) -> usize {
        self.roles_to_create.len()
            + self.roles_to_update.len()
            + self.role_position_assignments.len()
            + self.roles_to_delete.len()
            + self.categories_to_create.len()
            + self.category_overwrite_updates.len()
            + self.channels_to_create.len()
            + self.channel_overwrite_updates.len()
    }

    /// Names of roles to create, in plan order.
    pub fn role_creates(&self) -> Vec<&str> {
        self.roles_to_create.iter().map(|r| r.name.as_str()).collect()
    }

    /// Names of roles to update, in plan order.
    pub fn role_updates(&self) -> Vec<&str> {
        self.roles_to_update.iter().map(|r| r.name.as_str()).collect()
    }

    /// Names of roles to delete, in plan order.
    pub fn role_deletes(&self) -> Vec<&str> {
        self.roles_to_delete.iter().map(|r| r.name.as_str()).collect()
    }

    /// Names of categories to create, in plan order.
    pub fn category_creates(&self) -> Vec<&str> {
        self.categories_to_create
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Names of channels to create, in plan order.
    pub fn channel_creates(&self) -> Vec<&str> {
        self.channels_to_create
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Names of channels flagged for a property or overwrite update.
    pub fn channel_updates(&self) -> Vec<&str> {
        self.channel_overwrite_updates
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }
}
