//! Snapshot model and JSON serializer.
//!
//! A [`Snapshot`] is the portable document: roles, categories and channels of
//! one server at one point in time. Role order is fixed as ascending display
//! rank, lowest first (so `@everyone` leads) and highest authority last.
//!
//! Fields a document may omit are `Option`s: an absent value means "leave the
//! target as it is" during reconciliation, and it stays absent when the
//! document is written back out.

use crate::PermissionOverwriteSet;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use mirror_error::{SnapshotError, SnapshotErrorKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Top-level keys every document must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["roles", "categories", "channels"];

/// Source-server metadata.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(default, setter(into, strip_option))]
pub struct SnapshotMeta {
    /// Source server id
    #[serde(default, alias = "guild_id", skip_serializing_if = "Option::is_none")]
    pub(crate) server_id: Option<u64>,
    /// Source server name
    #[serde(default, alias = "guild_name", skip_serializing_if = "Option::is_none")]
    pub(crate) server_name: Option<String>,
    /// When the snapshot was captured
    #[serde(default, alias = "snapshot_at", skip_serializing_if = "Option::is_none")]
    pub(crate) captured_at: Option<DateTime<Utc>>,
    /// Source server owner id
    #[serde(default, alias = "owner_id", skip_serializing_if = "Option::is_none")]
    pub(crate) owner_id: Option<u64>,
}

/// One role of the source server.
///
/// `name` is the durable cross-server key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct RoleRecord {
    /// Source-side id (0 when the document omits it)
    #[serde(default)]
    #[builder(default)]
    pub(crate) id: u64,
    /// Role name
    pub(crate) name: String,
    /// Display rank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) position: Option<u32>,
    /// Packed RGB color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) color: Option<u32>,
    /// Shown separately in the member list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) hoist: Option<bool>,
    /// Anyone may mention it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) mentionable: Option<bool>,
    /// Platform-owned; never created, edited or deleted
    #[serde(default)]
    #[builder(default)]
    pub(crate) managed: bool,
    /// Permission bitfield
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) permissions: Option<u64>,
}

/// One category of the source server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct CategoryRecord {
    /// Source-side id
    #[serde(default)]
    #[builder(default)]
    pub(crate) id: u64,
    /// Category name
    pub(crate) name: String,
    /// Display rank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) position: Option<u32>,
    /// Age-restricted
    #[serde(default)]
    #[builder(default)]
    pub(crate) nsfw: bool,
    /// Role overwrites
    #[serde(default)]
    #[builder(default)]
    pub(crate) overwrites: PermissionOverwriteSet,
}

/// Channel kind recorded in a snapshot.
///
/// Kind strings match regardless of ASCII case; unknown ones read as
/// [`ChannelKind::Text`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ChannelKind {
    /// Text channel
    #[default]
    #[strum(to_string = "text", serialize = "news", serialize = "announcement")]
    Text,
    /// Voice channel
    Voice,
    /// Forum channel
    Forum,
    /// Stage channel
    #[strum(to_string = "stage", serialize = "stage_voice")]
    Stage,
}

impl RoleRecord {
    /// Creates a new role record builder.
    pub fn builder() -> RoleRecordBuilder {
        RoleRecordBuilder::default()
    }
}

impl CategoryRecord {
    /// Creates a new category record builder.
    pub fn builder() -> CategoryRecordBuilder {
        CategoryRecordBuilder::default()
    }
}

impl ChannelKind {
    /// Document spelling of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Text => "text",
            ChannelKind::Voice => "voice",
            ChannelKind::Forum => "forum",
            ChannelKind::Stage => "stage",
        }
    }

    /// Whether topic, nsfw and slowmode apply to this kind.
    pub fn is_text_like(&self) -> bool {
        matches!(self, ChannelKind::Text | ChannelKind::Forum)
    }
}

impl Serialize for ChannelKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChannelKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(|s| {
                ChannelKind::from_str(s).unwrap_or_else(|_| {
                    debug!(kind = s, "Unknown channel kind, treating as text");
                    ChannelKind::Text
                })
            })
            .unwrap_or_default())
    }
}

/// One non-category channel of the source server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct ChannelRecord {
    /// Source-side id
    #[serde(default)]
    #[builder(default)]
    pub(crate) id: u64,
    /// Channel name
    pub(crate) name: String,
    /// Channel kind
    #[serde(rename = "type", default)]
    #[builder(default)]
    pub(crate) kind: ChannelKind,
    /// Display rank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) position: Option<u32>,
    /// Source-side parent category id
    #[serde(default, alias = "parent_id")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) parent_id: Option<u64>,
    /// Role overwrites
    #[serde(default)]
    #[builder(default)]
    pub(crate) overwrites: PermissionOverwriteSet,
    /// Age-restricted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) nsfw: Option<bool>,
    /// Slowmode in seconds
    #[serde(default, alias = "slowmode_delay", skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) slowmode_delay: Option<u32>,
    /// Topic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub(crate) topic: Option<String>,
}

/// Serialized point-in-time capture of a server's structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct Snapshot {
    /// Source-server metadata
    #[serde(default)]
    #[builder(default)]
    pub(crate) meta: SnapshotMeta,
    /// Roles in ascending rank order
    #[builder(default)]
    pub(crate) roles: Vec<RoleRecord>,
    /// Categories
    #[builder(default)]
    pub(crate) categories: Vec<CategoryRecord>,
    /// Non-category channels
    #[builder(default)]
    pub(crate) channels: Vec<ChannelRecord>,
}

impl ChannelRecord {
    /// Creates a new channel record builder.
    pub fn builder() -> ChannelRecordBuilder {
        ChannelRecordBuilder::default()
    }
}

impl Snapshot {
    /// Creates a new snapshot builder.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Encode as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| SnapshotError::new(SnapshotErrorKind::Encode(e.to_string())))
    }

    /// Decode a document.
    ///
    /// Unknown fields are tolerated; `meta` may be absent.
    ///
    /// # Errors
    ///
    /// Returns a malformed-document error if the payload is not JSON, is not
    /// an object, lacks one of [`REQUIRED_KEYS`], or has a field of the
    /// wrong shape.
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn from_json(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        let object = value.as_object().ok_or_else(|| {
            SnapshotError::new(SnapshotErrorKind::Malformed(
                "top-level value is not an object".to_string(),
            ))
        })?;

        for key in REQUIRED_KEYS {
            if !object.contains_key(key) {
                return Err(SnapshotError::new(SnapshotErrorKind::MissingKey(
                    key.to_string(),
                )));
            }
        }

        let snapshot: Snapshot = serde_json::from_value(value)?;
        debug!(
            roles = snapshot.roles.len(),
            categories = snapshot.categories.len(),
            channels = snapshot.channels.len(),
            "Decoded snapshot document"
        );
        Ok(snapshot)
    }

    /// Human-readable count line.
    pub fn summary(&self) -> String {
        format!(
            "Roles: {} · Categories: {} · Channels: {}",
            self.roles.len(),
            self.categories.len(),
            self.channels.len()
        )
    }

    /// Source role id → name table. Records without an id are left out.
    pub fn role_names_by_id(&self) -> HashMap<u64, String> {
        self.roles
            .iter()
            .filter(|r| r.id != 0)
            .map(|r| (r.id, r.name.clone()))
            .collect()
    }

    /// Source category id → name table. Records without an id are left out.
    pub fn category_names_by_id(&self) -> HashMap<u64, String> {
        self.categories
            .iter()
            .filter(|c| c.id != 0)
            .map(|c| (c.id, c.name.clone()))
            .collect()
    }
}
