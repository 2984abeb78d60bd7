//! Permission codec.
//!
//! Maps between the platform's native overwrite representation (an allow
//! bitmask and a deny bitmask) and the sparse `{permission_name: bool}`
//! record stored in snapshot documents.
//!
//! The vocabulary is fixed to the Discord API v10 permission bits. Bits the
//! vocabulary does not know are dropped when encoding; names it does not
//! know are ignored when decoding.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Canonical permission names and their bit positions.
pub const PERMISSIONS: &[(&str, u32)] = &[
    ("create_instant_invite", 0),
    ("kick_members", 1),
    ("ban_members", 2),
    ("administrator", 3),
    ("manage_channels", 4),
    ("manage_guild", 5),
    ("add_reactions", 6),
    ("view_audit_log", 7),
    ("priority_speaker", 8),
    ("stream", 9),
    ("view_channel", 10),
    ("send_messages", 11),
    ("send_tts_messages", 12),
    ("manage_messages", 13),
    ("embed_links", 14),
    ("attach_files", 15),
    ("read_message_history", 16),
    ("mention_everyone", 17),
    ("use_external_emojis", 18),
    ("view_guild_insights", 19),
    ("connect", 20),
    ("speak", 21),
    ("mute_members", 22),
    ("deafen_members", 23),
    ("move_members", 24),
    ("use_voice_activation", 25),
    ("change_nickname", 26),
    ("manage_nicknames", 27),
    ("manage_roles", 28),
    ("manage_webhooks", 29),
    ("manage_expressions", 30),
    ("use_application_commands", 31),
    ("request_to_speak", 32),
    ("manage_events", 33),
    ("manage_threads", 34),
    ("create_public_threads", 35),
    ("create_private_threads", 36),
    ("use_external_stickers", 37),
    ("send_messages_in_threads", 38),
    ("use_embedded_activities", 39),
    ("moderate_members", 40),
    ("view_creator_monetization_analytics", 41),
    ("use_soundboard", 42),
    ("create_expressions", 43),
    ("create_events", 44),
    ("use_external_sounds", 45),
    ("send_voice_messages", 46),
    ("set_voice_channel_status", 48),
    ("send_polls", 49),
    ("use_external_apps", 50),
];

/// Legacy names still found in older documents.
const ALIASES: &[(&str, &str)] = &[
    ("read_messages", "view_channel"),
    ("external_emojis", "use_external_emojis"),
    ("external_stickers", "use_external_stickers"),
    ("use_slash_commands", "use_application_commands"),
    ("manage_emojis", "manage_expressions"),
    ("manage_emojis_and_stickers", "manage_expressions"),
    ("use_public_threads", "create_public_threads"),
    ("use_private_threads", "create_private_threads"),
    ("start_embedded_activities", "use_embedded_activities"),
    ("manage_permissions", "manage_roles"),
];

/// Bit for `administrator`.
pub const ADMINISTRATOR: u64 = 1 << 3;
/// Bit for `manage_guild`.
pub const MANAGE_GUILD: u64 = 1 << 5;

/// Look up the bit for a permission name, accepting legacy aliases.
pub fn bit(name: &str) -> Option<u64> {
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name);

    PERMISSIONS
        .iter()
        .find(|(n, _)| *n == canonical)
        .map(|(_, shift)| 1u64 << shift)
}

/// Ternary value of one permission inside an overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PermissionValue {
    /// Explicitly granted
    #[display("allow")]
    Allow,
    /// Explicitly denied
    #[display("deny")]
    Deny,
    /// No explicit value; inherited from the role
    #[display("inherit")]
    Inherit,
}

/// Sparse permission record: only explicit values are present.
///
/// An absent key means "inherit". A JSON `null` read from an older document
/// is treated as absent and is never written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PermissionRecord(BTreeMap<String, bool>);

impl PermissionRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit value, or clear it with [`PermissionValue::Inherit`].
    pub fn set(&mut self, name: impl Into<String>, value: PermissionValue) {
        let name = name.into();
        match value {
            PermissionValue::Allow => {
                self.0.insert(name, true);
            }
            PermissionValue::Deny => {
                self.0.insert(name, false);
            }
            PermissionValue::Inherit => {
                self.0.remove(&name);
            }
        }
    }

    /// Builder-style [`PermissionRecord::set`].
    pub fn with(mut self, name: impl Into<String>, value: PermissionValue) -> Self {
        self.set(name, value);
        self
    }

    /// Ternary value for a permission name.
    pub fn get(&self, name: &str) -> PermissionValue {
        match self.0.get(name) {
            Some(true) => PermissionValue::Allow,
            Some(false) => PermissionValue::Deny,
            None => PermissionValue::Inherit,
        }
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every permission inherits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate explicit entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<'de> Deserialize<'de> for PermissionRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<BTreeMap<String, Option<bool>>>::deserialize(deserializer)?;
        Ok(Self(
            raw.unwrap_or_default()
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect(),
        ))
    }
}

/// Native overwrite bitmasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionPair {
    /// Explicitly allowed bits
    pub allow: u64,
    /// Explicitly denied bits
    pub deny: u64,
}

impl PermissionPair {
    /// Create a pair from raw bitmasks.
    pub fn new(allow: u64, deny: u64) -> Self {
        Self { allow, deny }
    }

    /// True when the pair grants and denies nothing.
    pub fn is_empty(&self) -> bool {
        self.allow == 0 && self.deny == 0
    }
}

/// Encode native bitmasks into a sparse record.
///
/// Allow wins when a bit is set on both sides, matching how the platform
/// evaluates a single overwrite.
pub fn encode(pair: PermissionPair) -> PermissionRecord {
    let mut record = PermissionRecord::new();
    for (name, shift) in PERMISSIONS {
        let mask = 1u64 << shift;
        if pair.allow & mask != 0 {
            record.set(*name, PermissionValue::Allow);
        } else if pair.deny & mask != 0 {
            record.set(*name, PermissionValue::Deny);
        }
    }
    record
}

/// Decode a sparse record into native bitmasks, ignoring unknown names.
pub fn decode(record: &PermissionRecord) -> PermissionPair {
    let mut pair = PermissionPair::default();
    for (name, value) in record.iter() {
        let Some(mask) = bit(name) else {
            tracing::trace!(permission = name, "Ignoring unknown permission name");
            continue;
        };
        if value {
            pair.allow |= mask;
            pair.deny &= !mask;
        } else if pair.allow & mask == 0 {
            pair.deny |= mask;
        }
    }
    pair
}
