//! Name/identity resolution between snapshot and target.
//!
//! Snapshot ids are not portable across servers, names are. A role subject
//! resolves by target id first, then by the target's own id (the `@everyone`
//! role), then through the snapshot's id→name table and a name lookup in the
//! target. Anything still unresolved is dropped, never guessed.
//!
//! When two target entities share a name, the first in enumeration order
//! `(position, id)` wins.

use crate::OverwriteMap;
use mirror_core::permission::decode;
use mirror_core::{
    ChannelRecord, EVERYONE_ROLE_NAME, GuildState, LiveChannel, LiveRole, NativeOverwrite,
    OverwriteSubject, PermissionOverwriteSet, Snapshot, SubjectRef,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Maps snapshot-side references onto a target guild.
///
/// Pending names stand for entities a plan will create; planning-time
/// lookups treat them as present so the plan does not depend on creation
/// order.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    target: &'a GuildState,
    role_names: HashMap<u64, String>,
    category_names: HashMap<u64, String>,
    pending_roles: HashSet<String>,
    pending_categories: HashSet<String>,
}

impl<'a> Resolver<'a> {
    /// Resolver over `target` using the snapshot's id→name tables.
    pub fn new(target: &'a GuildState, snapshot: &Snapshot) -> Self {
        Self {
            target,
            role_names: snapshot.role_names_by_id(),
            category_names: snapshot.category_names_by_id(),
            pending_roles: HashSet::new(),
            pending_categories: HashSet::new(),
        }
    }

    /// Treat these role names as present.
    pub fn with_pending_roles<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending_roles.extend(names.into_iter().map(Into::into));
        self
    }

    /// Treat these category names as present.
    pub fn with_pending_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending_categories
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Resolve a role subject to a target role.
    ///
    /// Member subjects never resolve.
    pub fn resolve_role(&self, subject: &SubjectRef) -> Option<&'a LiveRole> {
        let SubjectRef::Role(id) = *subject else {
            return None;
        };

        if let Some(role) = self.target.role(id) {
            return Some(role);
        }
        if id == self.target.id {
            return self
                .target
                .everyone_role()
                .or_else(|| self.target.role_named(EVERYONE_ROLE_NAME));
        }
        let resolved = self
            .role_names
            .get(&id)
            .and_then(|name| self.target.role_named(name));
        if resolved.is_none() {
            debug!(role_id = id, "Role subject did not resolve");
        }
        resolved
    }

    /// Name a role subject will carry on the target, counting pending roles.
    pub fn role_name(&self, subject: &SubjectRef) -> Option<String> {
        if let Some(role) = self.resolve_role(subject) {
            return Some(role.name.clone());
        }
        let name = self.role_names.get(&subject.id())?;
        (subject.is_role() && self.pending_roles.contains(name)).then(|| name.clone())
    }

    /// Resolve a channel's parent to a target category.
    ///
    /// `None` places the channel at the top level.
    pub fn resolve_category(&self, record: &ChannelRecord) -> Option<&'a LiveChannel> {
        let parent_id = (*record.parent_id())?;

        if let Some(category) = self
            .target
            .channel(parent_id)
            .filter(|c| c.is_category())
        {
            return Some(category);
        }
        let resolved = self
            .category_names
            .get(&parent_id)
            .and_then(|name| self.target.category_named(name));
        if resolved.is_none() {
            debug!(
                channel = %record.name(),
                parent_id,
                "Parent category did not resolve, channel goes top level"
            );
        }
        resolved
    }

    /// Name of a channel's parent category on the target, counting pending
    /// categories.
    pub fn category_name(&self, record: &ChannelRecord) -> Option<String> {
        if let Some(category) = self.resolve_category(record) {
            return Some(category.name.clone());
        }
        let name = self.category_names.get(&(*record.parent_id())?)?;
        self.pending_categories
            .contains(name)
            .then(|| name.clone())
    }

    /// Decode a snapshot overwrite set into role-name keyed bitmasks.
    ///
    /// Member subjects and unresolved roles are dropped, as are entries that
    /// allow and deny nothing.
    pub fn desired_overwrites(&self, set: &PermissionOverwriteSet) -> OverwriteMap {
        let mut desired = OverwriteMap::new();
        for (subject, record) in set.iter() {
            let Some(name) = self.role_name(subject) else {
                debug!(%subject, "Dropping overwrite for unresolved subject");
                continue;
            };
            let pair = decode(record);
            if !pair.is_empty() {
                desired.insert(name, pair);
            }
        }
        desired
    }
}

/// Role overwrites currently on a target channel, keyed by role name.
///
/// Member overwrites and empty pairs are left out. When several target roles
/// share a name, only the overwrite of the role that name resolves to is kept,
/// so the result compares against what [`native_overwrites`] would write.
pub fn live_overwrites(target: &GuildState, overwrites: &[NativeOverwrite]) -> OverwriteMap {
    overwrites
        .iter()
        .filter(|ow| !ow.permissions.is_empty())
        .filter_map(|ow| {
            let OverwriteSubject::Role(id) = ow.subject else {
                return None;
            };
            let role = target.role(id)?;
            if target.role_named(&role.name).map(|r| r.id) != Some(id) {
                debug!(role = %role.name, role_id = id, "Overwrite belongs to a shadowed same-named role, ignoring");
                return None;
            }
            Some((role.name.clone(), ow.permissions))
        })
        .collect()
}

/// Turn role-name keyed bitmasks into native overwrites for `target`.
///
/// Names with no role on the target are dropped.
pub fn native_overwrites(target: &GuildState, desired: &OverwriteMap) -> Vec<NativeOverwrite> {
    desired
        .iter()
        .filter_map(|(name, pair)| match target.role_named(name) {
            Some(role) => Some(NativeOverwrite {
                subject: OverwriteSubject::Role(role.id),
                permissions: *pair,
            }),
            None => {
                debug!(role = %name, "No target role for overwrite, skipping");
                None
            }
        })
        .collect()
}
