//! In-memory guild platform.

use crate::{ChannelEdit, ChannelSpec, GuildPlatform, RoleEdit, RoleSpec};
use async_trait::async_trait;
use mirror_core::permission::decode;
use mirror_core::{
    EVERYONE_ROLE_NAME, GuildState, LiveChannel, LiveChannelKind, LiveRole, NativeOverwrite,
    OverwriteSubject, PermissionOverwriteSet, Snapshot,
};
use mirror_error::{PlatformError, PlatformErrorKind, PlatformResult};
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// A call on [`MemoryGuild`] that should fail, keyed by entity name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// Reading the guild state
    FetchState,
    /// Creating the named role
    CreateRole(String),
    /// Editing the named role
    EditRole(String),
    /// Deleting the named role
    DeleteRole(String),
    /// Any role repositioning
    RolePositions,
    /// Creating the named channel or category
    CreateChannel(String),
    /// Editing the named channel
    EditChannel(String),
    /// Replacing overwrites on the named channel or category
    SetOverwrites(String),
}

struct Inner {
    state: GuildState,
    next_id: u64,
    mutations: usize,
}

/// [`GuildPlatform`] over an in-memory [`GuildState`].
///
/// Every mutating call is counted, whether or not it succeeds. Calls matching
/// a configured [`FailurePoint`] fail with an API error after being counted.
pub struct MemoryGuild {
    inner: Mutex<Inner>,
    failures: HashSet<FailurePoint>,
}

impl MemoryGuild {
    /// Wrap an existing state.
    pub fn new(mut state: GuildState) -> Self {
        state.normalize();
        let next_id = state
            .roles
            .iter()
            .map(|r| r.id)
            .chain(state.channels.iter().map(|c| c.id))
            .chain(std::iter::once(state.id))
            .max()
            .unwrap_or(0)
            + 1;

        Self {
            inner: Mutex::new(Inner {
                state,
                next_id,
                mutations: 0,
            }),
            failures: HashSet::new(),
        }
    }

    /// Materialize a snapshot as if it were a live guild.
    ///
    /// Source ids are kept, so the snapshot's own overwrite subjects and
    /// parent references resolve by id. Records without an id get a fresh one.
    /// An `@everyone` role is added when the document has none.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let everyone_id = snapshot
            .roles()
            .iter()
            .find(|r| r.name() == EVERYONE_ROLE_NAME && *r.id() != 0)
            .map(|r| *r.id());
        let guild_id = snapshot
            .meta()
            .server_id()
            .or(everyone_id)
            .unwrap_or(1);

        let mut fresh = snapshot
            .roles()
            .iter()
            .map(|r| *r.id())
            .chain(snapshot.categories().iter().map(|c| *c.id()))
            .chain(snapshot.channels().iter().map(|c| *c.id()))
            .chain(std::iter::once(guild_id))
            .max()
            .unwrap_or(0)
            + 1;
        let mut id_or_fresh = |id: u64| {
            if id != 0 {
                id
            } else {
                fresh += 1;
                fresh - 1
            }
        };

        let mut roles: Vec<LiveRole> = snapshot
            .roles()
            .iter()
            .enumerate()
            .map(|(index, r)| LiveRole {
                id: if r.name() == EVERYONE_ROLE_NAME {
                    guild_id
                } else {
                    id_or_fresh(*r.id())
                },
                name: r.name().clone(),
                position: r.position().unwrap_or(index as u32),
                color: r.color().unwrap_or(0),
                hoist: r.hoist().unwrap_or(false),
                mentionable: r.mentionable().unwrap_or(false),
                managed: *r.managed(),
                permissions: r.permissions().unwrap_or(0),
            })
            .collect();

        if !roles.iter().any(|r| r.id == guild_id) {
            roles.push(LiveRole {
                id: guild_id,
                name: EVERYONE_ROLE_NAME.to_string(),
                position: 0,
                color: 0,
                hoist: false,
                mentionable: false,
                managed: false,
                permissions: 0,
            });
        }

        let mut channels: Vec<LiveChannel> = snapshot
            .categories()
            .iter()
            .enumerate()
            .map(|(index, c)| LiveChannel {
                id: id_or_fresh(*c.id()),
                name: c.name().clone(),
                kind: LiveChannelKind::Category,
                position: c.position().unwrap_or(index as u32),
                parent_id: None,
                topic: None,
                nsfw: *c.nsfw(),
                slowmode_delay: 0,
                overwrites: decode_overwrites(c.overwrites()),
            })
            .collect();

        channels.extend(snapshot.channels().iter().enumerate().map(|(index, c)| {
            LiveChannel {
                id: id_or_fresh(*c.id()),
                name: c.name().clone(),
                kind: LiveChannelKind::from(*c.kind()),
                position: c.position().unwrap_or(index as u32),
                parent_id: *c.parent_id(),
                topic: c.topic().clone(),
                nsfw: c.nsfw().unwrap_or(false),
                slowmode_delay: c.slowmode_delay().unwrap_or(0),
                overwrites: decode_overwrites(c.overwrites()),
            }
        }));

        Self::new(GuildState {
            id: guild_id,
            name: snapshot.meta().server_name().clone().unwrap_or_default(),
            owner_id: snapshot.meta().owner_id().unwrap_or(0),
            roles,
            channels,
        })
    }

    /// Make calls matching `point` fail.
    pub fn fail_on(mut self, point: FailurePoint) -> Self {
        self.failures.insert(point);
        self
    }

    /// Current state, normalized.
    pub fn state(&self) -> GuildState {
        let mut state = self.inner.lock().state.clone();
        state.normalize();
        state
    }

    /// Number of mutating calls issued so far.
    pub fn mutation_count(&self) -> usize {
        self.inner.lock().mutations
    }

    fn check(&self, point: FailurePoint) -> PlatformResult<()> {
        if self.failures.contains(&point) {
            debug!(?point, "Injected failure");
            return Err(PlatformError::new(PlatformErrorKind::Api(format!(
                "injected failure: {:?}",
                point
            ))));
        }
        Ok(())
    }
}

fn decode_overwrites(set: &PermissionOverwriteSet) -> Vec<NativeOverwrite> {
    set.iter()
        .map(|(subject, record)| NativeOverwrite {
            subject: match subject {
                mirror_core::SubjectRef::Role(id) => OverwriteSubject::Role(*id),
                mirror_core::SubjectRef::Member(id) => OverwriteSubject::Member(*id),
            },
            permissions: decode(record),
        })
        .collect()
}

#[async_trait]
impl GuildPlatform for MemoryGuild {
    fn guild_id(&self) -> u64 {
        self.inner.lock().state.id
    }

    async fn fetch_state(&self) -> PlatformResult<GuildState> {
        self.check(FailurePoint::FetchState)?;
        Ok(self.state())
    }

    #[instrument(skip(self, spec), fields(name = %spec.name))]
    async fn create_role(&self, spec: &RoleSpec) -> PlatformResult<LiveRole> {
        let mut inner = self.inner.lock();
        inner.mutations += 1;
        self.check(FailurePoint::CreateRole(spec.name.clone()))?;

        let id = inner.next_id;
        inner.next_id += 1;
        let position = inner.state.roles.len() as u32;
        let role = LiveRole {
            id,
            name: spec.name.clone(),
            position,
            color: spec.color,
            hoist: spec.hoist,
            mentionable: spec.mentionable,
            managed: false,
            permissions: spec.permissions.unwrap_or(0),
        };
        inner.state.roles.push(role.clone());
        Ok(role)
    }

    #[instrument(skip(self, edit))]
    async fn edit_role(&self, role_id: u64, edit: &RoleEdit) -> PlatformResult<LiveRole> {
        let mut inner = self.inner.lock();
        inner.mutations += 1;
        let role = inner
            .state
            .roles
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or_else(|| PlatformError::new(PlatformErrorKind::RoleNotFound(role_id)))?;
        self.check(FailurePoint::EditRole(role.name.clone()))?;

        if let Some(color) = edit.color {
            role.color = color;
        }
        if let Some(hoist) = edit.hoist {
            role.hoist = hoist;
        }
        if let Some(mentionable) = edit.mentionable {
            role.mentionable = mentionable;
        }
        if let Some(permissions) = edit.permissions {
            role.permissions = permissions;
        }
        Ok(role.clone())
    }

    #[instrument(skip(self, positions), fields(count = positions.len()))]
    async fn set_role_positions(&self, positions: &[(u64, u32)]) -> PlatformResult<()> {
        let mut inner = self.inner.lock();
        inner.mutations += 1;
        self.check(FailurePoint::RolePositions)?;

        for (role_id, position) in positions {
            let role = inner
                .state
                .roles
                .iter_mut()
                .find(|r| r.id == *role_id)
                .ok_or_else(|| PlatformError::new(PlatformErrorKind::RoleNotFound(*role_id)))?;
            role.position = *position;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_role(&self, role_id: u64) -> PlatformResult<()> {
        let mut inner = self.inner.lock();
        inner.mutations += 1;
        let index = inner
            .state
            .roles
            .iter()
            .position(|r| r.id == role_id)
            .ok_or_else(|| PlatformError::new(PlatformErrorKind::RoleNotFound(role_id)))?;
        self.check(FailurePoint::DeleteRole(inner.state.roles[index].name.clone()))?;

        inner.state.roles.remove(index);
        for channel in inner.state.channels.iter_mut() {
            channel
                .overwrites
                .retain(|ow| ow.subject != OverwriteSubject::Role(role_id));
        }
        Ok(())
    }

    #[instrument(skip(self, spec), fields(name = %spec.name, kind = %spec.kind))]
    async fn create_channel(&self, spec: &ChannelSpec) -> PlatformResult<LiveChannel> {
        let mut inner = self.inner.lock();
        inner.mutations += 1;
        self.check(FailurePoint::CreateChannel(spec.name.clone()))?;

        if let Some(parent_id) = spec.parent_id
            && !inner.state.categories().any(|c| c.id == parent_id)
        {
            return Err(PlatformError::new(PlatformErrorKind::ChannelNotFound(
                parent_id,
            )));
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let position = spec.position.unwrap_or(inner.state.channels.len() as u32);
        let channel = LiveChannel {
            id,
            name: spec.name.clone(),
            kind: spec.kind,
            position,
            parent_id: spec.parent_id,
            topic: spec.topic.clone(),
            nsfw: spec.nsfw.unwrap_or(false),
            slowmode_delay: spec.slowmode_delay.unwrap_or(0),
            overwrites: Vec::new(),
        };
        inner.state.channels.push(channel.clone());
        Ok(channel)
    }

    #[instrument(skip(self, edit))]
    async fn edit_channel(
        &self,
        channel_id: u64,
        edit: &ChannelEdit,
    ) -> PlatformResult<LiveChannel> {
        let mut inner = self.inner.lock();
        inner.mutations += 1;

        if let Some(Some(parent_id)) = edit.parent_id
            && !inner.state.categories().any(|c| c.id == parent_id)
        {
            return Err(PlatformError::new(PlatformErrorKind::ChannelNotFound(
                parent_id,
            )));
        }

        let channel = inner
            .state
            .channels
            .iter_mut()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| PlatformError::new(PlatformErrorKind::ChannelNotFound(channel_id)))?;
        self.check(FailurePoint::EditChannel(channel.name.clone()))?;

        if let Some(position) = edit.position {
            channel.position = position;
        }
        if let Some(parent_id) = edit.parent_id {
            channel.parent_id = parent_id;
        }
        if let Some(topic) = &edit.topic {
            channel.topic = Some(topic.clone());
        }
        if let Some(nsfw) = edit.nsfw {
            channel.nsfw = nsfw;
        }
        if let Some(slowmode_delay) = edit.slowmode_delay {
            channel.slowmode_delay = slowmode_delay;
        }
        Ok(channel.clone())
    }

    #[instrument(skip(self, overwrites), fields(count = overwrites.len()))]
    async fn set_overwrites(
        &self,
        channel_id: u64,
        overwrites: &[NativeOverwrite],
    ) -> PlatformResult<()> {
        let mut inner = self.inner.lock();
        inner.mutations += 1;

        for ow in overwrites {
            if let OverwriteSubject::Role(role_id) = ow.subject
                && inner.state.role(role_id).is_none()
            {
                return Err(PlatformError::new(PlatformErrorKind::RoleNotFound(role_id)));
            }
        }

        let channel = inner
            .state
            .channels
            .iter_mut()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| PlatformError::new(PlatformErrorKind::ChannelNotFound(channel_id)))?;
        self.check(FailurePoint::SetOverwrites(channel.name.clone()))?;

        channel.overwrites = overwrites.to_vec();
        Ok(())
    }
}
