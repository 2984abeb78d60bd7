//! Diff planner.

use crate::resolver::live_overwrites;
use crate::{
    CategoryCreate, ChangePlan, ChannelCreate, ChannelField, ChannelUpdate, OverwriteUpdate,
    ReconcileOptions, Resolver, RoleCreate, RoleDeletion, RoleField, RolePosition, RoleUpdate,
};
use mirror_core::{
    ChannelRecord, EVERYONE_ROLE_NAME, GuildState, LiveChannel, LiveRole, RoleRecord, Snapshot,
};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, info, instrument};

/// Pairs snapshot entries with target entities of the same name.
///
/// The n-th snapshot entry with a given name takes the n-th target entity
/// with that name in enumeration order, so a lone snapshot entry always
/// matches the first target entity.
struct NameMatcher<'a, T> {
    by_name: HashMap<&'a str, VecDeque<&'a T>>,
}

impl<'a, T> NameMatcher<'a, T> {
    fn new(items: impl Iterator<Item = &'a T>, name: impl Fn(&'a T) -> &'a str) -> Self {
        let mut by_name: HashMap<&'a str, VecDeque<&'a T>> = HashMap::new();
        for item in items {
            by_name.entry(name(item)).or_default().push_back(item);
        }
        Self { by_name }
    }

    fn claim(&mut self, name: &str) -> Option<&'a T> {
        self.by_name.get_mut(name)?.pop_front()
    }
}

enum RoleMatch<'a> {
    Skip,
    Create,
    Existing(&'a LiveRole),
}

/// Compute the operations that converge `target` toward `snapshot`.
///
/// Deterministic for identical inputs; an empty plan means the target
/// already matches by name and compared attributes.
#[instrument(skip_all, fields(guild_id = target.id, guild_name = %target.name))]
pub fn plan(snapshot: &Snapshot, target: &GuildState, options: &ReconcileOptions) -> ChangePlan {
    let mut target = target.clone();
    target.normalize();

    let mut plan = ChangePlan::default();
    plan_roles(snapshot, &target, options, &mut plan);

    let resolver = Resolver::new(&target, snapshot)
        .with_pending_roles(plan.roles_to_create.iter().map(|r| r.name.clone()));
    plan_categories(snapshot, &target, &resolver, &mut plan);

    let resolver =
        resolver.with_pending_categories(plan.categories_to_create.iter().map(|c| c.name.clone()));
    plan_channels(snapshot, &target, &resolver, &mut plan);

    info!(
        roles_to_create = plan.roles_to_create.len(),
        roles_to_update = plan.roles_to_update.len(),
        role_positions = plan.role_position_assignments.len(),
        roles_to_delete = plan.roles_to_delete.len(),
        categories_to_create = plan.categories_to_create.len(),
        category_overwrite_updates = plan.category_overwrite_updates.len(),
        channels_to_create = plan.channels_to_create.len(),
        channel_updates = plan.channel_overwrite_updates.len(),
        "Planned changes"
    );
    plan
}

fn plan_roles(
    snapshot: &Snapshot,
    target: &GuildState,
    options: &ReconcileOptions,
    plan: &mut ChangePlan,
) {
    let mut matcher = NameMatcher::new(target.roles.iter(), |r| r.name.as_str());
    let compare_permissions = *options.compare_role_permissions();

    let matches: Vec<(&RoleRecord, RoleMatch<'_>)> = snapshot
        .roles()
        .iter()
        .map(|record| {
            if record.name() == EVERYONE_ROLE_NAME || *record.managed() {
                debug!(role = %record.name(), "Skipping implicit or managed role");
                return (record, RoleMatch::Skip);
            }
            match matcher.claim(record.name()) {
                None => (record, RoleMatch::Create),
                Some(live) if live.managed || target.is_everyone(live) => {
                    debug!(role = %live.name, "Target role is not editable, skipping");
                    (record, RoleMatch::Skip)
                }
                Some(live) => (record, RoleMatch::Existing(live)),
            }
        })
        .collect();

    for (record, matched) in &matches {
        match matched {
            RoleMatch::Skip => {}
            RoleMatch::Create => plan.roles_to_create.push(RoleCreate {
                name: record.name().clone(),
                color: record.color().unwrap_or(0),
                hoist: record.hoist().unwrap_or(false),
                mentionable: record.mentionable().unwrap_or(false),
                permissions: if compare_permissions {
                    *record.permissions()
                } else {
                    None
                },
            }),
            RoleMatch::Existing(live) => {
                if let Some(update) = role_update(record, live, compare_permissions) {
                    plan.roles_to_update.push(update);
                }
            }
        }
    }

    let mut ranked: Vec<&(&RoleRecord, RoleMatch<'_>)> = matches
        .iter()
        .filter(|(record, matched)| {
            record.position().is_some() && !matches!(matched, RoleMatch::Skip)
        })
        .collect();
    ranked.sort_by_key(|(record, _)| record.position().unwrap_or(0));

    for (record, matched) in ranked {
        let position = record.position().unwrap_or(0);
        match matched {
            RoleMatch::Create => plan.role_position_assignments.push(RolePosition {
                name: record.name().clone(),
                id: None,
                position,
            }),
            RoleMatch::Existing(live) if live.position != position => {
                plan.role_position_assignments.push(RolePosition {
                    name: record.name().clone(),
                    id: Some(live.id),
                    position,
                })
            }
            _ => {}
        }
    }

    if *options.delete_missing_roles() {
        let wanted: HashSet<&str> = snapshot.roles().iter().map(|r| r.name().as_str()).collect();
        plan.roles_to_delete = target
            .roles
            .iter()
            .filter(|live| !target.is_everyone(live) && !live.managed)
            .filter(|live| !wanted.contains(live.name.as_str()))
            .map(|live| RoleDeletion {
                id: live.id,
                name: live.name.clone(),
            })
            .collect();
    }
}

fn role_update(record: &RoleRecord, live: &LiveRole, compare_permissions: bool) -> Option<RoleUpdate> {
    let mut update = RoleUpdate {
        id: live.id,
        name: live.name.clone(),
        fields: BTreeSet::new(),
        color: None,
        hoist: None,
        mentionable: None,
        permissions: None,
    };

    if let Some(color) = *record.color()
        && color != live.color
    {
        update.fields.insert(RoleField::Color);
        update.color = Some(color);
    }
    if let Some(hoist) = *record.hoist()
        && hoist != live.hoist
    {
        update.fields.insert(RoleField::Hoist);
        update.hoist = Some(hoist);
    }
    if let Some(mentionable) = *record.mentionable()
        && mentionable != live.mentionable
    {
        update.fields.insert(RoleField::Mentionable);
        update.mentionable = Some(mentionable);
    }
    if compare_permissions
        && let Some(permissions) = *record.permissions()
        && permissions != live.permissions
    {
        update.fields.insert(RoleField::Permissions);
        update.permissions = Some(permissions);
    }

    (!update.fields.is_empty()).then_some(update)
}

fn plan_categories(
    snapshot: &Snapshot,
    target: &GuildState,
    resolver: &Resolver<'_>,
    plan: &mut ChangePlan,
) {
    let mut matcher = NameMatcher::new(target.categories(), |c| c.name.as_str());

    for record in snapshot.categories() {
        let desired = resolver.desired_overwrites(record.overwrites());
        match matcher.claim(record.name()) {
            None => plan.categories_to_create.push(CategoryCreate {
                name: record.name().clone(),
                position: *record.position(),
                nsfw: *record.nsfw(),
                overwrites: desired,
            }),
            Some(live) => {
                if desired != live_overwrites(target, &live.overwrites) {
                    plan.category_overwrite_updates.push(OverwriteUpdate {
                        id: live.id,
                        name: live.name.clone(),
                        overwrites: desired,
                    });
                }
            }
        }
    }
}

fn plan_channels(
    snapshot: &Snapshot,
    target: &GuildState,
    resolver: &Resolver<'_>,
    plan: &mut ChangePlan,
) {
    let mut matcher = NameMatcher::new(target.plain_channels(), |c| c.name.as_str());

    for record in snapshot.channels() {
        let desired = resolver.desired_overwrites(record.overwrites());
        let parent = resolver.category_name(record);
        let text_like = record.kind().is_text_like();

        match matcher.claim(record.name()) {
            None => plan.channels_to_create.push(ChannelCreate {
                name: record.name().clone(),
                kind: *record.kind(),
                parent,
                position: *record.position(),
                topic: record.topic().clone().filter(|_| text_like),
                nsfw: record.nsfw().filter(|_| text_like),
                slowmode_delay: record.slowmode_delay().filter(|_| text_like),
                overwrites: desired,
            }),
            Some(live) => {
                if let Some(update) = channel_update(record, live, target, parent, desired) {
                    plan.channel_overwrite_updates.push(update);
                }
            }
        }
    }
}

fn channel_update(
    record: &ChannelRecord,
    live: &LiveChannel,
    target: &GuildState,
    parent: Option<String>,
    desired: crate::OverwriteMap,
) -> Option<ChannelUpdate> {
    let mut update = ChannelUpdate {
        id: live.id,
        name: live.name.clone(),
        fields: BTreeSet::new(),
        position: None,
        parent: None,
        topic: None,
        nsfw: None,
        slowmode_delay: None,
        overwrites: None,
    };

    if let Some(position) = *record.position()
        && position != live.position
    {
        update.fields.insert(ChannelField::Position);
        update.position = Some(position);
    }

    let live_parent = live
        .parent_id
        .and_then(|id| target.channel(id))
        .map(|c| c.name.clone());
    if parent != live_parent {
        update.fields.insert(ChannelField::Parent);
        update.parent = Some(parent);
    }

    if desired != live_overwrites(target, &live.overwrites) {
        update.fields.insert(ChannelField::Overwrites);
        update.overwrites = Some(desired);
    }

    if record.kind().is_text_like() && live.kind.is_text_like() {
        if let Some(topic) = record.topic() {
            let wanted = Some(topic.as_str()).filter(|t| !t.is_empty());
            let current = live.topic.as_deref().filter(|t| !t.is_empty());
            if wanted != current {
                update.fields.insert(ChannelField::Topic);
                update.topic = Some(topic.clone());
            }
        }
        if let Some(nsfw) = *record.nsfw()
            && nsfw != live.nsfw
        {
            update.fields.insert(ChannelField::Nsfw);
            update.nsfw = Some(nsfw);
        }
        if let Some(slowmode_delay) = *record.slowmode_delay()
            && slowmode_delay != live.slowmode_delay
        {
            update.fields.insert(ChannelField::Slowmode);
            update.slowmode_delay = Some(slowmode_delay);
        }
    }

    (!update.fields.is_empty()).then_some(update)
}
