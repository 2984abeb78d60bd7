//! Apply executor.
//!
//! Runs a [`ChangePlan`] against a [`GuildPlatform`] in dependency order:
//! roles, then categories, then channels. Each phase starts from a fresh
//! read of the target. A failing call is counted and the run moves on.

use crate::resolver::native_overwrites;
use crate::{ApplyResults, ChangePlan, OverwriteMap};
use mirror_core::{GuildState, LiveChannelKind, OverwriteSubject};
use mirror_error::PlatformResult;
use mirror_interface::{ChannelEdit, ChannelSpec, GuildPlatform, RoleEdit, RoleSpec};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Apply `plan` to the guild behind `platform`.
///
/// `target` is the state the plan was computed from; it stands in whenever
/// re-reading the guild fails.
#[instrument(skip_all, fields(guild_id = platform.guild_id(), operations = plan.len()))]
pub async fn apply<P>(plan: &ChangePlan, target: &GuildState, platform: &P) -> ApplyResults
where
    P: GuildPlatform + ?Sized,
{
    let mut results = ApplyResults::default();
    let mut state = target.clone();

    refresh(platform, &mut state).await;
    apply_roles(plan, platform, &mut state, &mut results).await;

    refresh(platform, &mut state).await;
    let categories = apply_categories(plan, platform, &mut state, &mut results).await;

    refresh(platform, &mut state).await;
    apply_channels(plan, platform, &mut state, &categories, &mut results).await;

    info!(
        roles_created = results.roles_created,
        roles_updated = results.roles_updated,
        roles_repositioned = results.roles_repositioned,
        roles_deleted = results.roles_deleted,
        categories_created = results.categories_created,
        channels_created = results.channels_created,
        channels_updated = results.channels_updated,
        errors = results.errors,
        "Apply finished"
    );
    results
}

async fn refresh<P>(platform: &P, state: &mut GuildState)
where
    P: GuildPlatform + ?Sized,
{
    match platform.fetch_state().await {
        Ok(fresh) => *state = fresh,
        Err(e) => warn!(error = %e, "Re-reading guild failed, continuing with tracked state"),
    }
}

async fn apply_roles<P>(
    plan: &ChangePlan,
    platform: &P,
    state: &mut GuildState,
    results: &mut ApplyResults,
) where
    P: GuildPlatform + ?Sized,
{
    let mut created: HashMap<&str, u64> = HashMap::new();

    for create in plan.roles_to_create() {
        let spec = RoleSpec {
            name: create.name.clone(),
            color: create.color,
            hoist: create.hoist,
            mentionable: create.mentionable,
            permissions: create.permissions,
        };
        match platform.create_role(&spec).await {
            Ok(role) => {
                results.roles_created += 1;
                created.insert(create.name.as_str(), role.id);
                state.roles.push(role);
            }
            Err(e) => {
                results.errors += 1;
                warn!(role = %create.name, error = %e, "Failed to create role");
            }
        }
    }

    for update in plan.roles_to_update() {
        let edit = RoleEdit {
            color: update.color,
            hoist: update.hoist,
            mentionable: update.mentionable,
            permissions: update.permissions,
        };
        match platform.edit_role(update.id, &edit).await {
            Ok(_) => results.roles_updated += 1,
            Err(e) => {
                results.errors += 1;
                warn!(role = %update.name, error = %e, "Failed to update role");
            }
        }
    }

    let positions: Vec<(u64, u32)> = plan
        .role_position_assignments()
        .iter()
        .filter_map(|assignment| {
            let id = assignment
                .id
                .or_else(|| created.get(assignment.name.as_str()).copied());
            if id.is_none() {
                debug!(role = %assignment.name, "Role was not created, skipping its position");
            }
            id.map(|id| (id, assignment.position))
        })
        .collect();
    if !positions.is_empty() {
        match platform.set_role_positions(&positions).await {
            Ok(()) => results.roles_repositioned += positions.len(),
            Err(e) => {
                results.errors += 1;
                warn!(error = %e, "Failed to reposition roles");
            }
        }
    }

    for deletion in plan.roles_to_delete() {
        match platform.delete_role(deletion.id).await {
            Ok(()) => {
                results.roles_deleted += 1;
                state.roles.retain(|r| r.id != deletion.id);
            }
            Err(e) => {
                results.errors += 1;
                warn!(role = %deletion.name, error = %e, "Failed to delete role");
            }
        }
    }
}

async fn apply_categories<'p, P>(
    plan: &'p ChangePlan,
    platform: &P,
    state: &mut GuildState,
    results: &mut ApplyResults,
) -> HashMap<&'p str, u64>
where
    P: GuildPlatform + ?Sized,
{
    let mut created: HashMap<&str, u64> = HashMap::new();

    for create in plan.categories_to_create() {
        let spec = ChannelSpec {
            position: create.position,
            nsfw: Some(create.nsfw),
            ..ChannelSpec::category(create.name.clone())
        };
        match platform.create_channel(&spec).await {
            Ok(category) => {
                results.categories_created += 1;
                created.insert(create.name.as_str(), category.id);
                state.channels.push(category);
            }
            Err(e) => {
                results.errors += 1;
                warn!(category = %create.name, error = %e, "Failed to create category");
            }
        }
    }

    refresh(platform, state).await;

    let pending = plan
        .categories_to_create()
        .iter()
        .filter(|c| !c.overwrites.is_empty())
        .filter_map(|c| created.get(c.name.as_str()).map(|id| (*id, &c.name, &c.overwrites)));
    let drifted = plan
        .category_overwrite_updates()
        .iter()
        .map(|u| (u.id, &u.name, &u.overwrites));

    for (id, name, overwrites) in pending.chain(drifted) {
        match replace_overwrites(platform, state, id, overwrites).await {
            Ok(()) => results.category_overwrites_set += 1,
            Err(e) => {
                results.errors += 1;
                warn!(category = %name, error = %e, "Failed to set category overwrites");
            }
        }
    }

    created
}

async fn apply_channels<P>(
    plan: &ChangePlan,
    platform: &P,
    state: &mut GuildState,
    categories: &HashMap<&str, u64>,
    results: &mut ApplyResults,
) where
    P: GuildPlatform + ?Sized,
{
    let mut created: HashMap<&str, u64> = HashMap::new();

    for create in plan.channels_to_create() {
        let parent_id = create
            .parent
            .as_deref()
            .and_then(|name| category_id(state, categories, name));
        if create.parent.is_some() && parent_id.is_none() {
            debug!(channel = %create.name, "Parent category missing, creating at top level");
        }

        let spec = ChannelSpec {
            name: create.name.clone(),
            kind: LiveChannelKind::from(create.kind),
            parent_id,
            position: create.position,
            topic: create.topic.clone(),
            nsfw: create.nsfw,
            slowmode_delay: create.slowmode_delay,
        };
        match platform.create_channel(&spec).await {
            Ok(channel) => {
                results.channels_created += 1;
                created.insert(create.name.as_str(), channel.id);
                state.channels.push(channel);
            }
            Err(e) => {
                results.errors += 1;
                warn!(channel = %create.name, error = %e, "Failed to create channel");
            }
        }
    }

    for update in plan
        .channel_overwrite_updates()
        .iter()
        .filter(|u| u.has_property_changes())
    {
        let parent_id = match &update.parent {
            None => None,
            Some(None) => Some(None),
            Some(Some(name)) => match category_id(state, categories, name) {
                Some(id) => Some(Some(id)),
                None => {
                    debug!(channel = %update.name, category = %name, "Parent category missing, leaving parent as is");
                    None
                }
            },
        };
        let edit = ChannelEdit {
            position: update.position,
            parent_id,
            topic: update.topic.clone(),
            nsfw: update.nsfw,
            slowmode_delay: update.slowmode_delay,
        };
        if edit.is_empty() {
            continue;
        }
        match platform.edit_channel(update.id, &edit).await {
            Ok(_) => results.channels_updated += 1,
            Err(e) => {
                results.errors += 1;
                warn!(channel = %update.name, error = %e, "Failed to update channel");
            }
        }
    }

    refresh(platform, state).await;

    let pending = plan
        .channels_to_create()
        .iter()
        .filter(|c| !c.overwrites.is_empty())
        .filter_map(|c| created.get(c.name.as_str()).map(|id| (*id, &c.name, &c.overwrites)));
    let drifted = plan
        .channel_overwrite_updates()
        .iter()
        .filter_map(|u| u.overwrites.as_ref().map(|o| (u.id, &u.name, o)));

    for (id, name, overwrites) in pending.chain(drifted) {
        match replace_overwrites(platform, state, id, overwrites).await {
            Ok(()) => results.channel_overwrites_set += 1,
            Err(e) => {
                results.errors += 1;
                warn!(channel = %name, error = %e, "Failed to set channel overwrites");
            }
        }
    }
}

fn category_id(state: &GuildState, created: &HashMap<&str, u64>, name: &str) -> Option<u64> {
    created
        .get(name)
        .copied()
        .or_else(|| state.category_named(name).map(|c| c.id))
}

/// Replace a channel's role overwrites, keeping any member overwrites it has.
async fn replace_overwrites<P>(
    platform: &P,
    state: &GuildState,
    channel_id: u64,
    desired: &OverwriteMap,
) -> PlatformResult<()>
where
    P: GuildPlatform + ?Sized,
{
    let mut overwrites = native_overwrites(state, desired);
    if let Some(channel) = state.channel(channel_id) {
        overwrites.extend(
            channel
                .overwrites
                .iter()
                .filter(|ow| matches!(ow.subject, OverwriteSubject::Member(_)))
                .copied(),
        );
    }
    platform.set_overwrites(channel_id, &overwrites).await
}
