//! Tests for the in-memory guild platform.

use mirror_core::{
    CategoryRecord, ChannelKind, ChannelRecord, EVERYONE_ROLE_NAME, GuildState, LiveChannelKind,
    LiveRole, NativeOverwrite, OverwriteSubject, PermissionOverwriteSet, PermissionRecord,
    PermissionValue, RoleRecord, Snapshot, SubjectRef,
};
use mirror_interface::{
    ChannelEdit, ChannelSpec, ConfirmationGate, ConfirmationOutcome, FailurePoint,
    FixedConfirmation, GuildPlatform, MemoryGuild, RoleEdit, RoleSpec,
};

fn role(id: u64, name: &str, position: u32) -> LiveRole {
    LiveRole {
        id,
        name: name.to_string(),
        position,
        color: 0,
        hoist: false,
        mentionable: false,
        managed: false,
        permissions: 0,
    }
}

fn empty_guild() -> MemoryGuild {
    MemoryGuild::new(GuildState {
        id: 100,
        name: "Target".to_string(),
        owner_id: 1,
        roles: vec![role(100, EVERYONE_ROLE_NAME, 0)],
        channels: Vec::new(),
    })
}

#[tokio::test]
async fn test_create_role_assigns_fresh_id() {
    let guild = empty_guild();
    let created = guild
        .create_role(&RoleSpec {
            name: "Mod".to_string(),
            color: 0xff0000,
            ..Default::default()
        })
        .await
        .expect("create role");

    assert_ne!(created.id, 100);
    assert_eq!(created.color, 0xff0000);
    let state = guild.fetch_state().await.expect("fetch");
    assert_eq!(state.role_named("Mod").map(|r| r.id), Some(created.id));
    assert_eq!(guild.mutation_count(), 1);
}

#[tokio::test]
async fn test_edit_role_leaves_unset_fields() {
    let guild = empty_guild();
    let created = guild
        .create_role(&RoleSpec {
            name: "Mod".to_string(),
            hoist: true,
            ..Default::default()
        })
        .await
        .expect("create role");

    let edited = guild
        .edit_role(
            created.id,
            &RoleEdit {
                color: Some(7),
                ..Default::default()
            },
        )
        .await
        .expect("edit role");

    assert_eq!(edited.color, 7);
    assert!(edited.hoist);
}

#[tokio::test]
async fn test_delete_role_strips_its_overwrites() {
    let guild = empty_guild();
    let mod_role = guild
        .create_role(&RoleSpec {
            name: "Mod".to_string(),
            ..Default::default()
        })
        .await
        .expect("create role");
    let general = guild
        .create_channel(&ChannelSpec {
            kind: LiveChannelKind::Text,
            ..ChannelSpec::category("general")
        })
        .await
        .expect("create channel");
    guild
        .set_overwrites(general.id, &[NativeOverwrite::role(mod_role.id, 1 << 11, 0)])
        .await
        .expect("set overwrites");

    guild.delete_role(mod_role.id).await.expect("delete role");

    let state = guild.state();
    assert!(state.role_named("Mod").is_none());
    assert!(state.channel(general.id).expect("channel").overwrites.is_empty());
}

#[tokio::test]
async fn test_overwrites_for_unknown_role_are_rejected() {
    let guild = empty_guild();
    let general = guild
        .create_channel(&ChannelSpec {
            kind: LiveChannelKind::Text,
            ..ChannelSpec::category("general")
        })
        .await
        .expect("create channel");

    let result = guild
        .set_overwrites(general.id, &[NativeOverwrite::role(999_999, 1, 0)])
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_edit_channel_moves_between_categories() {
    let guild = empty_guild();
    let info = guild
        .create_channel(&ChannelSpec::category("Info"))
        .await
        .expect("create category");
    let rules = guild
        .create_channel(&ChannelSpec {
            kind: LiveChannelKind::Text,
            ..ChannelSpec::category("rules")
        })
        .await
        .expect("create channel");

    let moved = guild
        .edit_channel(
            rules.id,
            &ChannelEdit {
                parent_id: Some(Some(info.id)),
                topic: Some("Read me".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("edit channel");
    assert_eq!(moved.parent_id, Some(info.id));
    assert_eq!(moved.topic.as_deref(), Some("Read me"));

    let top = guild
        .edit_channel(
            rules.id,
            &ChannelEdit {
                parent_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .expect("edit channel");
    assert_eq!(top.parent_id, None);
}

#[tokio::test]
async fn test_failure_point_counts_the_attempt() {
    let guild = empty_guild().fail_on(FailurePoint::CreateRole("Mod".to_string()));

    let result = guild
        .create_role(&RoleSpec {
            name: "Mod".to_string(),
            ..Default::default()
        })
        .await;

    assert!(result.is_err());
    assert_eq!(guild.mutation_count(), 1);
    assert!(guild.state().role_named("Mod").is_none());
}

#[tokio::test]
async fn test_fetch_state_failure() {
    let guild = empty_guild().fail_on(FailurePoint::FetchState);
    assert!(guild.fetch_state().await.is_err());
    assert_eq!(guild.mutation_count(), 0);
}

#[test]
fn test_from_snapshot_keeps_source_ids() {
    let category = CategoryRecord::builder()
        .id(10u64)
        .name("Info")
        .position(0u32)
        .overwrites(PermissionOverwriteSet::new().with(
            SubjectRef::Role(2),
            PermissionRecord::new().with("view_channel", PermissionValue::Allow),
        ))
        .build()
        .expect("category");
    let channel = ChannelRecord::builder()
        .id(11u64)
        .name("rules")
        .kind(ChannelKind::Text)
        .parent_id(10u64)
        .build()
        .expect("channel");
    let snapshot = Snapshot::builder()
        .roles(vec![
            RoleRecord::builder()
                .id(1u64)
                .name(EVERYONE_ROLE_NAME)
                .position(0u32)
                .build()
                .expect("role"),
            RoleRecord::builder()
                .id(2u64)
                .name("Mod")
                .position(1u32)
                .build()
                .expect("role"),
        ])
        .categories(vec![category])
        .channels(vec![channel])
        .build()
        .expect("snapshot");

    let state = MemoryGuild::from_snapshot(&snapshot).state();

    assert_eq!(state.id, 1);
    assert_eq!(state.everyone_role().map(|r| r.name.as_str()), Some(EVERYONE_ROLE_NAME));
    let info = state.category_named("Info").expect("category");
    assert_eq!(info.overwrites[0].subject, OverwriteSubject::Role(2));
    assert_eq!(state.channel_named("rules").and_then(|c| c.parent_id), Some(10));
}

#[test]
fn test_from_snapshot_adds_missing_everyone() {
    let snapshot = Snapshot::builder()
        .roles(vec![RoleRecord::builder().name("Mod").build().expect("role")])
        .build()
        .expect("snapshot");

    let state = MemoryGuild::from_snapshot(&snapshot).state();

    assert_eq!(state.roles.len(), 2);
    assert!(state.everyone_role().is_some());
    assert_ne!(state.role_named("Mod").map(|r| r.id), Some(0));
}

#[tokio::test]
async fn test_fixed_confirmation() {
    let gate = FixedConfirmation(ConfirmationOutcome::Rejected);
    assert_eq!(gate.confirm("Create Roles: Mod").await, ConfirmationOutcome::Rejected);
}
