//! Tests for planning, applying and the confirmation-gated pipeline.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mirror_core::permission::bit;
use mirror_core::{
    EVERYONE_ROLE_NAME, GuildState, LiveChannel, LiveChannelKind, LiveRole, NativeOverwrite,
    OverwriteSubject, PermissionPair, Snapshot, capture,
};
use mirror_interface::{
    ConfirmationGate, ConfirmationOutcome, FailurePoint, FixedConfirmation, GuildPlatform,
    MemoryGuild,
};
use mirror_reconcile::{
    ChannelField, NO_CHANGES, Outcome, Preview, ReconcileOptions, Reconciler, RoleField, apply,
    plan,
};
use std::collections::BTreeSet;

fn captured_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

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

fn channel(id: u64, name: &str, kind: LiveChannelKind, position: u32) -> LiveChannel {
    LiveChannel {
        id,
        name: name.to_string(),
        kind,
        position,
        parent_id: None,
        topic: None,
        nsfw: false,
        slowmode_delay: 0,
        overwrites: Vec::new(),
    }
}

fn empty_target() -> GuildState {
    GuildState {
        id: 900,
        name: "Target".to_string(),
        owner_id: 7,
        roles: vec![role(900, EVERYONE_ROLE_NAME, 0)],
        channels: Vec::new(),
    }
}

fn mask(name: &str) -> u64 {
    bit(name).expect("known permission")
}

fn snapshot(json: &str) -> Snapshot {
    Snapshot::from_json(json.as_bytes()).expect("valid snapshot")
}

/// A source guild with every entity class, captured with source ids.
fn source_snapshot() -> Snapshot {
    let mut info = channel(10, "Info", LiveChannelKind::Category, 0);
    info.overwrites = vec![
        NativeOverwrite::role(1, 0, mask("view_channel")),
        NativeOverwrite::role(2, mask("view_channel"), 0),
    ];
    let voice = channel(11, "Voice", LiveChannelKind::Category, 1);

    let mut rules = channel(12, "rules", LiveChannelKind::Text, 0);
    rules.parent_id = Some(10);
    rules.topic = Some("Be nice".to_string());
    rules.slowmode_delay = 5;
    rules.overwrites = vec![
        NativeOverwrite::role(3, mask("send_messages"), 0),
        NativeOverwrite {
            subject: OverwriteSubject::Member(42),
            permissions: PermissionPair::new(mask("send_messages"), 0),
        },
    ];
    let mut lounge = channel(13, "lounge", LiveChannelKind::Voice, 1);
    lounge.parent_id = Some(11);
    let general = channel(14, "general", LiveChannelKind::Text, 2);

    let mut moderator = role(2, "Mod", 2);
    moderator.color = 0xff0000;
    moderator.hoist = true;
    moderator.permissions = 1 << 3;

    let source = GuildState {
        id: 1,
        name: "Source".to_string(),
        owner_id: 7,
        roles: vec![
            role(1, EVERYONE_ROLE_NAME, 0),
            moderator,
            role(3, "Member", 1),
        ],
        channels: vec![info, voice, rules, lounge, general],
    };
    capture(&source, captured_at())
}

#[test]
fn test_mod_role_is_planned_for_creation() {
    let snapshot = snapshot(
        r#"{"roles":[{"name":"Mod","color":16711680,"hoist":true}],"categories":[],"channels":[]}"#,
    );

    let plan = plan(&snapshot, &empty_target(), &ReconcileOptions::default());

    assert_eq!(plan.role_creates(), vec!["Mod"]);
    assert_eq!(plan.len(), 1);
}

#[tokio::test]
async fn test_mod_role_is_created_once_with_color() {
    let snapshot = snapshot(
        r#"{"roles":[{"name":"Mod","color":16711680,"hoist":true}],"categories":[],"channels":[]}"#,
    );
    let guild = MemoryGuild::new(empty_target());

    let plan = plan(&snapshot, &guild.state(), &ReconcileOptions::default());
    let results = apply(&plan, &guild.state(), &guild).await;

    assert_eq!(results.roles_created, 1);
    assert_eq!(results.errors, 0);
    let state = guild.state();
    let mods: Vec<_> = state.roles.iter().filter(|r| r.name == "Mod").collect();
    assert_eq!(mods.len(), 1);
    assert_eq!(mods[0].color, 16711680);
    assert!(mods[0].hoist);
}

fn general_scenario_target() -> GuildState {
    let mut general = channel(601, "general", LiveChannelKind::Text, 1);
    general.parent_id = Some(600);
    GuildState {
        id: 900,
        name: "Target".to_string(),
        owner_id: 7,
        roles: vec![role(900, EVERYONE_ROLE_NAME, 0), role(501, "Mod", 1)],
        channels: vec![channel(600, "Info", LiveChannelKind::Category, 0), general],
    }
}

const GENERAL_SNAPSHOT: &str = r#"{
    "roles": [{"id": 1, "name": "Mod"}],
    "categories": [{"id": 5, "name": "Info"}],
    "channels": [{
        "name": "general",
        "parentId": 5,
        "overwrites": {"role:1": {"send_messages": false}}
    }]
}"#;

#[test]
fn test_general_channel_flagged_for_overwrite_update() {
    let plan = plan(
        &snapshot(GENERAL_SNAPSHOT),
        &general_scenario_target(),
        &ReconcileOptions::default(),
    );

    assert_eq!(plan.channel_updates(), vec!["general"]);
    let update = &plan.channel_overwrite_updates()[0];
    assert_eq!(update.fields, BTreeSet::from([ChannelField::Overwrites]));
    assert!(plan.roles_to_create().is_empty());
    assert!(plan.categories_to_create().is_empty());
    assert!(plan.channels_to_create().is_empty());
}

#[tokio::test]
async fn test_general_channel_receives_resolved_overwrite() {
    let guild = MemoryGuild::new(general_scenario_target());
    let snapshot = snapshot(GENERAL_SNAPSHOT);

    let plan = plan(&snapshot, &guild.state(), &ReconcileOptions::default());
    let results = apply(&plan, &guild.state(), &guild).await;

    assert_eq!(results.channel_overwrites_set, 1);
    assert_eq!(results.errors, 0);
    let state = guild.state();
    let general = state.channel_named("general").expect("general exists");
    assert_eq!(
        general.overwrites,
        vec![NativeOverwrite::role(501, 0, mask("send_messages"))]
    );
}

#[tokio::test]
async fn test_second_plan_after_clean_apply_is_empty() {
    let snapshot = source_snapshot();
    let guild = MemoryGuild::new(empty_target());
    let options = ReconcileOptions::default();

    let first = plan(&snapshot, &guild.state(), &options);
    assert_eq!(first.role_creates(), vec!["Member", "Mod"]);
    assert_eq!(first.category_creates(), vec!["Info", "Voice"]);
    assert_eq!(first.channel_creates(), vec!["rules", "lounge", "general"]);

    let results = apply(&first, &guild.state(), &guild).await;
    assert_eq!(results.errors, 0);
    assert_eq!(results.roles_created, 2);
    assert_eq!(results.roles_repositioned, 2);
    assert_eq!(results.category_overwrites_set, 1);
    assert_eq!(results.channel_overwrites_set, 1);

    let second = plan(&snapshot, &guild.state(), &options);
    assert!(second.is_empty(), "unexpected plan: {:?}", second);
    assert_eq!(Preview::render(&second, 50), NO_CHANGES);
}

#[tokio::test]
async fn test_applied_structure_matches_source() {
    let snapshot = source_snapshot();
    let guild = MemoryGuild::new(empty_target());

    let plan = plan(&snapshot, &guild.state(), &ReconcileOptions::default());
    apply(&plan, &guild.state(), &guild).await;

    let state = guild.state();
    let info = state.category_named("Info").expect("Info created");
    let moderator = state.role_named("Mod").expect("Mod created");
    assert!(
        info.overwrites
            .contains(&NativeOverwrite::role(900, 0, mask("view_channel")))
    );
    assert!(
        info.overwrites
            .contains(&NativeOverwrite::role(moderator.id, mask("view_channel"), 0))
    );

    let rules = state.channel_named("rules").expect("rules created");
    assert_eq!(rules.parent_id, Some(info.id));
    assert_eq!(rules.topic.as_deref(), Some("Be nice"));
    assert_eq!(rules.slowmode_delay, 5);
    assert_eq!(rules.overwrites.len(), 1, "member overwrites are not migrated");

    let lounge = state.channel_named("lounge").expect("lounge created");
    assert_eq!(lounge.kind, LiveChannelKind::Voice);
    assert_eq!(
        lounge.parent_id,
        state.category_named("Voice").map(|c| c.id)
    );
    assert_eq!(state.channel_named("general").and_then(|c| c.parent_id), None);
}

#[test]
fn test_everyone_and_managed_roles_are_never_deleted() {
    let mut bot = role(910, "Bot", 3);
    bot.managed = true;
    let target = GuildState {
        id: 900,
        name: "Target".to_string(),
        owner_id: 7,
        roles: vec![
            role(900, EVERYONE_ROLE_NAME, 0),
            role(905, EVERYONE_ROLE_NAME, 2),
            role(906, "Old", 1),
            bot,
        ],
        channels: Vec::new(),
    };
    let snapshot = snapshot(r#"{"roles":[{"name":"Keep"}],"categories":[],"channels":[]}"#);

    let plan = plan(&snapshot, &target, &ReconcileOptions::default());

    assert_eq!(plan.role_deletes(), vec!["Old"]);
}

#[test]
fn test_snapshot_managed_and_everyone_roles_are_left_alone() {
    let snapshot = snapshot(
        r#"{"roles":[
            {"name":"@everyone","permissions":1024},
            {"name":"Bot","managed":true,"color":5}
        ],"categories":[],"channels":[]}"#,
    );

    let plan = plan(&snapshot, &empty_target(), &ReconcileOptions::default());

    assert!(plan.is_empty());
}

#[test]
fn test_deletion_can_be_disabled() {
    let mut target = empty_target();
    target.roles.push(role(906, "Old", 1));
    let options = ReconcileOptions::builder()
        .delete_missing_roles(false)
        .build()
        .expect("options");

    let plan = plan(
        &snapshot(r#"{"roles":[],"categories":[],"channels":[]}"#),
        &target,
        &options,
    );

    assert!(plan.roles_to_delete().is_empty());
}

#[test]
fn test_unresolvable_overwrite_subject_is_dropped() {
    let mut target = empty_target();
    target
        .channels
        .push(channel(950, "general", LiveChannelKind::Text, 0));
    let snapshot = snapshot(
        r#"{"roles":[],"categories":[],"channels":[
            {"name":"general","position":0,"overwrites":{"role:999999":{"send_messages":false}}},
            {"name":"fresh","overwrites":{"role:999999":{"view_channel":true}}}
        ]}"#,
    );

    let plan = plan(&snapshot, &target, &ReconcileOptions::default());

    assert!(plan.channel_overwrite_updates().is_empty());
    assert_eq!(plan.channel_creates(), vec!["fresh"]);
    assert!(plan.channels_to_create()[0].overwrites.is_empty());
}

#[test]
fn test_duplicate_target_names_match_first_in_enumeration_order() {
    let mut target = empty_target();
    target
        .channels
        .push(channel(21, "general", LiveChannelKind::Text, 1));
    target
        .channels
        .push(channel(31, "general", LiveChannelKind::Text, 0));
    target
        .channels
        .push(channel(30, "general", LiveChannelKind::Text, 0));
    let snapshot = snapshot(
        r#"{"roles":[],"categories":[],"channels":[{"name":"general","topic":"hi"}]}"#,
    );

    let plan = plan(&snapshot, &target, &ReconcileOptions::default());

    assert_eq!(plan.channel_overwrite_updates().len(), 1);
    assert_eq!(plan.channel_overwrite_updates()[0].id, 30);
    assert!(plan.channels_to_create().is_empty());
}

#[test]
fn test_role_permission_drift() {
    let mut target = empty_target();
    target.roles.push(role(901, "Mod", 1));
    let snapshot = snapshot(
        r#"{"roles":[{"name":"Mod","permissions":8,"color":0}],"categories":[],"channels":[]}"#,
    );

    let compared = plan(&snapshot, &target, &ReconcileOptions::default());
    assert_eq!(compared.role_updates(), vec!["Mod"]);
    assert_eq!(
        compared.roles_to_update()[0].fields,
        BTreeSet::from([RoleField::Permissions])
    );

    let options = ReconcileOptions::builder()
        .compare_role_permissions(false)
        .build()
        .expect("options");
    assert!(plan(&snapshot, &target, &options).is_empty());
}

#[test]
fn test_missing_parent_category_goes_top_level() {
    let snapshot = snapshot(
        r#"{"roles":[],"categories":[],"channels":[{"name":"orphan","parentId":77}]}"#,
    );

    let plan = plan(&snapshot, &empty_target(), &ReconcileOptions::default());

    assert_eq!(plan.channels_to_create()[0].parent, None);
}

#[tokio::test]
async fn test_one_failing_create_leaves_the_rest_applied() {
    let snapshot = snapshot(
        r#"{"roles":[{"name":"Mod","color":16711680},{"name":"Helper"}],
            "categories":[{"name":"Info"}],"channels":[]}"#,
    );
    let guild =
        MemoryGuild::new(empty_target()).fail_on(FailurePoint::CreateRole("Mod".to_string()));

    let plan = plan(&snapshot, &guild.state(), &ReconcileOptions::default());
    let results = apply(&plan, &guild.state(), &guild).await;

    assert_eq!(results.errors, 1);
    assert_eq!(results.roles_created, 1);
    assert_eq!(results.categories_created, 1);
    let state = guild.state();
    assert!(state.role_named("Mod").is_none());
    assert!(state.role_named("Helper").is_some());
    assert!(state.category_named("Info").is_some());
}

#[tokio::test]
async fn test_failed_state_reads_fall_back_to_tracked_state() {
    let snapshot = snapshot(
        r#"{"roles":[{"id":1,"name":"Mod"}],
            "categories":[{"id":5,"name":"Info","overwrites":{"role:1":{"view_channel":true}}}],
            "channels":[{"name":"rules","parentId":5}]}"#,
    );
    let guild = MemoryGuild::new(empty_target()).fail_on(FailurePoint::FetchState);

    let plan = plan(&snapshot, &empty_target(), &ReconcileOptions::default());
    let results = apply(&plan, &empty_target(), &guild).await;

    assert_eq!(results.errors, 0);
    let state = guild.state();
    let info = state.category_named("Info").expect("Info created");
    let moderator = state.role_named("Mod").expect("Mod created");
    assert_eq!(
        info.overwrites,
        vec![NativeOverwrite::role(moderator.id, mask("view_channel"), 0)]
    );
    assert_eq!(
        state.channel_named("rules").and_then(|c| c.parent_id),
        Some(info.id)
    );
}

#[tokio::test]
async fn test_member_overwrites_survive_replacement() {
    let mut target = general_scenario_target();
    let member = NativeOverwrite {
        subject: OverwriteSubject::Member(42),
        permissions: PermissionPair::new(mask("view_channel"), 0),
    };
    target.channels[1].overwrites.push(member);
    let guild = MemoryGuild::new(target);

    let plan = plan(&snapshot(GENERAL_SNAPSHOT), &guild.state(), &ReconcileOptions::default());
    apply(&plan, &guild.state(), &guild).await;

    let state = guild.state();
    let general = state.channel_named("general").expect("general exists");
    assert!(general.overwrites.contains(&member));
    assert_eq!(general.overwrites.len(), 2);
}

#[test]
fn test_preview_truncates_after_limit() {
    let roles: Vec<String> = (0..60)
        .map(|i| format!(r#"{{"name":"role{:02}"}}"#, i))
        .collect();
    let json = format!(
        r#"{{"roles":[{}],"categories":[],"channels":[]}}"#,
        roles.join(",")
    );

    let plan = plan(&snapshot(&json), &empty_target(), &ReconcileOptions::default());
    let preview = Preview::render(&plan, 50);

    let line = preview.lines().next().expect("one line");
    assert!(line.starts_with("Create Roles: role00, role01"));
    assert!(line.ends_with("role49 …"));
    assert!(!line.contains("role50"));
}

#[test]
fn test_preview_lists_each_bucket() {
    let mut target = empty_target();
    target.roles.push(role(906, "Old", 1));
    let snapshot = snapshot(
        r#"{"roles":[{"name":"Mod"}],"categories":[{"name":"Info"}],"channels":[{"name":"general"}]}"#,
    );

    let plan = plan(&snapshot, &target, &ReconcileOptions::default());

    assert_eq!(
        Preview::render(&plan, 50),
        "Create Roles: Mod\nDelete Roles: Old\nCreate Categories: Info\nCreate Channels: general"
    );
}

/// A gate nobody ever answers.
struct SilentGate;

#[async_trait]
impl ConfirmationGate for SilentGate {
    async fn confirm(&self, _preview: &str) -> ConfirmationOutcome {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_timeout_issues_no_mutations() {
    let snapshot = source_snapshot();
    let guild = MemoryGuild::new(empty_target());
    let before = guild.state();

    let outcome = Reconciler::default()
        .run(&snapshot, &guild, &SilentGate)
        .await
        .expect("target readable");

    assert_eq!(outcome, Outcome::TimedOut);
    assert_eq!(guild.mutation_count(), 0);
    assert_eq!(guild.state(), before);
}

#[tokio::test]
async fn test_rejection_cancels() {
    let guild = MemoryGuild::new(empty_target());

    let outcome = Reconciler::default()
        .run(
            &source_snapshot(),
            &guild,
            &FixedConfirmation(ConfirmationOutcome::Rejected),
        )
        .await
        .expect("target readable");

    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(guild.mutation_count(), 0);
}

#[tokio::test]
async fn test_confirmed_run_applies_then_reports_no_changes() {
    let guild = MemoryGuild::new(empty_target());
    let reconciler = Reconciler::default();
    let gate = FixedConfirmation(ConfirmationOutcome::Confirmed);

    let first = reconciler
        .run(&source_snapshot(), &guild, &gate)
        .await
        .expect("target readable");
    let Outcome::Applied(results) = first else {
        panic!("expected an apply, got {:?}", first);
    };
    assert!(results.is_clean());

    let second = reconciler
        .run(&source_snapshot(), &guild, &gate)
        .await
        .expect("target readable");
    assert_eq!(second, Outcome::NoChanges);
}

#[tokio::test]
async fn test_unreadable_target_is_an_error() {
    let guild = MemoryGuild::new(empty_target()).fail_on(FailurePoint::FetchState);

    let result = Reconciler::default()
        .run(
            &source_snapshot(),
            &guild,
            &FixedConfirmation(ConfirmationOutcome::Confirmed),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(guild.mutation_count(), 0);
}

#[tokio::test]
async fn test_offline_diff_between_documents() {
    let source = source_snapshot();
    let older = MemoryGuild::from_snapshot(&snapshot(
        r#"{"roles":[{"id":1,"name":"@everyone"},{"id":3,"name":"Member","position":1}],
            "categories":[],"channels":[]}"#,
    ));

    let plan = plan(&source, &older.fetch_state().await.expect("state"), &ReconcileOptions::default());

    assert_eq!(plan.role_creates(), vec!["Mod"]);
    assert_eq!(plan.category_creates(), vec!["Info", "Voice"]);
}

#[test]
fn test_options_fill_absent_keys_with_defaults() {
    let options: ReconcileOptions =
        serde_json::from_str(r#"{"preview_limit": 10}"#).expect("options");

    assert_eq!(*options.preview_limit(), 10);
    assert!(*options.delete_missing_roles());
    assert!(*options.compare_role_permissions());
    assert_eq!(options.confirmation_timeout().as_secs(), 180);
}
