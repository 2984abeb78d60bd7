use chrono::{TimeZone, Utc};
use mirror_core::permission::{self, bit};
use mirror_core::{
    CategoryRecord, ChannelKind, ChannelRecord, GuildState, LiveChannel, LiveChannelKind,
    LiveRole, NativeOverwrite, OverwriteSubject, PermissionOverwriteSet, PermissionPair,
    PermissionRecord, PermissionValue, RoleRecord, Snapshot, SubjectRef, capture,
};
use mirror_error::SnapshotErrorKind;

fn send_messages() -> u64 {
    bit("send_messages").unwrap()
}

fn view_channel() -> u64 {
    bit("view_channel").unwrap()
}

fn sample_snapshot() -> Snapshot {
    let mixed = PermissionRecord::new()
        .with("send_messages", PermissionValue::Deny)
        .with("view_channel", PermissionValue::Allow)
        .with("speak", PermissionValue::Inherit);

    Snapshot::builder()
        .roles(vec![
            RoleRecord::builder()
                .id(10u64)
                .name("@everyone")
                .position(0u32)
                .permissions(1024u64)
                .build()
                .unwrap(),
            RoleRecord::builder()
                .id(11u64)
                .name("Mod")
                .position(1u32)
                .color(16711680u32)
                .hoist(true)
                .mentionable(false)
                .build()
                .unwrap(),
        ])
        .categories(vec![
            CategoryRecord::builder()
                .id(5u64)
                .name("Info")
                .position(0u32)
                .overwrites(PermissionOverwriteSet::new().with(SubjectRef::Role(11), mixed.clone()))
                .build()
                .unwrap(),
        ])
        .channels(vec![
            ChannelRecord::builder()
                .id(20u64)
                .name("general")
                .kind(ChannelKind::Text)
                .position(0u32)
                .parent_id(5u64)
                .overwrites(PermissionOverwriteSet::new().with(SubjectRef::Role(11), mixed))
                .nsfw(false)
                .slowmode_delay(5u32)
                .topic("hello")
                .build()
                .unwrap(),
            ChannelRecord::builder()
                .id(21u64)
                .name("lounge")
                .kind(ChannelKind::Voice)
                .build()
                .unwrap(),
        ])
        .build()
        .unwrap()
}

#[test]
fn round_trip_preserves_snapshot() {
    let snapshot = sample_snapshot();
    let bytes = snapshot.to_json().unwrap();
    let decoded = Snapshot::from_json(&bytes).unwrap();
    assert_eq!(decoded, snapshot);
}

#[test]
fn inherit_entries_are_not_written() {
    let bytes = sample_snapshot().to_json().unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.contains("speak"));
    assert!(text.contains("\"send_messages\": false"));
}

#[test]
fn missing_required_key_is_malformed() {
    let err = Snapshot::from_json(br#"{"roles": [], "categories": []}"#).unwrap_err();
    assert!(err.is_missing_key());
    assert_eq!(err.kind, SnapshotErrorKind::MissingKey("channels".to_string()));
}

#[test]
fn non_json_is_malformed() {
    let err = Snapshot::from_json(b"not json at all").unwrap_err();
    assert!(matches!(err.kind, SnapshotErrorKind::Malformed(_)));

    let err = Snapshot::from_json(b"[1, 2, 3]").unwrap_err();
    assert!(matches!(err.kind, SnapshotErrorKind::Malformed(_)));
}

#[test]
fn unknown_fields_are_tolerated() {
    let doc = br#"{
        "version": 7,
        "roles": [{"name": "Mod", "color": 16711680, "hoist": true, "icon": "x"}],
        "categories": [],
        "channels": [],
        "emojis": []
    }"#;
    let snapshot = Snapshot::from_json(doc).unwrap();
    assert_eq!(snapshot.roles().len(), 1);
    assert_eq!(*snapshot.roles()[0].color(), Some(16711680));
    assert_eq!(*snapshot.roles()[0].hoist(), Some(true));
    assert_eq!(*snapshot.roles()[0].mentionable(), None);
}

#[test]
fn legacy_snake_case_document_loads() {
    let doc = br#"{
        "meta": {"guild_id": 99, "guild_name": "Old", "snapshot_at": "2024-05-01T12:00:00Z", "owner_id": 3},
        "roles": [],
        "categories": [{"id": 5, "name": "Info", "position": 0, "nsfw": false, "overwrites": {}}],
        "channels": [{
            "id": 20, "name": "general", "type": "news", "position": 2, "parent_id": 5,
            "overwrites": {"role:1": {"send_messages": false, "speak": null}, "member:8": {"speak": true}},
            "nsfw": false, "slowmode_delay": 10, "topic": null
        }]
    }"#;
    let snapshot = Snapshot::from_json(doc).unwrap();

    assert_eq!(*snapshot.meta().server_id(), Some(99));
    assert_eq!(
        *snapshot.meta().captured_at(),
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    );

    let channel = &snapshot.channels()[0];
    assert_eq!(*channel.kind(), ChannelKind::Text);
    assert_eq!(*channel.parent_id(), Some(5));
    assert_eq!(*channel.slowmode_delay(), Some(10));
    assert_eq!(*channel.topic(), None);

    let record = channel.overwrites().get(&SubjectRef::Role(1)).unwrap();
    assert_eq!(record.len(), 1);
    assert_eq!(record.get("speak"), PermissionValue::Inherit);
    assert_eq!(record.get("send_messages"), PermissionValue::Deny);
    assert!(channel.overwrites().get(&SubjectRef::Member(8)).is_some());
}

#[test]
fn stage_voice_kind_reads_as_stage() {
    let doc = br#"{"roles": [], "categories": [], "channels": [{"name": "talks", "type": "stage_voice"}, {"name": "x", "type": "directory"}]}"#;
    let snapshot = Snapshot::from_json(doc).unwrap();
    assert_eq!(*snapshot.channels()[0].kind(), ChannelKind::Stage);
    assert_eq!(*snapshot.channels()[1].kind(), ChannelKind::Text);
}

#[test]
fn kind_strings_ignore_case() {
    let doc = br#"{"roles": [], "categories": [], "channels": [{"name": "lounge", "type": "Voice"}, {"name": "board", "type": "FORUM"}, {"name": "talks", "type": "Stage_Voice"}]}"#;
    let snapshot = Snapshot::from_json(doc).unwrap();
    assert_eq!(*snapshot.channels()[0].kind(), ChannelKind::Voice);
    assert_eq!(*snapshot.channels()[1].kind(), ChannelKind::Forum);
    assert_eq!(*snapshot.channels()[2].kind(), ChannelKind::Stage);
}

#[test]
fn codec_keeps_every_vocabulary_bit() {
    for (name, shift) in permission::PERMISSIONS {
        let mask = 1u64 << shift;

        let allowed = permission::encode(PermissionPair::new(mask, 0));
        assert_eq!(allowed.get(name), PermissionValue::Allow, "{name}");
        assert_eq!(permission::decode(&allowed), PermissionPair::new(mask, 0), "{name}");

        let denied = permission::encode(PermissionPair::new(0, mask));
        assert_eq!(denied.get(name), PermissionValue::Deny, "{name}");
        assert_eq!(permission::decode(&denied), PermissionPair::new(0, mask), "{name}");
    }
}

#[test]
fn voice_channel_status_survives_capture() {
    let status = bit("set_voice_channel_status").unwrap();
    assert_eq!(status, 1 << 48);

    let record = permission::encode(PermissionPair::new(status, 0));
    assert_eq!(record.len(), 1);
    assert_eq!(permission::decode(&record).allow, status);
}

#[test]
fn codec_encodes_only_explicit_bits() {
    let unknown_bit = 1u64 << 60;
    let pair = PermissionPair::new(view_channel() | unknown_bit, send_messages());
    let record = permission::encode(pair);

    assert_eq!(record.len(), 2);
    assert_eq!(record.get("view_channel"), PermissionValue::Allow);
    assert_eq!(record.get("send_messages"), PermissionValue::Deny);
    assert_eq!(record.get("connect"), PermissionValue::Inherit);
}

#[test]
fn codec_decode_ignores_unknown_names_and_accepts_aliases() {
    let record = PermissionRecord::new()
        .with("read_messages", PermissionValue::Allow)
        .with("send_messages", PermissionValue::Deny)
        .with("teleport_members", PermissionValue::Allow);

    let pair = permission::decode(&record);
    assert_eq!(pair, PermissionPair::new(view_channel(), send_messages()));
}

#[test]
fn codec_round_trips_canonical_records() {
    let record = PermissionRecord::new()
        .with("view_channel", PermissionValue::Allow)
        .with("attach_files", PermissionValue::Deny)
        .with("send_polls", PermissionValue::Allow);
    assert_eq!(permission::encode(permission::decode(&record)), record);
}

fn live_guild() -> GuildState {
    GuildState {
        id: 1,
        name: "Home".to_string(),
        owner_id: 77,
        roles: vec![
            LiveRole {
                id: 3,
                name: "Admin".to_string(),
                position: 2,
                color: 0xff0000,
                hoist: true,
                mentionable: true,
                managed: false,
                permissions: 8,
            },
            LiveRole {
                id: 1,
                name: "@everyone".to_string(),
                position: 0,
                color: 0,
                hoist: false,
                mentionable: false,
                managed: false,
                permissions: 1024,
            },
        ],
        channels: vec![
            LiveChannel {
                id: 40,
                name: "Info".to_string(),
                kind: LiveChannelKind::Category,
                position: 0,
                parent_id: None,
                topic: None,
                nsfw: false,
                slowmode_delay: 0,
                overwrites: vec![],
            },
            LiveChannel {
                id: 41,
                name: "rules".to_string(),
                kind: LiveChannelKind::Text,
                position: 0,
                parent_id: Some(40),
                topic: Some("read me".to_string()),
                nsfw: false,
                slowmode_delay: 0,
                overwrites: vec![
                    NativeOverwrite::role(1, 0, send_messages()),
                    NativeOverwrite {
                        subject: OverwriteSubject::Member(77),
                        permissions: PermissionPair::new(send_messages(), 0),
                    },
                ],
            },
        ],
    }
}

#[test]
fn capture_orders_roles_and_drops_member_overwrites() {
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let snapshot = capture(&live_guild(), at);

    let names: Vec<_> = snapshot.roles().iter().map(|r| r.name().as_str()).collect();
    assert_eq!(names, vec!["@everyone", "Admin"]);
    assert_eq!(snapshot.categories().len(), 1);
    assert_eq!(snapshot.channels().len(), 1);

    let rules = &snapshot.channels()[0];
    assert_eq!(rules.overwrites().len(), 1);
    assert_eq!(
        rules.overwrites().get(&SubjectRef::Role(1)).unwrap().get("send_messages"),
        PermissionValue::Deny
    );
    assert_eq!(snapshot.summary(), "Roles: 2 · Categories: 1 · Channels: 1");
    assert_eq!(*snapshot.meta().captured_at(), Some(at));
}

#[test]
fn captured_snapshot_round_trips() {
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let snapshot = capture(&live_guild(), at);
    let decoded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(decoded, snapshot);
}

#[test]
fn member_can_manage_checks_owner_and_role_bits() {
    let guild = live_guild();
    assert!(guild.member_can_manage(77, &[]));
    assert!(guild.member_can_manage(5, &[3]));
    assert!(!guild.member_can_manage(5, &[]));
}
