//! Tests for chat command parsing and run reports.

use mirror_reconcile::{ApplyResults, NO_CHANGES, Outcome};
use mirror_social::{
    CANCELLED, MirrorCommand, PREVIEW_TITLE, ReplyTone, Report, TIMED_OUT, reaction_answer,
};

#[test]
fn test_every_subcommand_parses() {
    let cases = [
        ("!mirror", MirrorCommand::Help),
        ("!mirror snapshot", MirrorCommand::Snapshot),
        ("!mirror snapshot path", MirrorCommand::SnapshotPath),
        ("!mirror update_from_json", MirrorCommand::UpdateFromJson),
    ];
    for (content, expected) in cases {
        assert_eq!(MirrorCommand::parse("!", content), Some(expected), "{content}");
    }
}

#[test]
fn test_messages_for_other_bots_are_ignored() {
    assert_eq!(MirrorCommand::parse("!", "!play song"), None);
    assert_eq!(MirrorCommand::parse("!", "mirror snapshot"), None);
}

#[test]
fn test_update_ignores_trailing_words() {
    assert_eq!(
        MirrorCommand::parse("!", "!mirror update_from_json please"),
        Some(MirrorCommand::UpdateFromJson)
    );
}

#[test]
fn test_run_reports() {
    assert_eq!(Report::outcome(&Outcome::NoChanges).body(), NO_CHANGES);
    assert_eq!(Report::outcome(&Outcome::Cancelled).body(), CANCELLED);
    assert_eq!(Report::outcome(&Outcome::TimedOut).body(), TIMED_OUT);

    let clean = Report::outcome(&Outcome::Applied(ApplyResults {
        channels_created: 3,
        ..Default::default()
    }));
    assert_eq!(clean.tone(), &ReplyTone::Success);
    assert!(clean.body().contains("Channels created: 3"));
    assert!(clean.body().ends_with("Errors: 0"));

    let failed = Report::outcome(&Outcome::Applied(ApplyResults {
        errors: 1,
        ..Default::default()
    }));
    assert_eq!(failed.tone(), &ReplyTone::Warning);
}

#[test]
fn test_preview_report() {
    let report = Report::preview("Create Roles: Mod");
    assert_eq!(report.title(), PREVIEW_TITLE);
    assert_eq!(report.body(), "Create Roles: Mod");
    assert_eq!(report.tone(), &ReplyTone::Info);
}

#[test]
fn test_only_check_and_cross_answer() {
    assert_eq!(reaction_answer("✅"), Some(true));
    assert_eq!(reaction_answer("❌"), Some(false));
    assert_eq!(reaction_answer("✔"), None);
}
