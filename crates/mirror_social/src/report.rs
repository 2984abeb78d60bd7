//! Platform-neutral replies for reconciliation runs.
//!
//! Adapters render a [`Report`] with their own message primitives (an embed
//! on Discord), mapping [`ReplyTone`] to a color.

use derive_getters::Getters;
use mirror_reconcile::{NO_CHANGES, Outcome};

use crate::command::{CANCELLED, TIMED_OUT};

/// Title of the preview message.
pub const PREVIEW_TITLE: &str = "Update From JSON: Preview";

/// Footer under the preview telling the invoker how to answer.
pub const PREVIEW_FOOTER: &str = "React ✅ to apply, ❌ to cancel (invoker only).";

/// Emoji accepting a preview.
pub const CONFIRM_EMOJI: char = '✅';

/// Emoji cancelling a preview.
pub const CANCEL_EMOJI: char = '❌';

/// How a reply should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ReplyTone {
    /// Neutral information
    Info,
    /// Everything applied cleanly
    Success,
    /// Something needs attention
    Warning,
}

/// A titled reply.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Report {
    title: String,
    body: String,
    tone: ReplyTone,
}

impl Report {
    /// Build a report.
    pub fn new(title: impl Into<String>, body: impl Into<String>, tone: ReplyTone) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tone,
        }
    }

    /// The preview shown before asking for confirmation.
    pub fn preview(preview: &str) -> Self {
        Self::new(PREVIEW_TITLE, preview, ReplyTone::Info)
    }

    /// The final reply for a finished run.
    ///
    /// # Example
    /// ```
    /// use mirror_reconcile::{ApplyResults, Outcome};
    /// use mirror_social::{ReplyTone, Report};
    ///
    /// let results = ApplyResults { errors: 2, ..Default::default() };
    /// let report = Report::outcome(&Outcome::Applied(results));
    /// assert_eq!(report.tone(), &ReplyTone::Warning);
    /// assert!(report.body().ends_with("Errors: 2"));
    /// ```
    pub fn outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::NoChanges => Self::new("Update From JSON", NO_CHANGES, ReplyTone::Info),
            Outcome::Cancelled => Self::new("Update From JSON", CANCELLED, ReplyTone::Info),
            Outcome::TimedOut => Self::new("Update From JSON", TIMED_OUT, ReplyTone::Warning),
            Outcome::Applied(results) => {
                let tone = if results.is_clean() {
                    ReplyTone::Success
                } else {
                    ReplyTone::Warning
                };
                Self::new("Update From JSON: Completed", results.render(), tone)
            }
        }
    }
}

/// Whether an emoji answers a preview, and how.
pub fn reaction_answer(emoji: &str) -> Option<bool> {
    let mut chars = emoji.chars();
    let first = chars.next()?;
    // Variation selectors trail some clients' renderings.
    if chars.any(|c| c != '\u{fe0f}') {
        return None;
    }
    match first {
        CONFIRM_EMOJI => Some(true),
        CANCEL_EMOJI => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_reconcile::ApplyResults;

    #[test]
    fn clean_run_is_success() {
        let report = Report::outcome(&Outcome::Applied(ApplyResults {
            roles_created: 1,
            ..Default::default()
        }));
        assert_eq!(report.tone(), &ReplyTone::Success);
        assert_eq!(report.title(), "Update From JSON: Completed");
        assert!(report.body().starts_with("Roles created: 1"));
    }

    #[test]
    fn no_changes_uses_fixed_text() {
        let report = Report::outcome(&Outcome::NoChanges);
        assert_eq!(report.body(), NO_CHANGES);
        assert_eq!(report.tone(), &ReplyTone::Info);
    }

    #[test]
    fn timeout_and_cancel_texts() {
        assert_eq!(Report::outcome(&Outcome::TimedOut).body(), TIMED_OUT);
        assert_eq!(Report::outcome(&Outcome::Cancelled).body(), CANCELLED);
    }

    #[test]
    fn reactions() {
        assert_eq!(reaction_answer("✅"), Some(true));
        assert_eq!(reaction_answer("❌"), Some(false));
        assert_eq!(reaction_answer("✅\u{fe0f}"), Some(true));
        assert_eq!(reaction_answer("👍"), None);
        assert_eq!(reaction_answer(""), None);
    }
}
