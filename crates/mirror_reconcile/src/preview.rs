//! Human-readable plan previews and apply summaries.

use crate::ChangePlan;
use serde::Serialize;
use std::fmt;

/// Text shown for an empty plan.
pub const NO_CHANGES: &str = "No changes detected (based on name and attributes).";

/// One line per non-empty plan bucket, names truncated after `limit`.
///
/// # Examples
///
/// ```
/// use mirror_reconcile::{ChangePlan, Preview, NO_CHANGES};
///
/// assert_eq!(Preview::render(&ChangePlan::default(), 50), NO_CHANGES);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Preview<'a> {
    plan: &'a ChangePlan,
    limit: usize,
}

impl<'a> Preview<'a> {
    /// Preview of `plan` listing at most `limit` names per line.
    pub fn new(plan: &'a ChangePlan, limit: usize) -> Self {
        Self { plan, limit }
    }

    /// Render `plan` straight to a string.
    pub fn render(plan: &ChangePlan, limit: usize) -> String {
        Preview::new(plan, limit).to_string()
    }

    /// Preview lines, or the single no-changes line.
    pub fn lines(&self) -> Vec<String> {
        let plan = self.plan;
        let positions: Vec<&str> = plan
            .role_position_assignments()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        let category_overwrites: Vec<&str> = plan
            .category_overwrite_updates()
            .iter()
            .map(|c| c.name.as_str())
            .collect();

        let buckets = [
            ("Create Roles", plan.role_creates()),
            ("Update Roles", plan.role_updates()),
            ("Reorder Roles", positions),
            ("Delete Roles", plan.role_deletes()),
            ("Create Categories", plan.category_creates()),
            ("Update Overwrites (categories)", category_overwrites),
            ("Create Channels", plan.channel_creates()),
            ("Update Overwrites/Props (channels)", plan.channel_updates()),
        ];

        let lines: Vec<String> = buckets
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(label, names)| format!("{}: {}", label, listing(names, self.limit)))
            .collect();

        if lines.is_empty() {
            vec![NO_CHANGES.to_string()]
        } else {
            lines
        }
    }
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

fn listing(names: &[&str], limit: usize) -> String {
    let head = names
        .iter()
        .take(limit)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > limit {
        format!("{} …", head)
    } else {
        head
    }
}

/// Outcome counters of one apply run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyResults {
    /// Roles created
    pub roles_created: usize,
    /// Roles whose properties were edited
    pub roles_updated: usize,
    /// Roles moved to a new rank
    pub roles_repositioned: usize,
    /// Roles deleted
    pub roles_deleted: usize,
    /// Categories created
    pub categories_created: usize,
    /// Category overwrite sets replaced
    pub category_overwrites_set: usize,
    /// Channels created
    pub channels_created: usize,
    /// Channels whose properties were edited
    pub channels_updated: usize,
    /// Channel overwrite sets replaced
    pub channel_overwrites_set: usize,
    /// Failed platform calls
    pub errors: usize,
}

impl ApplyResults {
    /// True when no platform call failed.
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    /// Final summary, one counter per line with the error total last.
    pub fn render(&self) -> String {
        [
            format!("Roles created: {}", self.roles_created),
            format!("Roles updated: {}", self.roles_updated),
            format!("Role positions updated: {}", self.roles_repositioned),
            format!("Roles deleted: {}", self.roles_deleted),
            format!("Categories created: {}", self.categories_created),
            format!("Category overwrites set: {}", self.category_overwrites_set),
            format!("Channels created: {}", self.channels_created),
            format!("Channels updated: {}", self.channels_updated),
            format!("Channel overwrites set: {}", self.channel_overwrites_set),
            format!("Errors: {}", self.errors),
        ]
        .join("\n")
    }
}
