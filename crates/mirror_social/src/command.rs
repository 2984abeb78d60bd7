//! The `mirror` chat command group.
//!
//! Parsing is platform-agnostic: adapters hand in the configured prefix and
//! the raw message text, and dispatch on the returned [`MirrorCommand`].
//!
//! | Message                        | Command                          |
//! |--------------------------------|----------------------------------|
//! | `!mirror`                      | [`MirrorCommand::Help`]          |
//! | `!mirror snapshot`             | [`MirrorCommand::Snapshot`]      |
//! | `!mirror snapshot path`        | [`MirrorCommand::SnapshotPath`]  |
//! | `!mirror update_from_json`     | [`MirrorCommand::UpdateFromJson`] |

/// Name of the command group after the prefix.
pub const COMMAND_GROUP: &str = "mirror";

/// Reply listing the available subcommands.
pub const HELP_TEXT: &str = "Guild mirror commands:\n\
    `mirror snapshot` capture this server to JSON\n\
    `mirror snapshot path` show where snapshots are written\n\
    `mirror update_from_json` reconcile this server with an attached snapshot";

/// Reply when the invoker may not manage the guild.
pub const NOT_AUTHORIZED: &str =
    "You need the Administrator or Manage Server permission to use this command.";

/// Reply when `update_from_json` arrives without a snapshot.
pub const MISSING_ATTACHMENT: &str = "Please attach a JSON snapshot file to this command.";

/// Reply when the attachment is not a `.json` file.
pub const NOT_JSON: &str = "The attachment must be a .json file.";

/// Reply after the invoker cancels.
pub const CANCELLED: &str = "Cancelled. No changes applied.";

/// Reply after the confirmation window closes unanswered.
pub const TIMED_OUT: &str = "Timed out. No changes applied.";

/// One parsed invocation of the command group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MirrorCommand {
    /// Bare group or unknown subcommand
    Help,
    /// Capture, store and upload a snapshot
    Snapshot,
    /// Show the storage layout
    SnapshotPath,
    /// Reconcile the guild with an attached snapshot
    UpdateFromJson,
}

impl MirrorCommand {
    /// Parse a message, returning `None` when it is not addressed to the group.
    ///
    /// # Example
    /// ```
    /// use mirror_social::MirrorCommand;
    ///
    /// assert_eq!(
    ///     MirrorCommand::parse("!", "!mirror snapshot path"),
    ///     Some(MirrorCommand::SnapshotPath)
    /// );
    /// assert_eq!(MirrorCommand::parse("!", "!mirrors"), None);
    /// ```
    pub fn parse(prefix: &str, content: &str) -> Option<Self> {
        let rest = content.trim().strip_prefix(prefix)?;
        let mut words = rest.split_whitespace();
        if !words.next()?.eq_ignore_ascii_case(COMMAND_GROUP) {
            return None;
        }

        let command = match (words.next(), words.next()) {
            (Some(sub), None) if sub.eq_ignore_ascii_case("snapshot") => Self::Snapshot,
            (Some(sub), Some(arg))
                if sub.eq_ignore_ascii_case("snapshot") && arg.eq_ignore_ascii_case("path") =>
            {
                Self::SnapshotPath
            }
            (Some(sub), _) if sub.eq_ignore_ascii_case("update_from_json") => {
                Self::UpdateFromJson
            }
            _ => Self::Help,
        };
        Some(command)
    }
}

/// Whether an attachment file name looks like a snapshot document.
pub fn is_snapshot_attachment(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".json")
}
