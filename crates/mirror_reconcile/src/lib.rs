//! Reconciliation engine for guild mirror.
//!
//! Given a [`Snapshot`](mirror_core::Snapshot) and a target guild, the
//! [`plan`] function computes a [`ChangePlan`] by matching roles, categories
//! and channels by name, [`Preview`] renders it for a human, and [`apply`]
//! issues the mutating calls through a
//! [`GuildPlatform`](mirror_interface::GuildPlatform).
//!
//! [`Reconciler`] strings these together behind a
//! [`ConfirmationGate`](mirror_interface::ConfirmationGate) with a bounded
//! wait.
//!
//! # Example
//!
//! ```
//! use mirror_core::Snapshot;
//! use mirror_interface::MemoryGuild;
//! use mirror_reconcile::Reconciler;
//!
//! let source = br#"{"roles":[{"name":"Mod","color":16711680}],"categories":[],"channels":[]}"#;
//! let empty = br#"{"roles":[],"categories":[],"channels":[]}"#;
//! let snapshot = Snapshot::from_json(source).unwrap();
//! let target = MemoryGuild::from_snapshot(&Snapshot::from_json(empty).unwrap());
//!
//! let plan = Reconciler::default().plan(&snapshot, &target.state());
//! assert_eq!(plan.role_creates(), vec!["Mod"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod executor;
mod options;
mod plan;
mod planner;
mod preview;
mod reconciler;
mod resolver;

pub use executor::apply;
pub use options::{
    DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_PREVIEW_LIMIT, ReconcileOptions,
    ReconcileOptionsBuilder,
};
pub use plan::{
    CategoryCreate, ChangePlan, ChannelCreate, ChannelField, ChannelUpdate, OverwriteMap,
    OverwriteUpdate, RoleCreate, RoleDeletion, RoleField, RolePosition, RoleUpdate,
};
pub use planner::plan;
pub use preview::{ApplyResults, NO_CHANGES, Preview};
pub use reconciler::{Outcome, Reconciler};
pub use resolver::{Resolver, live_overwrites, native_overwrites};
