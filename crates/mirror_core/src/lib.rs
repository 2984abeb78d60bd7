//! Core data types for guild mirror.
//!
//! This crate provides the snapshot document model, the permission codec
//! and the live guild state that the reconciliation engine diffs against.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capture;
mod live;
mod overwrite;
pub mod permission;
mod snapshot;

pub use capture::{capture, encode_overwrites};
pub use live::{
    EVERYONE_ROLE_NAME, GuildState, LiveChannel, LiveChannelKind, LiveRole, NativeOverwrite,
    OverwriteSubject,
};
pub use overwrite::{PermissionOverwriteSet, SubjectRef};
pub use permission::{PermissionPair, PermissionRecord, PermissionValue};
pub use snapshot::{
    CategoryRecord, CategoryRecordBuilder, ChannelKind, ChannelRecord, ChannelRecordBuilder,
    REQUIRED_KEYS, RoleRecord, RoleRecordBuilder, Snapshot, SnapshotBuilder, SnapshotMeta,
    SnapshotMetaBuilder,
};
