//! Error types for guild mirror.
//!
//! This crate provides the foundation error types used throughout the workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Two kinds matter to the reconciliation engine in particular:
//! - [`SnapshotError`] is the `MalformedDocument` failure. It is fatal to an
//!   invocation and surfaced immediately.
//! - [`PlatformError`] is the `OperationFailed` failure. The apply executor
//!   counts it and moves on to the next operation.
//!
//! # Examples
//!
//! ```
//! use mirror_error::{MirrorResult, SnapshotError, SnapshotErrorKind};
//!
//! fn load() -> MirrorResult<()> {
//!     Err(SnapshotError::new(SnapshotErrorKind::MissingKey("roles".to_string())))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod platform;
mod snapshot;
mod storage;

pub use config::ConfigError;
pub use error::{MirrorError, MirrorErrorKind, MirrorResult};
pub use platform::{PlatformError, PlatformErrorKind, PlatformResult};
pub use snapshot::{SnapshotError, SnapshotErrorKind};
pub use storage::{StorageError, StorageErrorKind};
