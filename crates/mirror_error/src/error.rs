//! Top-level error wrapper types.

use crate::{ConfigError, PlatformError, SnapshotError, StorageError};

/// Every error the workspace can surface to a caller.
///
/// # Examples
///
/// ```
/// use mirror_error::{ConfigError, MirrorError};
///
/// let err: MirrorError = ConfigError::new("bad prefix").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MirrorErrorKind {
    /// Snapshot document could not be read or written
    #[from(SnapshotError)]
    Snapshot(SnapshotError),
    /// Platform call failed
    #[from(PlatformError)]
    Platform(PlatformError),
    /// Snapshot storage failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Guild mirror error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Guild Mirror Error: {}", _0)]
pub struct MirrorError(Box<MirrorErrorKind>);

impl MirrorError {
    /// Create a new error from a kind.
    pub fn new(kind: MirrorErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MirrorErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to MirrorErrorKind
impl<T> From<T> for MirrorError
where
    T: Into<MirrorErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for guild mirror operations.
pub type MirrorResult<T> = std::result::Result<T, MirrorError>;
