//! Errors raised by calls against the hosting platform.
//!
//! A [`PlatformError`] is the `OperationFailed` case of the reconciliation
//! engine. Each mutating call returns one on failure, and the apply executor
//! turns it into an error count instead of aborting.

use derive_getters::Getters;

/// Platform error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum PlatformErrorKind {
    /// The platform API rejected or failed the request.
    #[display("Platform API error: {_0}")]
    Api(String),

    /// Server (guild) not found by ID.
    #[display("Guild not found: {_0}")]
    GuildNotFound(u64),

    /// Role not found by ID.
    #[display("Role not found: {_0}")]
    RoleNotFound(u64),

    /// Channel or category not found by ID.
    #[display("Channel not found: {_0}")]
    ChannelNotFound(u64),

    /// Bot lacks required permissions for an operation.
    #[display("Insufficient permissions: {_0}")]
    InsufficientPermissions(String),

    /// The platform asked us to slow down.
    #[display("Rate limited: {_0}")]
    RateLimited(String),

    /// Invalid snowflake ID format.
    #[display("Invalid ID: {_0}")]
    InvalidId(String),

    /// Connection to the platform failed.
    #[display("Connection failed: {_0}")]
    ConnectionFailed(String),
}

/// Platform error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("Platform Error: {} at line {} in {}", kind, line, file)]
pub struct PlatformError {
    kind: PlatformErrorKind,
    line: u32,
    file: &'static str,
}

impl PlatformError {
    /// Create a new PlatformError with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use mirror_error::{PlatformError, PlatformErrorKind};
    ///
    /// let err = PlatformError::new(PlatformErrorKind::RoleNotFound(42));
    /// assert_eq!(err.kind(), &PlatformErrorKind::RoleNotFound(42));
    /// ```
    #[track_caller]
    pub fn new(kind: PlatformErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
