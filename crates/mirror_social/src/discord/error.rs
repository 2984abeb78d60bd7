//! Discord-specific error types.
//!
//! Bot lifecycle and command failures use [`DiscordError`]. Calls made on
//! behalf of the reconciliation engine convert serenity errors into
//! [`PlatformError`] with [`platform_error`] so they are counted, not fatal.

use derive_getters::Getters;
use mirror_error::{MirrorError, PlatformError, PlatformErrorKind};

/// Discord error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum DiscordErrorKind {
    /// Serenity API error.
    #[display("Serenity API error: {_0}")]
    SerenityError(String),

    /// Connection to Discord gateway failed.
    #[display("Connection failed: {_0}")]
    ConnectionFailed(String),

    /// Message failed to send.
    #[display("Message send failed: {_0}")]
    MessageSendFailed(String),

    /// An attachment could not be downloaded or read.
    #[display("Attachment failed: {_0}")]
    AttachmentFailed(String),

    /// A workspace operation (capture, storage, reconcile) failed.
    #[display("{_0}")]
    Mirror(String),
}

/// Discord error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("Discord Error: {} at line {} in {}", kind, line, file)]
pub struct DiscordError {
    kind: DiscordErrorKind,
    line: u32,
    file: &'static str,
}

impl DiscordError {
    /// Create a new DiscordError with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use mirror_social::{DiscordError, DiscordErrorKind};
    ///
    /// let err = DiscordError::new(DiscordErrorKind::ConnectionFailed("gateway".into()));
    /// assert!(err.to_string().contains("gateway"));
    /// ```
    #[track_caller]
    pub fn new(kind: DiscordErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<MirrorError> for DiscordError {
    #[track_caller]
    fn from(err: MirrorError) -> Self {
        Self::new(DiscordErrorKind::Mirror(err.to_string()))
    }
}

impl From<PlatformError> for DiscordError {
    #[track_caller]
    fn from(err: PlatformError) -> Self {
        Self::new(DiscordErrorKind::Mirror(err.kind().to_string()))
    }
}

/// Result type for Discord operations.
pub type DiscordResult<T> = Result<T, DiscordError>;

/// Classify a serenity error for the reconciliation engine.
#[track_caller]
pub fn platform_error(err: serenity::Error) -> PlatformError {
    let kind = match &err {
        serenity::Error::Http(http) => match http.status_code().map(|s| s.as_u16()) {
            Some(403) => PlatformErrorKind::InsufficientPermissions(err.to_string()),
            Some(429) => PlatformErrorKind::RateLimited(err.to_string()),
            _ => PlatformErrorKind::Api(err.to_string()),
        },
        serenity::Error::Gateway(_) => PlatformErrorKind::ConnectionFailed(err.to_string()),
        _ => PlatformErrorKind::Api(err.to_string()),
    };
    PlatformError::new(kind)
}
