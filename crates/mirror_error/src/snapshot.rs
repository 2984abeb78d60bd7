//! Snapshot document error types.

/// Ways a snapshot document can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SnapshotErrorKind {
    /// Payload is not well-formed JSON, or a field has the wrong shape
    #[display("Malformed snapshot document: {}", _0)]
    Malformed(String),
    /// A required top-level key is absent
    #[display("Snapshot document is missing required key '{}'", _0)]
    MissingKey(String),
    /// The snapshot could not be encoded
    #[display("Failed to encode snapshot: {}", _0)]
    Encode(String),
}

/// Snapshot error with location tracking.
///
/// This is the `MalformedDocument` failure of the reconciliation pipeline:
/// nothing is planned or applied once it is raised.
///
/// # Examples
///
/// ```
/// use mirror_error::{SnapshotError, SnapshotErrorKind};
///
/// let err = SnapshotError::new(SnapshotErrorKind::MissingKey("channels".to_string()));
/// assert!(format!("{}", err).contains("channels"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Snapshot Error: {} at line {} in {}", kind, line, file)]
pub struct SnapshotError {
    /// The kind of error that occurred
    pub kind: SnapshotErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SnapshotError {
    /// Create a new snapshot error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SnapshotErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the document was rejected for a missing top-level key.
    pub fn is_missing_key(&self) -> bool {
        matches!(self.kind, SnapshotErrorKind::MissingKey(_))
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for SnapshotError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::new(SnapshotErrorKind::Malformed(err.to_string()))
    }
}
