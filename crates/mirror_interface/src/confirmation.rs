//! Human confirmation between preview and apply.

use async_trait::async_trait;

/// How a confirmation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfirmationOutcome {
    /// The requesting actor accepted
    #[display("confirmed")]
    Confirmed,
    /// The requesting actor cancelled
    #[display("rejected")]
    Rejected,
    /// No decision arrived in time; treated as a cancellation
    #[display("timed out")]
    TimedOut,
}

/// Presents a preview and waits for the requesting actor's decision.
///
/// Implementations are bound to one actor; decisions from anyone else are
/// ignored. Callers bound the wait with their own timeout, so an
/// implementation may simply wait until a decision arrives.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    /// Show `preview` and wait for accept/cancel.
    async fn confirm(&self, preview: &str) -> ConfirmationOutcome;
}

/// Gate that answers immediately with a fixed outcome.
///
/// Backs non-interactive runs (`--yes`).
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmation(pub ConfirmationOutcome);

#[async_trait]
impl ConfirmationGate for FixedConfirmation {
    async fn confirm(&self, preview: &str) -> ConfirmationOutcome {
        tracing::debug!(outcome = %self.0, preview_len = preview.len(), "Fixed confirmation");
        self.0
    }
}
