//! Confirmation-gated reconciliation pipeline.

use crate::{ApplyResults, ChangePlan, Preview, ReconcileOptions, apply, plan};
use mirror_core::{GuildState, Snapshot};
use mirror_error::PlatformResult;
use mirror_interface::{ConfirmationGate, ConfirmationOutcome, GuildPlatform};
use tracing::{info, instrument, warn};

/// How a reconciliation run ended.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Outcome {
    /// The target already matched; nothing was asked or applied
    #[display("no changes")]
    NoChanges,
    /// The actor rejected the preview
    #[display("cancelled")]
    Cancelled,
    /// No decision arrived in time
    #[display("timed out")]
    TimedOut,
    /// The plan was applied
    #[display("applied")]
    Applied(ApplyResults),
}

/// Plans, previews, confirms and applies a snapshot against a guild.
///
/// No mutating call is issued before the gate confirms.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    /// Reconciler with the given options.
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Plan against an already-read target.
    pub fn plan(&self, snapshot: &Snapshot, target: &GuildState) -> ChangePlan {
        plan(snapshot, target, &self.options)
    }

    /// Preview text for a plan.
    pub fn preview(&self, plan: &ChangePlan) -> String {
        Preview::render(plan, *self.options.preview_limit())
    }

    /// Run the whole pipeline.
    ///
    /// Fails only when the target cannot be read for planning; per-operation
    /// failures during apply land in [`ApplyResults::errors`].
    #[instrument(skip_all, fields(guild_id = platform.guild_id()))]
    pub async fn run<P, G>(
        &self,
        snapshot: &Snapshot,
        platform: &P,
        gate: &G,
    ) -> PlatformResult<Outcome>
    where
        P: GuildPlatform + ?Sized,
        G: ConfirmationGate + ?Sized,
    {
        let target = platform.fetch_state().await?;
        let plan = self.plan(snapshot, &target);
        if plan.is_empty() {
            info!("Target already matches snapshot");
            return Ok(Outcome::NoChanges);
        }

        let preview = self.preview(&plan);
        let timeout = self.options.confirmation_timeout();
        let decision = match tokio::time::timeout(timeout, gate.confirm(&preview)).await {
            Ok(decision) => decision,
            Err(_) => ConfirmationOutcome::TimedOut,
        };

        match decision {
            ConfirmationOutcome::Confirmed => {
                info!(operations = plan.len(), "Applying confirmed plan");
                let results = apply(&plan, &target, platform).await;
                Ok(Outcome::Applied(results))
            }
            ConfirmationOutcome::Rejected => {
                info!("Reconciliation cancelled");
                Ok(Outcome::Cancelled)
            }
            ConfirmationOutcome::TimedOut => {
                warn!(timeout_secs = timeout.as_secs(), "No confirmation received");
                Ok(Outcome::TimedOut)
            }
        }
    }
}
